//! Library surface of the clinic note manager.
//!
//! `main.rs` stays a thin wrapper around these exports, and integration
//! tests can drive the same code paths without a terminal attached.
pub mod db;
pub mod models;
pub mod note;
pub mod reports;
pub mod ui;

/// Startup pieces: open and migrate the database, seed the catalogs, spawn
/// the search worker.
pub use db::{database_path, ensure_schema, fetch_abbreviations, seed_reference_data, SearchWorker};

/// Catalog row types shared by every layer.
pub use models::{Abbreviation, DiseaseCode, Medication, Problem, Template};

/// The event loop and the state struct it drives.
pub use ui::{run_app, App};
