//! Ratatui front-end. The `app` module owns the screen/mode state machine,
//! `editor` the per-section text editing, and the rest are the supporting
//! forms, list states, and terminal plumbing.

mod app;
mod editor;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
