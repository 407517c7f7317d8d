//! Persistence module split across logical submodules.

mod abbreviations;
mod codes;
mod connection;
mod error;
mod medications;
mod problems;
mod search;
mod seed;
mod templates;

pub use abbreviations::{
    create_abbreviation, delete_abbreviation, fetch_abbreviations, update_abbreviation,
};
pub use codes::search_disease_codes;
pub use connection::{database_path, ensure_schema, export_dir};
pub use error::StoreError;
pub use medications::{create_medication, delete_medication, search_medications};
pub use problems::{create_problem, delete_problem, fetch_problems, update_problem};
pub use search::{
    SearchHits, SearchReply, SearchRequest, SearchScope, SearchWorker, SEARCH_LIMIT,
};
pub use seed::seed_reference_data;
pub use templates::{create_template, delete_template, fetch_templates, update_template};

#[cfg(test)]
pub use connection::open_memory_database;
