use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Directory created under the user's home for everything the app stores.
const DATA_DIR_NAME: &str = ".clinic-note-manager";
/// Database file inside the data directory.
const DB_FILE_NAME: &str = "clinic.sqlite";
/// Folder inside the data directory where exported notes are written.
const EXPORT_DIR_NAME: &str = "exports";

/// Open the database, creating the file and its parent directory on first
/// run, and bring the schema up to date. Every table uses `IF NOT EXISTS`,
/// so an existing file from a previous run comes through unchanged.
pub fn ensure_schema() -> Result<Connection> {
    let db_path = database_path()?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
    apply_schema(&conn)?;
    Ok(conn)
}

/// Absolute path of the SQLite file under the user's home. Public because
/// the search worker opens its own connection to the same file on its own
/// thread.
pub fn database_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// Directory that exported notes are written into, created on demand.
pub fn export_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    let dir = base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(EXPORT_DIR_NAME);
    fs::create_dir_all(&dir).context("failed to create export directory")?;
    Ok(dir)
}

pub(super) fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS abbreviations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            short TEXT NOT NULL UNIQUE,
            expansion TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create abbreviations table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS problems (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT,
            label TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create problems table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS disease_codes (
            code TEXT PRIMARY KEY,
            label TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create disease codes table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS medications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            strength TEXT NOT NULL,
            route TEXT NOT NULL,
            UNIQUE (name, strength)
        )",
        [],
    )
    .context("failed to create medications table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS templates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create templates table")?;

    Ok(())
}

/// In-memory database with the full schema applied. Tests use this to run
/// the real queries without touching the user's data file.
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    apply_schema(&conn)?;
    Ok(conn)
}
