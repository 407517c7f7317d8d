use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::error::{map_duplicate, StoreError};
use crate::models::Abbreviation;

/// Retrieve every abbreviation sorted by its short form. The query doubles as
/// the single source of truth for how the list screen orders entries.
pub fn fetch_abbreviations(conn: &Connection) -> Result<Vec<Abbreviation>> {
    let mut stmt = conn
        .prepare("SELECT id, short, expansion FROM abbreviations ORDER BY short")
        .context("failed to prepare abbreviation query")?;

    let abbreviations = stmt
        .query_map([], |row| {
            Ok(Abbreviation {
                id: row.get(0)?,
                short: row.get(1)?,
                expansion: row.get(2)?,
            })
        })
        .context("failed to load abbreviations")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect abbreviations")?;

    Ok(abbreviations)
}

/// Insert a new abbreviation row, returning the hydrated struct so the caller
/// can rebuild the in-memory book without re-querying.
pub fn create_abbreviation(conn: &Connection, short: &str, expansion: &str) -> Result<Abbreviation> {
    conn.execute(
        "INSERT INTO abbreviations (short, expansion) VALUES (?1, ?2)",
        params![short, expansion],
    )
    .map_err(|err| map_duplicate(err, format!("Abbreviation '{short}'")))
    .context("failed to insert abbreviation")?;

    let id = conn.last_insert_rowid();
    Ok(Abbreviation {
        id,
        short: short.to_string(),
        expansion: expansion.to_string(),
    })
}

/// Update both fields of an existing abbreviation. We surface a custom error
/// when nothing was updated so the UI can show a friendly message instead of
/// silently continuing.
pub fn update_abbreviation(conn: &Connection, id: i64, short: &str, expansion: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE abbreviations SET short = ?1, expansion = ?2 WHERE id = ?3",
            params![short, expansion, id],
        )
        .map_err(|err| map_duplicate(err, format!("Abbreviation '{short}'")))
        .context("failed to update abbreviation")?;

    if updated == 0 {
        Err(StoreError::NotFound("Abbreviation").into())
    } else {
        Ok(())
    }
}

/// Remove an abbreviation row.
pub fn delete_abbreviation(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM abbreviations WHERE id = ?1", params![id])
        .context("failed to delete abbreviation")?;

    if deleted == 0 {
        Err(StoreError::NotFound("Abbreviation").into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn created_rows_come_back_sorted_by_short_form() {
        let conn = open_memory_database().expect("schema");
        create_abbreviation(&conn, "sob", "shortness of breath").expect("insert");
        create_abbreviation(&conn, "bp", "blood pressure").expect("insert");

        let rows = fetch_abbreviations(&conn).expect("fetch");
        let shorts: Vec<&str> = rows.iter().map(|row| row.short.as_str()).collect();
        assert_eq!(shorts, ["bp", "sob"]);
        assert!(rows.iter().all(|row| row.id > 0));
    }

    #[test]
    fn duplicate_short_forms_get_a_friendly_message() {
        let conn = open_memory_database().expect("schema");
        create_abbreviation(&conn, "bp", "blood pressure").expect("insert");

        let err = create_abbreviation(&conn, "bp", "bodily pain").expect_err("duplicate");
        let surfaced = err.chain().last().map(|cause| cause.to_string());
        assert_eq!(
            surfaced.as_deref(),
            Some("Abbreviation 'bp' already exists.")
        );
    }

    #[test]
    fn updating_a_missing_row_reports_not_found() {
        let conn = open_memory_database().expect("schema");
        let err = update_abbreviation(&conn, 99, "bp", "blood pressure").expect_err("missing");
        let surfaced = err.chain().last().map(|cause| cause.to_string());
        assert_eq!(surfaced.as_deref(), Some("Abbreviation not found"));
    }

    #[test]
    fn delete_removes_the_row() {
        let conn = open_memory_database().expect("schema");
        let row = create_abbreviation(&conn, "hx", "history of").expect("insert");
        delete_abbreviation(&conn, row.id).expect("delete");
        assert!(fetch_abbreviations(&conn).expect("fetch").is_empty());
    }
}
