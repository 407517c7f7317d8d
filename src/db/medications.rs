use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::error::{map_duplicate, StoreError};
use crate::models::Medication;

/// Search the medication catalog by name substring. The catalog can grow
/// large, so the list screen always goes through this instead of loading
/// everything.
pub fn search_medications(conn: &Connection, query: &str, limit: usize) -> Result<Vec<Medication>> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn
        .prepare(
            "SELECT id, name, strength, route FROM medications
             WHERE name LIKE ?1
             ORDER BY name COLLATE NOCASE, strength
             LIMIT ?2",
        )
        .context("failed to prepare medication query")?;

    let medications = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(Medication {
                id: row.get(0)?,
                name: row.get(1)?,
                strength: row.get(2)?,
                route: row.get(3)?,
            })
        })
        .context("failed to load medications")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect medications")?;

    Ok(medications)
}

/// Add a medication to the catalog, returning the hydrated struct. Name and
/// strength together must be unique; the route alone does not distinguish
/// catalog entries.
pub fn create_medication(
    conn: &Connection,
    name: &str,
    strength: &str,
    route: &str,
) -> Result<Medication> {
    conn.execute(
        "INSERT INTO medications (name, strength, route) VALUES (?1, ?2, ?3)",
        params![name, strength, route],
    )
    .map_err(|err| map_duplicate(err, format!("Medication '{name} {strength}'")))
    .context("failed to insert medication")?;

    let id = conn.last_insert_rowid();
    Ok(Medication {
        id,
        name: name.to_string(),
        strength: strength.to_string(),
        route: route.to_string(),
    })
}

/// Remove a catalog entry.
pub fn delete_medication(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM medications WHERE id = ?1", params![id])
        .context("failed to delete medication")?;

    if deleted == 0 {
        Err(StoreError::NotFound("Medication").into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn search_matches_name_substrings() {
        let conn = open_memory_database().expect("schema");
        create_medication(&conn, "Amlodipine", "5 mg", "PO").expect("insert");
        create_medication(&conn, "Amlodipine", "10 mg", "PO").expect("insert");
        create_medication(&conn, "Metformin", "500 mg", "PO").expect("insert");

        let hits = search_medications(&conn, "amlo", 50).expect("search");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|m| m.name == "Amlodipine"));
    }

    #[test]
    fn same_name_and_strength_is_rejected() {
        let conn = open_memory_database().expect("schema");
        create_medication(&conn, "Amlodipine", "5 mg", "PO").expect("insert");

        let err = create_medication(&conn, "Amlodipine", "5 mg", "PO").expect_err("duplicate");
        let surfaced = err.chain().last().map(|cause| cause.to_string());
        assert_eq!(
            surfaced.as_deref(),
            Some("Medication 'Amlodipine 5 mg' already exists.")
        );
    }

    #[test]
    fn same_name_with_a_new_strength_is_allowed() {
        let conn = open_memory_database().expect("schema");
        create_medication(&conn, "Metformin", "500 mg", "PO").expect("insert");
        create_medication(&conn, "Metformin", "850 mg", "PO").expect("second strength");

        let hits = search_medications(&conn, "metformin", 50).expect("search");
        assert_eq!(hits.len(), 2);
    }
}
