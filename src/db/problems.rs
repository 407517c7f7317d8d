use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::error::StoreError;
use crate::models::Problem;

/// Retrieve the whole problem list, ordered case-insensitively by label.
pub fn fetch_problems(conn: &Connection) -> Result<Vec<Problem>> {
    let mut stmt = conn
        .prepare("SELECT id, code, label FROM problems ORDER BY label COLLATE NOCASE")
        .context("failed to prepare problem query")?;

    let problems = stmt
        .query_map([], |row| {
            Ok(Problem {
                id: row.get(0)?,
                code: row.get(1)?,
                label: row.get(2)?,
            })
        })
        .context("failed to load problems")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect problems")?;

    Ok(problems)
}

/// Insert a problem row. The code is stored as given at insert time, whether
/// it came from the disease-code search or was typed freehand, so later
/// catalog changes do not rewrite an existing problem list.
pub fn create_problem(conn: &Connection, code: Option<&str>, label: &str) -> Result<Problem> {
    conn.execute(
        "INSERT INTO problems (code, label) VALUES (?1, ?2)",
        params![code, label],
    )
    .context("failed to insert problem")?;

    let id = conn.last_insert_rowid();
    Ok(Problem {
        id,
        code: code.map(str::to_string),
        label: label.to_string(),
    })
}

/// Update the label and code for an existing problem.
pub fn update_problem(conn: &Connection, id: i64, code: Option<&str>, label: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE problems SET code = ?1, label = ?2 WHERE id = ?3",
            params![code, label, id],
        )
        .context("failed to update problem")?;

    if updated == 0 {
        Err(StoreError::NotFound("Problem").into())
    } else {
        Ok(())
    }
}

/// Remove a problem row.
pub fn delete_problem(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM problems WHERE id = ?1", params![id])
        .context("failed to delete problem")?;

    if deleted == 0 {
        Err(StoreError::NotFound("Problem").into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn problems_keep_their_optional_codes() {
        let conn = open_memory_database().expect("schema");
        create_problem(&conn, Some("I10"), "hypertension").expect("insert");
        create_problem(&conn, None, "chronic fatigue").expect("insert");

        let problems = fetch_problems(&conn).expect("fetch");
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].label, "chronic fatigue");
        assert_eq!(problems[0].code, None);
        assert_eq!(problems[1].code.as_deref(), Some("I10"));
    }

    #[test]
    fn update_can_attach_a_code_later() {
        let conn = open_memory_database().expect("schema");
        let row = create_problem(&conn, None, "diabetes").expect("insert");
        update_problem(&conn, row.id, Some("E11.9"), "type 2 diabetes").expect("update");

        let problems = fetch_problems(&conn).expect("fetch");
        assert_eq!(problems[0].code.as_deref(), Some("E11.9"));
        assert_eq!(problems[0].label, "type 2 diabetes");
    }

    #[test]
    fn deleting_a_missing_problem_reports_not_found() {
        let conn = open_memory_database().expect("schema");
        let err = delete_problem(&conn, 42).expect_err("missing");
        let surfaced = err.chain().last().map(|cause| cause.to_string());
        assert_eq!(surfaced.as_deref(), Some("Problem not found"));
    }
}
