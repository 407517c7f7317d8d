use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::DiseaseCode;

/// Search the disease-code catalog by code prefix or label substring. The
/// catalog is seeded reference data and never edited from the UI, so this
/// module only reads.
pub fn search_disease_codes(conn: &Connection, query: &str, limit: usize) -> Result<Vec<DiseaseCode>> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn
        .prepare(
            "SELECT code, label FROM disease_codes
             WHERE code LIKE ?1 OR label LIKE ?1
             ORDER BY code
             LIMIT ?2",
        )
        .context("failed to prepare disease code query")?;

    let codes = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(DiseaseCode {
                code: row.get(0)?,
                label: row.get(1)?,
            })
        })
        .context("failed to load disease codes")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect disease codes")?;

    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn seed(conn: &Connection) {
        for (code, label) in [
            ("E11.9", "Type 2 diabetes mellitus without complications"),
            ("I10", "Essential (primary) hypertension"),
            ("J00", "Acute nasopharyngitis [common cold]"),
        ] {
            conn.execute(
                "INSERT INTO disease_codes (code, label) VALUES (?1, ?2)",
                params![code, label],
            )
            .expect("seed row");
        }
    }

    #[test]
    fn matches_on_code_or_label() {
        let conn = open_memory_database().expect("schema");
        seed(&conn);

        let by_code = search_disease_codes(&conn, "I10", 50).expect("search");
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].label, "Essential (primary) hypertension");

        let by_label = search_disease_codes(&conn, "diabetes", 50).expect("search");
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].code, "E11.9");
    }

    #[test]
    fn empty_query_browses_the_catalog_in_code_order() {
        let conn = open_memory_database().expect("schema");
        seed(&conn);

        let all = search_disease_codes(&conn, "", 50).expect("search");
        let codes: Vec<&str> = all.iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, ["E11.9", "I10", "J00"]);
    }

    #[test]
    fn limit_caps_the_result_set() {
        let conn = open_memory_database().expect("schema");
        seed(&conn);

        let capped = search_disease_codes(&conn, "", 2).expect("search");
        assert_eq!(capped.len(), 2);
    }
}
