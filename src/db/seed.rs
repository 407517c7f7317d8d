//! Starter reference data. A fresh install gets a usable disease-code
//! catalog, a handful of common abbreviations, and a small medication
//! formulary. Each set only loads into an empty table, so rows the user has
//! edited or deleted stay exactly as the user left them.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// Common KCD diagnosis codes for a primary-care clinic. Far from the full
/// catalog; enough that code search is useful on day one.
const DISEASE_CODES: &[(&str, &str)] = &[
    ("A09.9", "Gastroenteritis and colitis of unspecified origin"),
    ("B34.9", "Viral infection, unspecified"),
    ("E03.9", "Hypothyroidism, unspecified"),
    ("E05.9", "Thyrotoxicosis, unspecified"),
    ("E11.9", "Type 2 diabetes mellitus without complications"),
    ("E66.9", "Obesity, unspecified"),
    ("E78.5", "Hyperlipidaemia, unspecified"),
    ("F32.9", "Depressive episode, unspecified"),
    ("F41.9", "Anxiety disorder, unspecified"),
    ("G47.0", "Disorders of initiating and maintaining sleep"),
    ("H10.9", "Conjunctivitis, unspecified"),
    ("H66.9", "Otitis media, unspecified"),
    ("I10", "Essential (primary) hypertension"),
    ("I48.9", "Atrial fibrillation and atrial flutter, unspecified"),
    ("J00", "Acute nasopharyngitis [common cold]"),
    ("J02.9", "Acute pharyngitis, unspecified"),
    ("J20.9", "Acute bronchitis, unspecified"),
    ("J30.4", "Allergic rhinitis, unspecified"),
    ("J45.9", "Asthma, unspecified"),
    ("K21.9", "Gastro-oesophageal reflux disease without oesophagitis"),
    ("K29.7", "Gastritis, unspecified"),
    ("K59.0", "Constipation"),
    ("L23.9", "Allergic contact dermatitis, unspecified cause"),
    ("M17.9", "Gonarthrosis, unspecified"),
    ("M54.5", "Low back pain"),
    ("M79.1", "Myalgia"),
    ("M81.9", "Osteoporosis, unspecified"),
    ("N39.0", "Urinary tract infection, site not specified"),
    ("R05", "Cough"),
    ("R10.4", "Other and unspecified abdominal pain"),
    ("R42", "Dizziness and giddiness"),
    ("R50.9", "Fever, unspecified"),
    ("R51", "Headache"),
    ("Z23", "Need for immunization against single bacterial diseases"),
];

/// Expansion pairs every chart note seems to want. Users add their own on
/// the abbreviation screen; these just prime the pump.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("bid", "twice a day"),
    ("bp", "blood pressure"),
    ("cp", "chest pain"),
    ("dm", "diabetes mellitus"),
    ("fu", "follow up"),
    ("ha", "headache"),
    ("htn", "hypertension"),
    ("hx", "history of"),
    ("nkda", "no known drug allergies"),
    ("prn", "as needed"),
    ("qd", "once daily"),
    ("sob", "shortness of breath"),
    ("tid", "three times a day"),
    ("uri", "upper respiratory infection"),
    ("wnl", "within normal limits"),
];

/// A starter formulary of (name, strength, route).
const MEDICATIONS: &[(&str, &str, &str)] = &[
    ("Acetaminophen", "500 mg", "PO"),
    ("Amlodipine", "5 mg", "PO"),
    ("Amlodipine", "10 mg", "PO"),
    ("Amoxicillin", "500 mg", "PO"),
    ("Atorvastatin", "20 mg", "PO"),
    ("Ibuprofen", "200 mg", "PO"),
    ("Influenza vaccine", "0.5 mL", "IM"),
    ("Levothyroxine", "50 mcg", "PO"),
    ("Losartan", "50 mg", "PO"),
    ("Metformin", "500 mg", "PO"),
    ("Metformin", "850 mg", "PO"),
    ("Omeprazole", "20 mg", "PO"),
];

/// Load the reference catalogs into a freshly ensured schema. Safe to call on
/// every startup; tables the user has touched are left alone.
pub fn seed_reference_data(conn: &Connection) -> Result<()> {
    if table_is_empty(conn, "disease_codes")? {
        let mut codes = conn
            .prepare("INSERT INTO disease_codes (code, label) VALUES (?1, ?2)")
            .context("failed to prepare disease code seed")?;
        for (code, label) in DISEASE_CODES {
            codes
                .execute(params![code, label])
                .context("failed to seed disease code")?;
        }
    }

    if table_is_empty(conn, "abbreviations")? {
        let mut abbreviations = conn
            .prepare("INSERT INTO abbreviations (short, expansion) VALUES (?1, ?2)")
            .context("failed to prepare abbreviation seed")?;
        for (short, expansion) in ABBREVIATIONS {
            abbreviations
                .execute(params![short, expansion])
                .context("failed to seed abbreviation")?;
        }
    }

    if table_is_empty(conn, "medications")? {
        let mut medications = conn
            .prepare("INSERT INTO medications (name, strength, route) VALUES (?1, ?2, ?3)")
            .context("failed to prepare medication seed")?;
        for (name, strength, route) in MEDICATIONS {
            medications
                .execute(params![name, strength, route])
                .context("failed to seed medication")?;
        }
    }

    Ok(())
}

fn table_is_empty(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("failed to count rows in {table}"))?;
    Ok(count == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fetch_abbreviations, open_memory_database, search_disease_codes};

    #[test]
    fn seeding_twice_changes_nothing() {
        let conn = open_memory_database().expect("schema");
        seed_reference_data(&conn).expect("first seed");
        let first = fetch_abbreviations(&conn).expect("fetch").len();

        seed_reference_data(&conn).expect("second seed");
        assert_eq!(fetch_abbreviations(&conn).expect("fetch").len(), first);
    }

    #[test]
    fn seeding_respects_user_edits() {
        let conn = open_memory_database().expect("schema");
        seed_reference_data(&conn).expect("seed");
        conn.execute(
            "UPDATE abbreviations SET expansion = 'blood pressure check' WHERE short = 'bp'",
            [],
        )
        .expect("edit");

        seed_reference_data(&conn).expect("reseed");
        let rows = fetch_abbreviations(&conn).expect("fetch");
        let bp = rows.iter().find(|row| row.short == "bp").expect("bp row");
        assert_eq!(bp.expansion, "blood pressure check");
    }

    #[test]
    fn deleted_rows_do_not_come_back() {
        let conn = open_memory_database().expect("schema");
        seed_reference_data(&conn).expect("seed");
        conn.execute("DELETE FROM abbreviations WHERE short = 'bp'", [])
            .expect("delete");

        seed_reference_data(&conn).expect("reseed");
        let rows = fetch_abbreviations(&conn).expect("fetch");
        assert!(rows.iter().all(|row| row.short != "bp"));
    }

    #[test]
    fn code_search_works_against_the_seeded_catalog() {
        let conn = open_memory_database().expect("schema");
        seed_reference_data(&conn).expect("seed");

        let hits = search_disease_codes(&conn, "hypertension", 50).expect("search");
        assert!(hits.iter().any(|hit| hit.code == "I10"));
    }
}
