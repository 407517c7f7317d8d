use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use super::error::{map_duplicate, StoreError};
use crate::models::Template;

/// Fetch all saved templates, ordered case-insensitively so mixed-case names
/// group together in the picker.
pub fn fetch_templates(conn: &Connection) -> Result<Vec<Template>> {
    let mut stmt = conn
        .prepare("SELECT id, name, content FROM templates ORDER BY name COLLATE NOCASE")
        .context("failed to prepare template query")?;

    let templates = stmt
        .query_map([], |row| {
            Ok(Template {
                id: row.get(0)?,
                name: row.get(1)?,
                content: row.get(2)?,
            })
        })
        .context("failed to load templates")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect templates")?;

    Ok(templates)
}

/// Insert a brand new template. We echo the hydrated struct so callers can
/// update UI state without having to re-query the database.
pub fn create_template(conn: &Connection, name: &str, content: &str) -> Result<Template> {
    conn.execute(
        "INSERT INTO templates (name, content) VALUES (?1, ?2)",
        params![name, content],
    )
    .map_err(|err| map_duplicate(err, format!("Template '{name}'")))
    .context("failed to insert template")?;

    let id = conn.last_insert_rowid();
    Ok(Template {
        id,
        name: name.to_string(),
        content: content.to_string(),
    })
}

/// Replace a template's content under the same name. Saving over an existing
/// name is how the note-as-template flow refreshes a stale template.
pub fn update_template(conn: &Connection, id: i64, name: &str, content: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE templates SET name = ?1, content = ?2 WHERE id = ?3",
            params![name, content, id],
        )
        .map_err(|err| map_duplicate(err, format!("Template '{name}'")))
        .context("failed to update template")?;

    if updated == 0 {
        Err(StoreError::NotFound("Template").into())
    } else {
        Ok(())
    }
}

/// Remove a template row.
pub fn delete_template(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM templates WHERE id = ?1", params![id])
        .context("failed to delete template")?;

    if deleted == 0 {
        Err(StoreError::NotFound("Template").into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn templates_are_ordered_by_name_ignoring_case() {
        let conn = open_memory_database().expect("schema");
        create_template(&conn, "URI visit", "CC>\ncough").expect("insert");
        create_template(&conn, "annual exam", "PE>\nunremarkable").expect("insert");

        let names: Vec<String> = fetch_templates(&conn)
            .expect("fetch")
            .into_iter()
            .map(|template| template.name)
            .collect();
        assert_eq!(names, ["annual exam", "URI visit"]);
    }

    #[test]
    fn duplicate_names_get_a_friendly_message() {
        let conn = open_memory_database().expect("schema");
        create_template(&conn, "URI visit", "CC>\ncough").expect("insert");

        let err = create_template(&conn, "URI visit", "CC>\nfever").expect_err("duplicate");
        let surfaced = err.chain().last().map(|cause| cause.to_string());
        assert_eq!(
            surfaced.as_deref(),
            Some("Template 'URI visit' already exists.")
        );
    }

    #[test]
    fn update_replaces_content_in_place() {
        let conn = open_memory_database().expect("schema");
        let row = create_template(&conn, "URI visit", "CC>\ncough").expect("insert");
        update_template(&conn, row.id, "URI visit", "CC>\ncough and fever").expect("update");

        let templates = fetch_templates(&conn).expect("fetch");
        assert_eq!(templates[0].content, "CC>\ncough and fever");
    }
}
