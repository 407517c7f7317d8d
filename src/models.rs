//! Reference-data models that mirror the SQLite schema and get passed
//! throughout the TUI. The intent is that these types stay light-weight data
//! holders so other layers can focus on presentation and persistence logic.
//! The note document itself (sections, carets, merge state) lives in the
//! `note` module; everything here is a catalog row.

use std::fmt;

#[derive(Debug, Clone)]
/// A short-form/expansion pair used by the inline expander. `short` is what
/// the clinician types after the sigil, `expansion` is what lands in the note.
pub struct Abbreviation {
    /// Primary key from the database. Edit/delete flows bubble the id back to
    /// the persistence layer even though lookups go through the short form.
    pub id: i64,
    /// The lookup key, stored without the sigil. Unique in the table.
    pub short: String,
    /// Replacement text inserted into the note.
    pub expansion: String,
}

impl Abbreviation {
    /// `short → expansion` line used by the management list. The arrow keeps
    /// the pair readable even when expansions contain spaces.
    pub fn display_line(&self) -> String {
        format!("{} → {}", self.short, self.expansion)
    }
}

#[derive(Debug, Clone)]
/// One entry on the patient's problem list. The KCD code is optional because
/// problems are often captured as free text first and coded later.
pub struct Problem {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// Optional KCD-9 classification code (e.g. `I10`).
    pub code: Option<String>,
    /// Clinician-facing problem wording shown in lists and pushed into the
    /// Assessment section.
    pub label: String,
}

impl Problem {
    /// Compose the `# label (code)` line that gets appended to Assessment,
    /// gracefully omitting the parenthetical when no code is attached.
    pub fn assessment_line(&self) -> String {
        match &self.code {
            Some(code) if !code.trim().is_empty() => {
                format!("# {} ({})", self.label, code.trim())
            }
            _ => format!("# {}", self.label),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[derive(Debug, Clone)]
/// A row from the KCD-9 reference table used by the code picker. The table is
/// read-only at runtime apart from first-run seeding.
pub struct DiseaseCode {
    /// Classification code; primary key of the reference table.
    pub code: String,
    /// Human-readable disease label.
    pub label: String,
}

impl DiseaseCode {
    /// `CODE  label` line for picker lists, padded so codes align.
    pub fn display_line(&self) -> String {
        format!("{:<8} {}", self.code, self.label)
    }
}

#[derive(Debug, Clone)]
/// One drug in the local medication catalog. Strength and route are kept as
/// raw text so the catalog can hold combination products and odd dose forms
/// without a unit model.
pub struct Medication {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// Generic or brand name shown in lists.
    pub name: String,
    /// Dose strength as entered (e.g. `500 mg`). May be blank.
    pub strength: String,
    /// Administration route (e.g. `PO`). May be blank.
    pub route: String,
}

impl Medication {
    /// Compose a `Name Strength (Route)` string that gracefully omits blank
    /// parts. Pickers and the sig builder rely on this ready-to-use form.
    pub fn display_name(&self) -> String {
        let mut out = self.name.clone();
        if !self.strength.trim().is_empty() {
            out.push(' ');
            out.push_str(self.strength.trim());
        }
        if !self.route.trim().is_empty() {
            out.push_str(&format!(" ({})", self.route.trim()));
        }
        out
    }
}

#[derive(Debug, Clone)]
/// A saved multi-section note template. `content` is the serialized chart
/// blob produced by `NoteChart::render_blob` and parsed back by the merge
/// engine, so a template survives a save/load round trip untouched.
pub struct Template {
    /// Primary key from the SQLite store.
    pub id: i64,
    /// Unique display name chosen when the chart was saved.
    pub name: String,
    /// Multi-section body in the `HEADER\nbody` blob format.
    pub content: String,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_line_includes_code_when_present() {
        let problem = Problem {
            id: 1,
            code: Some("I10".to_string()),
            label: "Essential hypertension".to_string(),
        };
        assert_eq!(problem.assessment_line(), "# Essential hypertension (I10)");
    }

    #[test]
    fn assessment_line_omits_blank_code() {
        let coded_blank = Problem {
            id: 1,
            code: Some("  ".to_string()),
            label: "Fatigue".to_string(),
        };
        let uncoded = Problem {
            id: 2,
            code: None,
            label: "Fatigue".to_string(),
        };
        assert_eq!(coded_blank.assessment_line(), "# Fatigue");
        assert_eq!(uncoded.assessment_line(), "# Fatigue");
    }

    #[test]
    fn medication_display_name_skips_blank_parts() {
        let med = Medication {
            id: 1,
            name: "Amoxicillin".to_string(),
            strength: "500 mg".to_string(),
            route: "PO".to_string(),
        };
        assert_eq!(med.display_name(), "Amoxicillin 500 mg (PO)");

        let bare = Medication {
            id: 2,
            name: "Normal saline".to_string(),
            strength: String::new(),
            route: String::new(),
        };
        assert_eq!(bare.display_name(), "Normal saline");
    }
}
