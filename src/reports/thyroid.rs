//! Thyroid sonogram report. Mostly free-text findings; only the lines that
//! were actually filled in make it into the note.

use chrono::NaiveDate;

use super::{field, parse_date, FieldKind, FieldSpec};

const ECHOTEXTURES: &[&str] = &["homogeneous", "heterogeneous", "coarse"];

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        label: "Right lobe (cm)",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "Left lobe (cm)",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "Echotexture",
        kind: FieldKind::Choice(ECHOTEXTURES),
        required: true,
    },
    FieldSpec {
        label: "Nodules",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "Impression",
        kind: FieldKind::Text,
        required: false,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    ThyroidReport::parse(values).map(|report| report.render())
}

struct ThyroidReport {
    date: NaiveDate,
    right_lobe: String,
    left_lobe: String,
    echotexture: String,
    nodules: String,
    impression: String,
}

impl ThyroidReport {
    fn parse(values: &[String]) -> Result<Self, String> {
        let echotexture = field(values, 3).trim();
        if echotexture.is_empty() {
            return Err("Pick an echotexture".to_string());
        }

        Ok(Self {
            date: parse_date(field(values, 0))?,
            right_lobe: field(values, 1).trim().to_string(),
            left_lobe: field(values, 2).trim().to_string(),
            echotexture: echotexture.to_string(),
            nodules: field(values, 4).trim().to_string(),
            impression: field(values, 5).trim().to_string(),
        })
    }

    fn render(&self) -> String {
        let mut lines = vec![format!("[Thyroid sonogram {}]", self.date.format("%Y-%m-%d"))];
        for (label, value) in [
            ("Right lobe", &self.right_lobe),
            ("Left lobe", &self.left_lobe),
            ("Echotexture", &self.echotexture),
            ("Nodules", &self.nodules),
            ("Impression", &self.impression),
        ] {
            if !value.is_empty() {
                lines.push(format!("{label}: {value}"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_stay_out_of_the_note() {
        let values: Vec<String> = vec![
            "2026-08-25".into(),
            "".into(),
            "".into(),
            "homogeneous".into(),
            "".into(),
            "normal study".into(),
        ];
        let block = build(&values).expect("valid");
        assert_eq!(
            block,
            "[Thyroid sonogram 2026-08-25]\nEchotexture: homogeneous\nImpression: normal study"
        );
    }

    #[test]
    fn filled_lines_keep_their_order() {
        let values: Vec<String> = vec![
            "2026-08-25".into(),
            "4.2 x 1.5 x 1.4".into(),
            "4.0 x 1.4 x 1.3".into(),
            "heterogeneous".into(),
            "0.4 cm cyst, right mid pole".into(),
            "benign-appearing cyst".into(),
        ];
        let block = build(&values).expect("valid");
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("Right lobe:"));
        assert!(lines[4].starts_with("Nodules:"));
    }

    #[test]
    fn echotexture_is_mandatory() {
        let values: Vec<String> = vec!["2026-08-25".into(), "".into(), "".into(), "".into()];
        assert_eq!(build(&values).expect_err("missing"), "Pick an echotexture");
    }
}
