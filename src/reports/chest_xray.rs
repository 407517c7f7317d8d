//! Chest X-ray report. The impression line is the one that matters
//! clinically, so it is the one mandatory text field.

use chrono::NaiveDate;

use super::{field, parse_date, FieldKind, FieldSpec};

const VIEWS: &[&str] = &["PA", "AP", "PA and lateral"];

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        label: "View",
        kind: FieldKind::Choice(VIEWS),
        required: true,
    },
    FieldSpec {
        label: "Findings",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "Impression",
        kind: FieldKind::Text,
        required: true,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    ChestXrayReport::parse(values).map(|report| report.render())
}

struct ChestXrayReport {
    date: NaiveDate,
    view: String,
    findings: String,
    impression: String,
}

impl ChestXrayReport {
    fn parse(values: &[String]) -> Result<Self, String> {
        let date = parse_date(field(values, 0))?;

        let view = field(values, 1).trim();
        if view.is_empty() {
            return Err("Pick a view".to_string());
        }

        let impression = field(values, 3).trim();
        if impression.is_empty() {
            return Err("Impression is required".to_string());
        }

        Ok(Self {
            date,
            view: view.to_string(),
            findings: field(values, 2).trim().to_string(),
            impression: impression.to_string(),
        })
    }

    fn render(&self) -> String {
        let mut lines = vec![
            format!("[Chest X-ray {}]", self.date.format("%Y-%m-%d")),
            format!("View: {}", self.view),
        ];
        if !self.findings.is_empty() {
            lines.push(format!("Findings: {}", self.findings));
        }
        lines.push(format!("Impression: {}", self.impression));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(date: &str, view: &str, findings: &str, impression: &str) -> Vec<String> {
        vec![date.into(), view.into(), findings.into(), impression.into()]
    }

    #[test]
    fn impression_always_closes_the_block() {
        let block = build(&values(
            "2026-08-25",
            "PA",
            "clear lung fields",
            "no active lung lesion",
        ))
        .expect("valid");
        assert_eq!(
            block,
            "[Chest X-ray 2026-08-25]\nView: PA\nFindings: clear lung fields\nImpression: no active lung lesion"
        );

        let block = build(&values("2026-08-25", "AP", "", "cardiomegaly")).expect("valid");
        assert_eq!(
            block,
            "[Chest X-ray 2026-08-25]\nView: AP\nImpression: cardiomegaly"
        );
    }

    #[test]
    fn impression_cannot_be_blank() {
        let err = build(&values("2026-08-25", "PA", "clear", "")).expect_err("blank");
        assert_eq!(err, "Impression is required");
    }
}
