//! Allergy entry. A single line for Past Medical History rather than a dated
//! block; allergies describe the patient, not the visit.

use super::{field, FieldKind, FieldSpec};

const SEVERITIES: &[&str] = &["mild", "moderate", "severe"];

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Substance",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        label: "Reaction",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        label: "Severity",
        kind: FieldKind::Choice(SEVERITIES),
        required: true,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    let substance = field(values, 0).trim();
    if substance.is_empty() {
        return Err("Substance is required".to_string());
    }

    let reaction = field(values, 1).trim();
    if reaction.is_empty() {
        return Err("Reaction is required".to_string());
    }

    let severity = field(values, 2).trim();
    if severity.is_empty() {
        return Err("Pick a severity".to_string());
    }

    Ok(format!("Allergy: {substance} - {reaction} ({severity})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_single_history_line() {
        let values: Vec<String> = vec!["penicillin".into(), "rash".into(), "moderate".into()];
        assert_eq!(
            build(&values).expect("valid"),
            "Allergy: penicillin - rash (moderate)"
        );
    }

    #[test]
    fn substance_and_reaction_are_both_required() {
        let values: Vec<String> = vec!["".into(), "rash".into(), "mild".into()];
        assert_eq!(build(&values).expect_err("blank"), "Substance is required");

        let values: Vec<String> = vec!["penicillin".into(), " ".into(), "mild".into()];
        assert_eq!(build(&values).expect_err("blank"), "Reaction is required");
    }
}
