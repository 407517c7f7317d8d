//! Vaccination record. Lands in the Plan section so the administered dose is
//! part of the visit's orders.

use chrono::NaiveDate;

use super::{field, parse_date, FieldKind, FieldSpec};

const VACCINES: &[&str] = &[
    "influenza",
    "hepatitis B",
    "Tdap",
    "pneumococcal",
    "zoster",
    "COVID-19",
    "other",
];

const SITES: &[&str] = &[
    "left deltoid IM",
    "right deltoid IM",
    "left thigh IM",
    "right thigh IM",
    "oral",
];

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        label: "Vaccine",
        kind: FieldKind::Choice(VACCINES),
        required: true,
    },
    FieldSpec {
        label: "Dose",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        label: "Site",
        kind: FieldKind::Choice(SITES),
        required: true,
    },
    FieldSpec {
        label: "Lot number",
        kind: FieldKind::Text,
        required: false,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    VaccinationRecord::parse(values).map(|record| record.render())
}

struct VaccinationRecord {
    date: NaiveDate,
    vaccine: String,
    dose: String,
    site: String,
    lot: String,
}

impl VaccinationRecord {
    fn parse(values: &[String]) -> Result<Self, String> {
        let date = parse_date(field(values, 0))?;

        let vaccine = field(values, 1).trim();
        if vaccine.is_empty() {
            return Err("Pick a vaccine".to_string());
        }

        let dose = field(values, 2).trim();
        if dose.is_empty() {
            return Err("Dose is required".to_string());
        }

        let site = field(values, 3).trim();
        if site.is_empty() {
            return Err("Pick an administration site".to_string());
        }

        Ok(Self {
            date,
            vaccine: vaccine.to_string(),
            dose: dose.to_string(),
            site: site.to_string(),
            lot: field(values, 4).trim().to_string(),
        })
    }

    fn render(&self) -> String {
        let mut lines = vec![
            format!("[Vaccination {}]", self.date.format("%Y-%m-%d")),
            format!("Vaccine: {}", self.vaccine),
            format!("Dose: {}", self.dose),
            format!("Site: {}", self.site),
        ];
        if !self.lot.is_empty() {
            lines.push(format!("Lot: {}", self.lot));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(date: &str, vaccine: &str, dose: &str, site: &str, lot: &str) -> Vec<String> {
        vec![
            date.into(),
            vaccine.into(),
            dose.into(),
            site.into(),
            lot.into(),
        ]
    }

    #[test]
    fn renders_with_and_without_a_lot_number() {
        let block = build(&values(
            "2026-08-25",
            "influenza",
            "0.5 mL",
            "left deltoid IM",
            "A1234",
        ))
        .expect("valid");
        assert!(block.ends_with("Lot: A1234"));

        let block = build(&values(
            "2026-08-25",
            "influenza",
            "0.5 mL",
            "left deltoid IM",
            "",
        ))
        .expect("valid");
        assert!(block.ends_with("Site: left deltoid IM"));
    }

    #[test]
    fn dose_cannot_be_blank() {
        let err = build(&values("2026-08-25", "influenza", "  ", "oral", "")).expect_err("blank");
        assert_eq!(err, "Dose is required");
    }
}
