//! Structured report builders. Every report the application can produce is a
//! variant of [`ReportKind`]; its input fields, destination section, and
//! build function all come from explicit per-variant tables, so adding a
//! report means adding a variant and extending three `match` arms. Nothing
//! is discovered at runtime.

mod allergy;
mod chest_xray;
mod dexa;
mod ekg;
mod medication;
mod thyroid;
mod vaccination;

pub use medication::MedicationOrder;

use chrono::NaiveDate;

use crate::note::SectionId;

/// How the generic report form should edit one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, typed directly.
    Text,
    /// A date; the form pre-fills today and the builder insists on
    /// `YYYY-MM-DD`.
    Date,
    /// One of a fixed option list, cycled rather than typed.
    Choice(&'static [&'static str]),
}

/// One input line on a report form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// The closed set of report dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Ekg,
    Dexa,
    ThyroidSonogram,
    Vaccination,
    Allergy,
    ChestXray,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Ekg,
        ReportKind::Dexa,
        ReportKind::ThyroidSonogram,
        ReportKind::Vaccination,
        ReportKind::Allergy,
        ReportKind::ChestXray,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Ekg => "EKG",
            ReportKind::Dexa => "DEXA bone density",
            ReportKind::ThyroidSonogram => "Thyroid sonogram",
            ReportKind::Vaccination => "Vaccination",
            ReportKind::Allergy => "Allergy",
            ReportKind::ChestXray => "Chest X-ray",
        }
    }

    /// The section a finished report is appended to. Fixed per kind; the
    /// form never asks.
    pub fn target(self) -> SectionId {
        match self {
            ReportKind::Ekg => SectionId::Objective,
            ReportKind::Dexa => SectionId::Objective,
            ReportKind::ThyroidSonogram => SectionId::Objective,
            ReportKind::Vaccination => SectionId::Plan,
            ReportKind::Allergy => SectionId::PastMedicalHistory,
            ReportKind::ChestXray => SectionId::Objective,
        }
    }

    /// The input lines the form shows for this kind, in order. `build`
    /// receives the collected values in the same order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            ReportKind::Ekg => ekg::FIELDS,
            ReportKind::Dexa => dexa::FIELDS,
            ReportKind::ThyroidSonogram => thyroid::FIELDS,
            ReportKind::Vaccination => vaccination::FIELDS,
            ReportKind::Allergy => allergy::FIELDS,
            ReportKind::ChestXray => chest_xray::FIELDS,
        }
    }

    /// Validate the form's values and render the finished text block. The
    /// error string is written straight onto the form, so it speaks to the
    /// user, not to a log.
    pub fn build(self, values: &[String]) -> Result<String, String> {
        match self {
            ReportKind::Ekg => ekg::build(values),
            ReportKind::Dexa => dexa::build(values),
            ReportKind::ThyroidSonogram => thyroid::build(values),
            ReportKind::Vaccination => vaccination::build(values),
            ReportKind::Allergy => allergy::build(values),
            ReportKind::ChestXray => chest_xray::build(values),
        }
    }
}

/// Value for field `index`, tolerating a short slice.
fn field(values: &[String], index: usize) -> &str {
    values.get(index).map(String::as_str).unwrap_or("")
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| format!("'{trimmed}' is not a date (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_fields_and_a_target() {
        for kind in ReportKind::ALL {
            assert!(!kind.fields().is_empty(), "{} has no fields", kind.title());
            // Building from blanks must fail cleanly, never panic.
            let blanks = vec![String::new(); kind.fields().len()];
            assert!(kind.build(&blanks).is_err());
        }
    }

    #[test]
    fn objective_reports_and_plan_reports_split_as_expected() {
        assert_eq!(ReportKind::Ekg.target(), SectionId::Objective);
        assert_eq!(ReportKind::Vaccination.target(), SectionId::Plan);
        assert_eq!(ReportKind::Allergy.target(), SectionId::PastMedicalHistory);
    }

    #[test]
    fn dates_must_be_iso_formatted() {
        assert!(parse_date("2026-08-25").is_ok());
        assert!(parse_date(" 2026-08-25 ").is_ok());
        assert!(parse_date("08/25/2026").is_err());
        assert!(parse_date("").is_err());
    }
}
