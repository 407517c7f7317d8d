//! Medication orders. Unlike the form-driven reports, an order starts from a
//! catalog row picked on the medication screen; only the sig is typed.

use crate::models::Medication;

/// A prescribed line for the Plan section: catalog entry plus sig.
#[derive(Debug, Clone)]
pub struct MedicationOrder {
    pub medication: Medication,
    pub dose: String,
    pub frequency: String,
    pub days: u32,
}

impl MedicationOrder {
    /// One plan line, e.g. `Amlodipine 5 mg (PO) 1 tab qd x 30 days`.
    pub fn render(&self) -> String {
        let unit = if self.days == 1 { "day" } else { "days" };
        format!(
            "{} {} {} x {} {}",
            self.medication.display_name(),
            self.dose,
            self.frequency,
            self.days,
            unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amlodipine() -> Medication {
        Medication {
            id: 1,
            name: "Amlodipine".into(),
            strength: "5 mg".into(),
            route: "PO".into(),
        }
    }

    #[test]
    fn renders_the_full_sig() {
        let order = MedicationOrder {
            medication: amlodipine(),
            dose: "1 tab".into(),
            frequency: "qd".into(),
            days: 30,
        };
        assert_eq!(order.render(), "Amlodipine 5 mg (PO) 1 tab qd x 30 days");
    }

    #[test]
    fn a_single_day_reads_singular() {
        let order = MedicationOrder {
            medication: amlodipine(),
            dose: "1 tab".into(),
            frequency: "stat".into(),
            days: 1,
        };
        assert!(order.render().ends_with("x 1 day"));
    }
}
