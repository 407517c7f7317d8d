//! DEXA bone densitometry. Two T-scores go in; the WHO classification of the
//! lower one comes out alongside the raw numbers.

use chrono::NaiveDate;

use super::{field, parse_date, FieldKind, FieldSpec};

const T_SCORE_MIN: f64 = -6.0;
const T_SCORE_MAX: f64 = 4.0;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        label: "T-score (lumbar spine)",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        label: "T-score (femoral neck)",
        kind: FieldKind::Text,
        required: true,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    DexaReport::parse(values).map(|report| report.render())
}

struct DexaReport {
    date: NaiveDate,
    lumbar: f64,
    femoral: f64,
}

impl DexaReport {
    fn parse(values: &[String]) -> Result<Self, String> {
        Ok(Self {
            date: parse_date(field(values, 0))?,
            lumbar: parse_t_score(field(values, 1), "lumbar spine")?,
            femoral: parse_t_score(field(values, 2), "femoral neck")?,
        })
    }

    /// WHO classification on the lowest measured T-score.
    fn classification(&self) -> &'static str {
        let lowest = self.lumbar.min(self.femoral);
        if lowest >= -1.0 {
            "normal bone density"
        } else if lowest > -2.5 {
            "osteopenia"
        } else {
            "osteoporosis"
        }
    }

    fn render(&self) -> String {
        format!(
            "[DEXA {}]\nT-score (lumbar spine): {:.1}\nT-score (femoral neck): {:.1}\nAssessment: {}",
            self.date.format("%Y-%m-%d"),
            self.lumbar,
            self.femoral,
            self.classification()
        )
    }
}

fn parse_t_score(raw: &str, site: &str) -> Result<f64, String> {
    let score: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("T-score ({site}) must be a number"))?;
    if !(T_SCORE_MIN..=T_SCORE_MAX).contains(&score) {
        return Err(format!(
            "T-score ({site}) must be between {T_SCORE_MIN} and {T_SCORE_MAX}"
        ));
    }
    Ok(score)
}
