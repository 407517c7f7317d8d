//! EKG report. Rate, rhythm, and axis are always reported; the interval
//! measurements and the interpretation may be left blank and drop out of the
//! rendered block.

use chrono::NaiveDate;

use super::{field, parse_date, FieldKind, FieldSpec};

const RHYTHMS: &[&str] = &[
    "sinus rhythm",
    "sinus bradycardia",
    "sinus tachycardia",
    "atrial fibrillation",
    "atrial flutter",
    "paced rhythm",
    "other",
];

const AXES: &[&str] = &["normal", "left deviation", "right deviation", "indeterminate"];

const RATE_MIN: u32 = 20;
const RATE_MAX: u32 = 300;

pub(super) const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Date",
        kind: FieldKind::Date,
        required: true,
    },
    FieldSpec {
        label: "Rate (bpm)",
        kind: FieldKind::Text,
        required: true,
    },
    FieldSpec {
        label: "Rhythm",
        kind: FieldKind::Choice(RHYTHMS),
        required: true,
    },
    FieldSpec {
        label: "Axis",
        kind: FieldKind::Choice(AXES),
        required: true,
    },
    FieldSpec {
        label: "PR (ms)",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "QRS (ms)",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "QTc (ms)",
        kind: FieldKind::Text,
        required: false,
    },
    FieldSpec {
        label: "Interpretation",
        kind: FieldKind::Text,
        required: false,
    },
];

pub(super) fn build(values: &[String]) -> Result<String, String> {
    EkgReport::parse(values).map(|report| report.render())
}

struct EkgReport {
    date: NaiveDate,
    rate: u32,
    rhythm: String,
    axis: String,
    pr: Option<u32>,
    qrs: Option<u32>,
    qtc: Option<u32>,
    interpretation: String,
}

impl EkgReport {
    fn parse(values: &[String]) -> Result<Self, String> {
        let date = parse_date(field(values, 0))?;

        let rate: u32 = field(values, 1)
            .trim()
            .parse()
            .map_err(|_| "Rate must be a whole number".to_string())?;
        if !(RATE_MIN..=RATE_MAX).contains(&rate) {
            return Err(format!("Rate must be between {RATE_MIN} and {RATE_MAX} bpm"));
        }

        let rhythm = field(values, 2).trim();
        if rhythm.is_empty() {
            return Err("Pick a rhythm".to_string());
        }

        let axis = field(values, 3).trim();
        if axis.is_empty() {
            return Err("Pick an axis".to_string());
        }

        Ok(Self {
            date,
            rate,
            rhythm: rhythm.to_string(),
            axis: axis.to_string(),
            pr: parse_interval(field(values, 4), "PR", 40, 400)?,
            qrs: parse_interval(field(values, 5), "QRS", 40, 300)?,
            qtc: parse_interval(field(values, 6), "QTc", 200, 700)?,
            interpretation: field(values, 7).trim().to_string(),
        })
    }

    fn render(&self) -> String {
        let mut lines = vec![
            format!("[EKG {}]", self.date.format("%Y-%m-%d")),
            format!("Rate: {} bpm", self.rate),
            format!("Rhythm: {}", self.rhythm),
            format!("Axis: {}", self.axis),
        ];

        let intervals: Vec<String> = [("PR", self.pr), ("QRS", self.qrs), ("QTc", self.qtc)]
            .iter()
            .filter_map(|(label, value)| value.map(|ms| format!("{label} {ms} ms")))
            .collect();
        if !intervals.is_empty() {
            lines.push(format!("Intervals: {}", intervals.join(", ")));
        }

        if !self.interpretation.is_empty() {
            lines.push(format!("Interpretation: {}", self.interpretation));
        }
        lines.join("\n")
    }
}

/// An interval field is optional, but when present it must be a plausible
/// millisecond count.
fn parse_interval(raw: &str, label: &str, min: u32, max: u32) -> Result<Option<u32>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let ms: u32 = trimmed
        .parse()
        .map_err(|_| format!("{label} must be a whole number of ms"))?;
    if !(min..=max).contains(&ms) {
        return Err(format!("{label} must be between {min} and {max} ms"));
    }
    Ok(Some(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(fields: [&str; 8]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renders_a_complete_block() {
        let block = build(&values([
            "2026-08-25",
            "72",
            "sinus rhythm",
            "normal",
            "160",
            "90",
            "430",
            "within normal limits",
        ]))
        .expect("valid");
        assert_eq!(
            block,
            "[EKG 2026-08-25]\nRate: 72 bpm\nRhythm: sinus rhythm\nAxis: normal\n\
             Intervals: PR 160 ms, QRS 90 ms, QTc 430 ms\nInterpretation: within normal limits"
        );
    }

    #[test]
    fn blank_optional_fields_drop_their_lines() {
        let block = build(&values([
            "2026-08-25",
            "58",
            "sinus bradycardia",
            "normal",
            "",
            "",
            "",
            "",
        ]))
        .expect("valid");
        assert!(!block.contains("Intervals"));
        assert!(!block.contains("Interpretation"));
        assert!(block.ends_with("Axis: normal"));
    }

    #[test]
    fn a_lone_interval_still_gets_its_line() {
        let block = build(&values([
            "2026-08-25",
            "88",
            "atrial fibrillation",
            "left deviation",
            "",
            "",
            "480",
            "",
        ]))
        .expect("valid");
        assert!(block.contains("Intervals: QTc 480 ms"));
        assert!(!block.contains("PR"));
    }

    #[test]
    fn rate_outside_physiologic_range_is_rejected() {
        let too_slow = values(["2026-08-25", "10", "sinus rhythm", "normal", "", "", "", ""]);
        assert_eq!(
            build(&too_slow).expect_err("too slow"),
            "Rate must be between 20 and 300 bpm"
        );

        let too_fast = values(["2026-08-25", "301", "sinus rhythm", "normal", "", "", "", ""]);
        assert_eq!(
            build(&too_fast).expect_err("too fast"),
            "Rate must be between 20 and 300 bpm"
        );

        let floor = values(["2026-08-25", "20", "sinus rhythm", "normal", "", "", "", ""]);
        assert!(build(&floor).is_ok());
        let ceiling = values(["2026-08-25", "300", "sinus rhythm", "normal", "", "", "", ""]);
        assert!(build(&ceiling).is_ok());
    }

    #[test]
    fn rate_must_be_numeric() {
        let err = build(&values([
            "2026-08-25",
            "fast",
            "sinus rhythm",
            "normal",
            "",
            "",
            "",
            "",
        ]))
        .expect_err("not a number");
        assert_eq!(err, "Rate must be a whole number");
    }

    #[test]
    fn implausible_intervals_are_rejected() {
        let err = build(&values([
            "2026-08-25",
            "72",
            "sinus rhythm",
            "normal",
            "2",
            "",
            "",
            "",
        ]))
        .expect_err("too short");
        assert_eq!(err, "PR must be between 40 and 400 ms");

        let err = build(&values([
            "2026-08-25",
            "72",
            "sinus rhythm",
            "normal",
            "",
            "",
            "abc",
            "",
        ]))
        .expect_err("not numeric");
        assert_eq!(err, "QTc must be a whole number of ms");
    }

    #[test]
    fn bad_dates_are_rejected() {
        let bad = values(["25/08/2026", "72", "sinus rhythm", "normal", "", "", "", ""]);
        assert!(build(&bad).is_err());
    }
}
