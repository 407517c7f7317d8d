//! Template merging. A template is plain text that may carry section headers
//! (`CC>`, `PI>`, ...); merging routes each header's fragment to its section
//! and falls back to a plain insertion when the text has no headers at all.

use regex::Regex;

use super::abbrev::AbbrevBook;
use super::chart::NoteChart;
use super::section::SectionId;

/// What a merge did with the text, for reporting back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No section header anywhere; the whole text went in at the focused
    /// section's caret.
    InsertedAtFocus,
    /// Header-guided merge: `sections` fragments were appended, and
    /// `leading_insert` says whether text before the first header was placed
    /// at the focused caret.
    Merged { sections: usize, leading_insert: bool },
}

/// Alternation over the ten header literals. The pattern is assembled from
/// [`SectionId::ALL`], so a new section would join the matcher automatically.
fn header_pattern() -> Regex {
    let alternation = SectionId::ALL
        .iter()
        .map(|section| regex::escape(section.header()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("header literals form a valid pattern")
}

/// Merge `raw` template text into the chart. Abbreviations expand first, so
/// stored templates can themselves carry sigil tokens. Header matching is
/// exact and case-sensitive; every character of the text ends up either in a
/// matched section, in the focused section, or consumed as a header literal
/// or surrounding whitespace.
pub fn merge_into_chart(
    chart: &mut NoteChart,
    focused: SectionId,
    raw: &str,
    book: &AbbrevBook,
) -> MergeOutcome {
    let expanded = book.expand_text(raw);

    let matches: Vec<(usize, usize, SectionId)> = header_pattern()
        .find_iter(&expanded)
        .filter_map(|found| {
            SectionId::from_header(found.as_str())
                .map(|section| (found.start(), found.end(), section))
        })
        .collect();

    if matches.is_empty() {
        chart.section_mut(focused).insert_str(&expanded);
        return MergeOutcome::InsertedAtFocus;
    }

    let leading = expanded[..matches[0].0].trim();
    let leading_insert = !leading.is_empty();
    if leading_insert {
        chart.section_mut(focused).insert_str(leading);
    }

    let mut sections = 0;
    for (position, &(_, body_start, section)) in matches.iter().enumerate() {
        let body_end = matches
            .get(position + 1)
            .map(|&(next_start, _, _)| next_start)
            .unwrap_or(expanded.len());
        let body = expanded[body_start..body_end].trim();
        if body.is_empty() {
            continue;
        }
        chart.append_to(section, body);
        sections += 1;
    }

    MergeOutcome::Merged {
        sections,
        leading_insert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_book() -> AbbrevBook {
        AbbrevBook::new()
    }

    #[test]
    fn fragments_land_in_their_sections() {
        let mut chart = NoteChart::new();
        let outcome = merge_into_chart(
            &mut chart,
            SectionId::Subjective,
            "CC>\nheadache\n\nPI>\nstarted two days ago\n\nP>\nrest, fluids",
            &empty_book(),
        );

        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                sections: 3,
                leading_insert: false
            }
        );
        assert_eq!(chart.section(SectionId::ChiefComplaint).text(), "headache");
        assert_eq!(
            chart.section(SectionId::PresentIllness).text(),
            "started two days ago"
        );
        assert_eq!(chart.section(SectionId::Plan).text(), "rest, fluids");
        assert!(chart.section(SectionId::Subjective).is_empty());
    }

    #[test]
    fn merging_appends_below_existing_content() {
        let mut chart = NoteChart::new();
        chart.append_to(SectionId::Plan, "existing plan line");

        merge_into_chart(&mut chart, SectionId::Plan, "P>\nnew line", &empty_book());
        assert_eq!(
            chart.section(SectionId::Plan).text(),
            "existing plan line\nnew line"
        );
    }

    #[test]
    fn text_without_headers_goes_in_at_the_focused_caret() {
        let mut chart = NoteChart::new();
        chart.section_mut(SectionId::Comment).set_text("before ");

        let outcome = merge_into_chart(
            &mut chart,
            SectionId::Comment,
            "no headers here",
            &empty_book(),
        );
        assert_eq!(outcome, MergeOutcome::InsertedAtFocus);
        assert_eq!(
            chart.section(SectionId::Comment).text(),
            "before no headers here"
        );
    }

    #[test]
    fn leading_text_before_the_first_header_goes_to_focus() {
        let mut chart = NoteChart::new();
        let outcome = merge_into_chart(
            &mut chart,
            SectionId::Subjective,
            "reviewed prior records\nCC>\ncough",
            &empty_book(),
        );

        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                sections: 1,
                leading_insert: true
            }
        );
        assert_eq!(
            chart.section(SectionId::Subjective).text(),
            "reviewed prior records"
        );
        assert_eq!(chart.section(SectionId::ChiefComplaint).text(), "cough");
    }

    #[test]
    fn empty_fragment_bodies_are_skipped() {
        let mut chart = NoteChart::new();
        let outcome = merge_into_chart(
            &mut chart,
            SectionId::Subjective,
            "CC>\n\nPI>\nactual content",
            &empty_book(),
        );

        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                sections: 1,
                leading_insert: false
            }
        );
        assert!(chart.section(SectionId::ChiefComplaint).is_empty());
        assert_eq!(
            chart.section(SectionId::PresentIllness).text(),
            "actual content"
        );
    }

    #[test]
    fn abbreviations_expand_before_routing() {
        let mut book = AbbrevBook::new();
        book.insert("htn", "hypertension");

        let mut chart = NoteChart::new();
        merge_into_chart(&mut chart, SectionId::Subjective, "A>\n:htn", &book);
        assert_eq!(chart.section(SectionId::Assessment).text(), "hypertension");
    }

    #[test]
    fn ros_header_is_not_read_as_subjective() {
        let mut chart = NoteChart::new();
        merge_into_chart(
            &mut chart,
            SectionId::Comment,
            "ROS>\nno fever, no chills",
            &empty_book(),
        );

        assert_eq!(
            chart.section(SectionId::ReviewOfSystems).text(),
            "no fever, no chills"
        );
        assert!(chart.section(SectionId::Subjective).is_empty());
    }

    #[test]
    fn rendered_blob_merges_back_into_an_equal_chart() {
        let mut chart = NoteChart::new();
        chart.append_to(SectionId::ChiefComplaint, "dizziness");
        chart.append_to(SectionId::Objective, "BP 150/95\nHR 88");
        chart.append_to(SectionId::Plan, "recheck in one week");

        let blob = chart.render_blob();
        let mut restored = NoteChart::new();
        merge_into_chart(&mut restored, SectionId::Comment, &blob, &empty_book());

        for section in SectionId::ALL {
            assert_eq!(
                restored.section(section).text(),
                chart.section(section).text()
            );
        }
    }
}
