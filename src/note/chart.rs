//! The chart: one buffer per section, constructed all at once. Because the
//! full set exists from the first line of `main`, nothing downstream ever has
//! to ask whether a section has been registered yet; `append_to` and
//! `clear_all` are total over [`SectionId`].

use super::section::{SectionBuffer, SectionId};

/// All ten section buffers for the note being written. Passed explicitly to
/// whatever needs it (editor, merge engine, report builders) rather than
/// reached through any global.
#[derive(Debug, Clone)]
pub struct NoteChart {
    sections: [SectionBuffer; 10],
}

impl NoteChart {
    /// A chart with every section present and empty.
    pub fn new() -> Self {
        Self {
            sections: SectionId::ALL.map(SectionBuffer::new),
        }
    }

    pub fn section(&self, id: SectionId) -> &SectionBuffer {
        &self.sections[id.index()]
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut SectionBuffer {
        &mut self.sections[id.index()]
    }

    /// Buffers in display order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionBuffer> {
        self.sections.iter()
    }

    /// Append a finished block (report output, template fragment, problem
    /// line) to a section, newline-joined after any existing content.
    pub fn append_to(&mut self, id: SectionId, block: &str) {
        self.section_mut(id).append_block(block);
    }

    /// Wipe every section. Total by construction; there is no partially
    /// cleared state to recover from.
    pub fn clear_all(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
    }

    pub fn is_all_empty(&self) -> bool {
        self.sections.iter().all(|section| section.is_empty())
    }

    /// Render the whole note as one text blob: each non-empty section as its
    /// header line followed by the trimmed body, blocks separated by a blank
    /// line. The output uses the same header literals the merge engine
    /// recognizes, so an exported note can be merged straight back in.
    pub fn render_blob(&self) -> String {
        let mut blocks = Vec::new();
        for section in &self.sections {
            let body = section.text().trim();
            if body.is_empty() {
                continue;
            }
            blocks.push(format!("{}\n{}", section.id().header(), body));
        }
        blocks.join("\n\n")
    }
}

impl Default for NoteChart {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_is_reachable_from_a_fresh_chart() {
        let mut chart = NoteChart::new();
        for section in SectionId::ALL {
            assert!(chart.section(section).is_empty());
            chart.append_to(section, "x");
            assert_eq!(chart.section(section).text(), "x");
        }
        assert!(!chart.is_all_empty());
    }

    #[test]
    fn clear_all_empties_every_section() {
        let mut chart = NoteChart::new();
        chart.append_to(SectionId::Plan, "amlodipine 5mg qd");
        chart.append_to(SectionId::Assessment, "# hypertension");

        chart.clear_all();
        assert!(chart.is_all_empty());
        for section in SectionId::ALL {
            assert_eq!(chart.section(section).text(), "");
        }
    }

    #[test]
    fn render_blob_skips_empty_sections_and_keeps_order() {
        let mut chart = NoteChart::new();
        chart.append_to(SectionId::Plan, "follow up in 2 weeks");
        chart.append_to(SectionId::ChiefComplaint, "headache");

        let blob = chart.render_blob();
        assert_eq!(blob, "CC>\nheadache\n\nP>\nfollow up in 2 weeks");
    }

    #[test]
    fn render_blob_of_an_empty_chart_is_empty() {
        assert_eq!(NoteChart::new().render_blob(), "");
    }
}
