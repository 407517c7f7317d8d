//! Section identifiers and the editable text buffer behind each one. The ten
//! sections are a closed set with stable indices so every dispatch over them
//! is an explicit table lookup instead of name-based discovery.

use std::fmt;

use super::abbrev::AbbrevBook;

/// The ten clinical note sections in their fixed display order. Titles and
/// header literals never change once the application is running; templates
/// and the merge engine depend on the header strings staying exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    ChiefComplaint,
    PresentIllness,
    ReviewOfSystems,
    PastMedicalHistory,
    Subjective,
    Objective,
    PhysicalExam,
    Assessment,
    Plan,
    Comment,
}

impl SectionId {
    /// Every section in display order. This table drives section navigation,
    /// the merge engine's header alternation, and chart construction, so the
    /// order here is the single source of truth.
    pub const ALL: [SectionId; 10] = [
        SectionId::ChiefComplaint,
        SectionId::PresentIllness,
        SectionId::ReviewOfSystems,
        SectionId::PastMedicalHistory,
        SectionId::Subjective,
        SectionId::Objective,
        SectionId::PhysicalExam,
        SectionId::Assessment,
        SectionId::Plan,
        SectionId::Comment,
    ];

    /// Stable position of this section, 0 through 9.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Reverse of [`SectionId::index`]; `None` past the end of the table.
    pub fn from_index(index: usize) -> Option<SectionId> {
        SectionId::ALL.get(index).copied()
    }

    /// Full display title shown in the section list and export output.
    pub fn title(self) -> &'static str {
        match self {
            SectionId::ChiefComplaint => "Chief Complaint",
            SectionId::PresentIllness => "Present Illness",
            SectionId::ReviewOfSystems => "Review of Systems",
            SectionId::PastMedicalHistory => "Past Medical History",
            SectionId::Subjective => "Subjective",
            SectionId::Objective => "Objective",
            SectionId::PhysicalExam => "Physical Exam",
            SectionId::Assessment => "Assessment",
            SectionId::Plan => "Plan",
            SectionId::Comment => "Comment",
        }
    }

    /// The literal header token recognized inside template blobs. Matching is
    /// exact and case-sensitive; there is deliberately no fuzzy variant.
    pub fn header(self) -> &'static str {
        match self {
            SectionId::ChiefComplaint => "CC>",
            SectionId::PresentIllness => "PI>",
            SectionId::ReviewOfSystems => "ROS>",
            SectionId::PastMedicalHistory => "PMH>",
            SectionId::Subjective => "S>",
            SectionId::Objective => "O>",
            SectionId::PhysicalExam => "PE>",
            SectionId::Assessment => "A>",
            SectionId::Plan => "P>",
            SectionId::Comment => "Cmt>",
        }
    }

    /// Look a header literal back up. Used when the merge engine has matched
    /// text it already knows is one of the ten headers.
    pub fn from_header(header: &str) -> Option<SectionId> {
        SectionId::ALL
            .iter()
            .copied()
            .find(|section| section.header() == header)
    }

    /// The section after this one, wrapping from Comment back to Chief
    /// Complaint. Drives Tab navigation in the chart screen.
    pub fn next(self) -> SectionId {
        SectionId::ALL[(self.index() + 1) % SectionId::ALL.len()]
    }

    /// The section before this one, wrapping in the other direction.
    pub fn previous(self) -> SectionId {
        let len = SectionId::ALL.len();
        SectionId::ALL[(self.index() + len - 1) % len]
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// One editable note region: UTF-8 text plus a caret kept on a char boundary.
/// All mutation goes through these methods so the caret can never point into
/// the middle of a multi-byte character (clinical text is frequently
/// non-ASCII).
#[derive(Debug, Clone)]
pub struct SectionBuffer {
    id: SectionId,
    text: String,
    caret: usize,
}

impl SectionBuffer {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            text: String::new(),
            caret: 0,
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the caret. Always a valid char boundary of `text`.
    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the whole body, parking the caret at the end. Used when
    /// hydrating a chart from saved state rather than keystrokes.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.caret = self.text.len();
    }

    /// Insert one character at the caret.
    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.caret, ch);
        self.caret += ch.len_utf8();
    }

    /// Insert a string at the caret, leaving the caret after it.
    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.caret, s);
        self.caret += s.len();
    }

    /// Remove the character before the caret, if any.
    pub fn backspace(&mut self) {
        if let Some(prev) = self.text[..self.caret].chars().next_back() {
            let start = self.caret - prev.len_utf8();
            self.text.replace_range(start..self.caret, "");
            self.caret = start;
        }
    }

    /// Remove the character under the caret, if any.
    pub fn delete_forward(&mut self) {
        if let Some(next) = self.text[self.caret..].chars().next() {
            let end = self.caret + next.len_utf8();
            self.text.replace_range(self.caret..end, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.text[..self.caret].chars().next_back() {
            self.caret -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.text[self.caret..].chars().next() {
            self.caret += next.len_utf8();
        }
    }

    /// Jump to the start of the caret's line.
    pub fn move_line_start(&mut self) {
        self.caret = self.current_line_start();
    }

    /// Jump past the last character of the caret's line.
    pub fn move_line_end(&mut self) {
        self.caret = self.current_line_end();
    }

    /// Move the caret one line up, clamping the column to the shorter line.
    pub fn move_up(&mut self) {
        let (line, column) = self.caret_line_col();
        if line == 0 {
            return;
        }
        self.caret = self.offset_at(line - 1, column);
    }

    /// Move the caret one line down, clamping the column to the shorter line.
    pub fn move_down(&mut self) {
        let (line, column) = self.caret_line_col();
        let last = self.line_starts().len() - 1;
        if line >= last {
            return;
        }
        self.caret = self.offset_at(line + 1, column);
    }

    /// Append a block of text produced outside the editor (reports, template
    /// fragments, problem lines). An occupied buffer gets a single newline
    /// between the old content and the block; the caret lands at the end so
    /// follow-up typing continues after the insertion.
    pub fn append_block(&mut self, block: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(block);
        self.caret = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    /// Expand a sigil token that ends at the caret. The token is the text
    /// between the last whitespace (or start of buffer) and the caret; when
    /// it resolves through the book, it is replaced in place exactly once and
    /// the caret moves to the end of the expansion. Returns whether anything
    /// changed, so callers can decide what to report.
    pub fn expand_abbrev_at_caret(&mut self, book: &AbbrevBook) -> bool {
        let start = self.text[..self.caret]
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map(|(idx, ch)| idx + ch.len_utf8())
            .unwrap_or(0);

        let token = &self.text[start..self.caret];
        match book.expand_token(token) {
            Some(expansion) => {
                self.text.replace_range(start..self.caret, &expansion);
                self.caret = start + expansion.len();
                true
            }
            None => false,
        }
    }

    /// Zero-based (line, column-in-chars) of the caret for the status bar and
    /// cursor placement.
    pub fn caret_line_col(&self) -> (usize, usize) {
        let line_start = self.current_line_start();
        let line = self.text[..line_start]
            .bytes()
            .filter(|b| *b == b'\n')
            .count();
        let column = self.text[line_start..self.caret].chars().count();
        (line, column)
    }

    /// Byte offsets at which each line begins. A trailing newline opens one
    /// final empty line, matching what the editor renders.
    fn line_starts(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (idx, byte) in self.text.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(idx + 1);
            }
        }
        starts
    }

    fn current_line_start(&self) -> usize {
        self.text[..self.caret]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }

    fn current_line_end(&self) -> usize {
        self.text[self.caret..]
            .find('\n')
            .map(|idx| self.caret + idx)
            .unwrap_or(self.text.len())
    }

    /// Byte offset of `column` chars into `line`, clamped to the line's end.
    fn offset_at(&self, line: usize, column: usize) -> usize {
        let starts = self.line_starts();
        let start = starts[line.min(starts.len() - 1)];
        let end = self.text[start..]
            .find('\n')
            .map(|idx| start + idx)
            .unwrap_or(self.text.len());

        let mut offset = start;
        for ch in self.text[start..end].chars().take(column) {
            offset += ch.len_utf8();
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::abbrev::AbbrevBook;

    fn buffer_with(text: &str) -> SectionBuffer {
        let mut buffer = SectionBuffer::new(SectionId::Subjective);
        buffer.set_text(text);
        buffer
    }

    #[test]
    fn indices_round_trip_through_the_table() {
        for (expected, section) in SectionId::ALL.iter().enumerate() {
            assert_eq!(section.index(), expected);
            assert_eq!(SectionId::from_index(expected), Some(*section));
        }
        assert_eq!(SectionId::from_index(10), None);
    }

    #[test]
    fn headers_resolve_back_to_their_section() {
        for section in SectionId::ALL {
            assert_eq!(SectionId::from_header(section.header()), Some(section));
        }
        assert_eq!(SectionId::from_header("XX>"), None);
    }

    #[test]
    fn navigation_wraps_both_ways() {
        assert_eq!(SectionId::Comment.next(), SectionId::ChiefComplaint);
        assert_eq!(SectionId::ChiefComplaint.previous(), SectionId::Comment);
        assert_eq!(SectionId::Subjective.next(), SectionId::Objective);
    }

    #[test]
    fn insert_and_backspace_respect_multibyte_chars() {
        let mut buffer = SectionBuffer::new(SectionId::ChiefComplaint);
        buffer.insert_char('두');
        buffer.insert_char('통');
        assert_eq!(buffer.text(), "두통");

        buffer.move_left();
        buffer.backspace();
        assert_eq!(buffer.text(), "통");
        assert_eq!(buffer.caret(), 0);

        buffer.delete_forward();
        assert!(buffer.is_empty());
    }

    #[test]
    fn vertical_movement_clamps_columns() {
        let mut buffer = buffer_with("first line\nab\nthird line");
        buffer.move_line_end();
        let (line, col) = buffer.caret_line_col();
        assert_eq!((line, col), (2, 10));

        buffer.move_up();
        let (line, col) = buffer.caret_line_col();
        assert_eq!((line, col), (1, 2));

        buffer.move_up();
        buffer.move_line_start();
        assert_eq!(buffer.caret(), 0);

        buffer.move_down();
        buffer.move_down();
        let (line, _) = buffer.caret_line_col();
        assert_eq!(line, 2);
    }

    #[test]
    fn append_block_joins_with_a_single_newline() {
        let mut buffer = SectionBuffer::new(SectionId::Plan);
        buffer.append_block("first block");
        assert_eq!(buffer.text(), "first block");

        buffer.append_block("second block");
        assert_eq!(buffer.text(), "first block\nsecond block");
        assert_eq!(buffer.caret(), buffer.text().len());
    }

    #[test]
    fn expansion_replaces_the_token_in_place() {
        let mut book = AbbrevBook::new();
        book.insert("htn", "hypertension");

        let mut buffer = buffer_with("known :htn");
        assert!(buffer.expand_abbrev_at_caret(&book));
        assert_eq!(buffer.text(), "known hypertension");
        assert_eq!(buffer.caret(), buffer.text().len());
    }

    #[test]
    fn expansion_leaves_unknown_tokens_untouched() {
        let book = AbbrevBook::new();
        let mut buffer = buffer_with("plan :xyz");
        assert!(!buffer.expand_abbrev_at_caret(&book));
        assert_eq!(buffer.text(), "plan :xyz");
    }

    #[test]
    fn expansion_requires_the_sigil() {
        let mut book = AbbrevBook::new();
        book.insert("htn", "hypertension");

        let mut buffer = buffer_with("htn");
        assert!(!buffer.expand_abbrev_at_caret(&book));
        assert_eq!(buffer.text(), "htn");
    }
}
