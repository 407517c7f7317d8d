use crate::models::{Abbreviation, DiseaseCode, Medication, Problem, Template};

/// Move a list cursor by `offset`, clamping at both ends. An empty list
/// parks the cursor at 0.
fn step(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (selected as isize + offset).clamp(0, len as isize - 1) as usize
}

/// Pull the cursor back inside the list after the backing rows change.
fn clamp_to(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        selected.min(len - 1)
    }
}

/// Backing state for the abbreviation manager screen.
pub(crate) struct AbbrevScreen {
    pub(crate) entries: Vec<Abbreviation>,
    pub(crate) filtered_entries: Vec<Abbreviation>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl AbbrevScreen {
    pub(crate) fn new(entries: Vec<Abbreviation>) -> Self {
        let mut screen = Self {
            filtered_entries: Vec::new(),
            entries,
            filter: None,
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    fn apply_filter(&mut self) {
        if let Some(q) = &self.filter {
            let ql = q.to_lowercase();
            if ql.trim().is_empty() {
                self.filtered_entries = self.entries.clone();
            } else {
                self.filtered_entries = self
                    .entries
                    .iter()
                    .filter(|entry| {
                        entry.short.to_lowercase().contains(&ql)
                            || entry.expansion.to_lowercase().contains(&ql)
                    })
                    .cloned()
                    .collect();
            }
        } else {
            self.filtered_entries = self.entries.clone();
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn set_entries(&mut self, entries: Vec<Abbreviation>) {
        self.entries = entries;
        self.apply_filter();
    }

    pub(crate) fn current_entry(&self) -> Option<&Abbreviation> {
        self.filtered_entries.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.filtered_entries.len(), offset);
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = clamp_to(self.selected, self.filtered_entries.len());
    }
}

/// Backing state for the template browser. The body of the highlighted
/// template is previewed beside the list.
pub(crate) struct TemplateScreen {
    pub(crate) templates: Vec<Template>,
    pub(crate) selected: usize,
}

impl TemplateScreen {
    pub(crate) fn new(templates: Vec<Template>) -> Self {
        let mut screen = Self {
            templates,
            selected: 0,
        };
        screen.ensure_in_bounds();
        screen
    }

    pub(crate) fn set_templates(&mut self, templates: Vec<Template>) {
        self.templates = templates;
        self.ensure_in_bounds();
    }

    pub(crate) fn current_template(&self) -> Option<&Template> {
        self.templates.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.templates.len(), offset);
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = clamp_to(self.selected, self.templates.len());
    }
}

/// Backing state for the problem list screen.
pub(crate) struct ProblemScreen {
    pub(crate) problems: Vec<Problem>,
    pub(crate) selected: usize,
}

impl ProblemScreen {
    pub(crate) fn new(problems: Vec<Problem>) -> Self {
        let mut screen = Self {
            problems,
            selected: 0,
        };
        screen.ensure_in_bounds();
        screen
    }

    pub(crate) fn set_problems(&mut self, problems: Vec<Problem>) {
        self.problems = problems;
        self.ensure_in_bounds();
    }

    pub(crate) fn current_problem(&self) -> Option<&Problem> {
        self.problems.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.problems.len(), offset);
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = clamp_to(self.selected, self.problems.len());
    }
}

/// Backing state for the medication search screen. Hits come back from the
/// background search worker; `awaiting` holds the sequence number of the
/// query still in flight so stale replies can be dropped.
pub(crate) struct MedicationScreen {
    pub(crate) query: String,
    pub(crate) hits: Vec<Medication>,
    pub(crate) selected: usize,
    pub(crate) awaiting: Option<u64>,
}

impl MedicationScreen {
    pub(crate) fn new() -> Self {
        Self {
            query: String::new(),
            hits: Vec::new(),
            selected: 0,
            awaiting: None,
        }
    }

    pub(crate) fn apply_hits(&mut self, hits: Vec<Medication>) {
        self.hits = hits;
        self.awaiting = None;
        self.ensure_in_bounds();
    }

    pub(crate) fn current_hit(&self) -> Option<&Medication> {
        self.hits.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.hits.len(), offset);
    }

    /// Drop a row after it was deleted from the catalog, without waiting on
    /// a fresh search round trip.
    pub(crate) fn remove_hit(&mut self, id: i64) {
        self.hits.retain(|hit| hit.id != id);
        self.ensure_in_bounds();
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = clamp_to(self.selected, self.hits.len());
    }
}

/// Backing state for the disease-code picker shown over the problem screen.
/// Typing edits the query and every keystroke goes out to the search worker.
pub(crate) struct CodePicker {
    pub(crate) query: String,
    pub(crate) hits: Vec<DiseaseCode>,
    pub(crate) selected: usize,
    pub(crate) awaiting: Option<u64>,
}

impl CodePicker {
    pub(crate) fn new() -> Self {
        Self {
            query: String::new(),
            hits: Vec::new(),
            selected: 0,
            awaiting: None,
        }
    }

    pub(crate) fn apply_hits(&mut self, hits: Vec<DiseaseCode>) {
        self.hits = hits;
        self.awaiting = None;
        self.selected = clamp_to(self.selected, self.hits.len());
    }

    pub(crate) fn current_hit(&self) -> Option<&DiseaseCode> {
        self.hits.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step(self.selected, self.hits.len(), offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, short: &str, expansion: &str) -> Abbreviation {
        Abbreviation {
            id,
            short: short.into(),
            expansion: expansion.into(),
        }
    }

    #[test]
    fn step_clamps_at_both_ends() {
        assert_eq!(step(0, 0, 5), 0);
        assert_eq!(step(0, 3, -2), 0);
        assert_eq!(step(1, 3, 10), 2);
        assert_eq!(step(2, 3, -1), 1);
    }

    #[test]
    fn filter_matches_short_form_and_expansion() {
        let mut screen = AbbrevScreen::new(vec![
            entry(1, "bp", "blood pressure"),
            entry(2, "htn", "hypertension"),
            entry(3, "sob", "shortness of breath"),
        ]);

        screen.set_filter(Some("press".into()));
        let visible: Vec<&str> = screen
            .filtered_entries
            .iter()
            .map(|e| e.short.as_str())
            .collect();
        assert_eq!(visible, vec!["bp"]);

        screen.set_filter(Some("HTN".into()));
        assert_eq!(screen.filtered_entries.len(), 1);
    }

    #[test]
    fn narrowing_the_filter_keeps_the_selection_in_bounds() {
        let mut screen = AbbrevScreen::new(vec![
            entry(1, "bp", "blood pressure"),
            entry(2, "htn", "hypertension"),
        ]);
        screen.move_selection(1);
        assert_eq!(screen.selected, 1);

        screen.set_filter(Some("blood".into()));
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current_entry().map(|e| e.id), Some(1));
    }

    #[test]
    fn removing_the_last_hit_clamps_the_selection() {
        let mut screen = MedicationScreen::new();
        screen.apply_hits(vec![
            Medication {
                id: 1,
                name: "Amlodipine".into(),
                strength: "5 mg".into(),
                route: "PO".into(),
            },
            Medication {
                id: 2,
                name: "Amlodipine".into(),
                strength: "10 mg".into(),
                route: "PO".into(),
            },
        ]);
        screen.move_selection(1);
        screen.remove_hit(2);
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current_hit().map(|hit| hit.id), Some(1));
    }

    #[test]
    fn selection_stays_inside_the_hit_list() {
        let mut picker = CodePicker::new();
        picker.move_selection(1);
        assert_eq!(picker.selected, 0);

        picker.apply_hits(vec![DiseaseCode {
            code: "I10".into(),
            label: "Essential hypertension".into(),
        }]);
        picker.move_selection(5);
        assert_eq!(picker.selected, 0);
    }
}
