use std::fs;
use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Error, Result};
use chrono::Local;
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    create_abbreviation, create_medication, create_problem, create_template, delete_abbreviation,
    delete_medication, delete_problem, delete_template, export_dir, fetch_abbreviations,
    fetch_problems, fetch_templates, update_abbreviation, update_problem, update_template,
    SearchHits, SearchReply, SearchRequest, SearchScope, SearchWorker,
};
use crate::models::Abbreviation;
use crate::note::{merge_into_chart, AbbrevBook, MergeOutcome, NoteChart, SectionId};
use crate::reports::{MedicationOrder, ReportKind};

use super::editor::{self, EditorEvent};
use super::forms::{
    AbbrevField, AbbrevForm, ConfirmEntryDelete, EntryKind, MedicationField, MedicationForm,
    ProblemField, ProblemForm, ReportForm, SigField, SigForm, TemplateSaveForm,
};
use super::helpers::{
    form_status_line, hint_line, popup_inner, render_selectable, surface_error,
};
use super::screens::{AbbrevScreen, CodePicker, MedicationScreen, ProblemScreen, TemplateScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Width of the section list beside the editor pane. Wide enough for
/// "Chief Complaint" plus the shortcut digit and the non-empty marker.
const SECTION_LIST_WIDTH: u16 = 26;

/// High-level navigation states. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Screen {
    Chart,
    Abbreviations(AbbrevScreen),
    Templates(TemplateScreen),
    Problems(ProblemScreen),
    Medications(MedicationScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    EditingSection,
    AddingAbbrev(AbbrevForm),
    EditingAbbrev {
        id: i64,
        form: AbbrevForm,
    },
    AddingProblem(ProblemForm),
    EditingProblem {
        id: i64,
        form: ProblemForm,
    },
    PickingCode(CodePicker),
    AddingMedication(MedicationForm),
    EnteringSig(SigForm),
    SavingTemplate(TemplateSaveForm),
    PickingReport {
        selected: usize,
    },
    FillingReport(ReportForm),
    Searching(SearchState),
    ConfirmEntryDelete(ConfirmEntryDelete),
    ConfirmClearChart,
}

/// Which catalog an inline search queries.
enum SearchTarget {
    Abbreviations,
    Medications,
}

/// Live query text for the search overlay.
struct SearchState {
    target: SearchTarget,
    query: String,
}

/// One footer message and how loudly to show it.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        let color = match self {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        Style::default().fg(color)
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    search: SearchWorker,
    search_seq: u64,
    chart: NoteChart,
    focused: SectionId,
    book: AbbrevBook,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(conn: Connection, search: SearchWorker, abbreviations: Vec<Abbreviation>) -> Self {
        Self {
            conn,
            search,
            search_seq: 0,
            chart: NoteChart::new(),
            focused: SectionId::ChiefComplaint,
            book: AbbrevBook::from_entries(&abbreviations),
            screen: Screen::Chart,
            mode: Mode::Normal,
            status: None,
            last_export: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingSection => self.handle_editing_section(code),
            Mode::AddingAbbrev(form) => self.handle_add_abbrev(code, form)?,
            Mode::EditingAbbrev { id, form } => self.handle_edit_abbrev(code, id, form)?,
            Mode::AddingProblem(form) => self.handle_add_problem(code, form)?,
            Mode::EditingProblem { id, form } => self.handle_edit_problem(code, id, form)?,
            Mode::PickingCode(picker) => self.handle_pick_code(code, picker)?,
            Mode::AddingMedication(form) => self.handle_add_medication(code, form)?,
            Mode::EnteringSig(form) => self.handle_entering_sig(code, form),
            Mode::SavingTemplate(form) => self.handle_saving_template(code, form)?,
            Mode::PickingReport { selected } => self.handle_pick_report(code, selected),
            Mode::FillingReport(form) => self.handle_filling_report(code, form),
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::ConfirmEntryDelete(confirm) => self.handle_confirm_entry_delete(code, confirm)?,
            Mode::ConfirmClearChart => self.handle_confirm_clear_chart(code),
        };

        self.mode = mode;
        Ok(exit)
    }

    /// Pump replies from the search worker into whichever screen or picker is
    /// waiting on them. Called once per event-loop tick.
    pub(crate) fn poll_background(&mut self) {
        for reply in self.search.drain_replies() {
            self.apply_search_reply(reply);
        }
    }

    fn apply_search_reply(&mut self, reply: SearchReply) {
        match reply.outcome {
            Ok(SearchHits::Codes(hits)) => {
                if let Mode::PickingCode(ref mut picker) = self.mode {
                    if picker.awaiting == Some(reply.seq) {
                        picker.apply_hits(hits);
                    }
                }
            }
            Ok(SearchHits::Medications(hits)) => {
                if let Screen::Medications(ref mut screen) = self.screen {
                    if screen.awaiting == Some(reply.seq) {
                        screen.apply_hits(hits);
                    }
                }
            }
            Err(message) => self.set_status(message, StatusKind::Error),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Chart => {
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        *exit = true;
                    }
                    KeyCode::Up | KeyCode::BackTab => {
                        self.focused = self.focused.previous();
                    }
                    KeyCode::Down | KeyCode::Tab => {
                        self.focused = self.focused.next();
                    }
                    KeyCode::Enter | KeyCode::Char('e') => {
                        self.clear_status();
                        return Ok(Mode::EditingSection);
                    }
                    KeyCode::Char('a') => {
                        self.clear_status();
                        self.open_abbreviations()?;
                    }
                    KeyCode::Char('t') => {
                        self.clear_status();
                        self.open_templates()?;
                    }
                    KeyCode::Char('p') => {
                        self.clear_status();
                        self.open_problems()?;
                    }
                    KeyCode::Char('m') => {
                        self.clear_status();
                        self.open_medications()?;
                    }
                    KeyCode::Char('r') => {
                        self.clear_status();
                        return Ok(Mode::PickingReport { selected: 0 });
                    }
                    KeyCode::Char('x') => {
                        if let Err(err) = self.export_note() {
                            self.report_error(err);
                        }
                    }
                    KeyCode::Char('o') => self.open_last_export(),
                    KeyCode::Char('D') => {
                        if self.chart.is_all_empty() {
                            self.set_status("The note is already empty.", StatusKind::Error);
                        } else {
                            return Ok(Mode::ConfirmClearChart);
                        }
                    }
                    KeyCode::Char(ch) if ch.is_ascii_digit() => {
                        let index = if ch == '0' {
                            9
                        } else {
                            (ch as u8 - b'1') as usize
                        };
                        if let Some(section) = SectionId::from_index(index) {
                            self.focused = section;
                        }
                    }
                    _ => {}
                }
                Ok(Mode::Normal)
            }
            Screen::Abbreviations(ref mut screen) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut return_to_chart = false;

                {
                    let screen = &mut *screen;
                    match code {
                        KeyCode::Char('q') => {
                            *exit = true;
                        }
                        KeyCode::Esc | KeyCode::Char('a') => {
                            return_to_chart = true;
                        }
                        KeyCode::Up => screen.move_selection(-1),
                        KeyCode::Down => screen.move_selection(1),
                        KeyCode::PageUp => screen.move_selection(-5),
                        KeyCode::PageDown => screen.move_selection(5),
                        KeyCode::Char('f') => {
                            return Ok(Mode::Searching(SearchState {
                                target: SearchTarget::Abbreviations,
                                query: String::new(),
                            }));
                        }
                        KeyCode::Char('+') => {
                            return Ok(Mode::AddingAbbrev(AbbrevForm::default()));
                        }
                        KeyCode::Char('e') | KeyCode::Enter => {
                            if let Some(entry) = screen.current_entry() {
                                return Ok(Mode::EditingAbbrev {
                                    id: entry.id,
                                    form: AbbrevForm::from_entry(entry),
                                });
                            } else {
                                status_to_set = Some((
                                    "No abbreviation selected to edit.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('-') => {
                            if let Some(entry) = screen.current_entry() {
                                return Ok(Mode::ConfirmEntryDelete(ConfirmEntryDelete {
                                    kind: EntryKind::Abbreviation,
                                    id: entry.id,
                                    label: entry.short.clone(),
                                }));
                            } else {
                                status_to_set = Some((
                                    "No abbreviation selected to delete.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        _ => {}
                    }
                }

                if return_to_chart {
                    self.clear_status();
                    self.screen = Screen::Chart;
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
            Screen::Templates(ref mut screen) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut return_to_chart = false;
                let mut merge_source: Option<(String, String)> = None;
                let mut open_save_form = false;
                let mut refresh_target: Option<(i64, String)> = None;

                {
                    let screen = &mut *screen;
                    match code {
                        KeyCode::Char('q') => {
                            *exit = true;
                        }
                        KeyCode::Esc | KeyCode::Char('t') => {
                            return_to_chart = true;
                        }
                        KeyCode::Up => screen.move_selection(-1),
                        KeyCode::Down => screen.move_selection(1),
                        KeyCode::PageUp => screen.move_selection(-5),
                        KeyCode::PageDown => screen.move_selection(5),
                        KeyCode::Enter => {
                            if let Some(template) = screen.current_template() {
                                merge_source =
                                    Some((template.name.clone(), template.content.clone()));
                            } else {
                                status_to_set = Some((
                                    "No template selected to merge.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('n') | KeyCode::Char('+') => {
                            open_save_form = true;
                        }
                        KeyCode::Char('u') => {
                            if let Some(template) = screen.current_template() {
                                refresh_target = Some((template.id, template.name.clone()));
                            } else {
                                status_to_set = Some((
                                    "No template selected to refresh.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('-') => {
                            if let Some(template) = screen.current_template() {
                                return Ok(Mode::ConfirmEntryDelete(ConfirmEntryDelete {
                                    kind: EntryKind::Template,
                                    id: template.id,
                                    label: template.name.clone(),
                                }));
                            } else {
                                status_to_set = Some((
                                    "No template selected to delete.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        _ => {}
                    }
                }

                if return_to_chart {
                    self.clear_status();
                    self.screen = Screen::Chart;
                } else if let Some((name, content)) = merge_source {
                    self.merge_template(&name, &content);
                } else if open_save_form {
                    if self.chart.is_all_empty() {
                        self.set_status("Nothing in the note to save.", StatusKind::Error);
                    } else {
                        return Ok(Mode::SavingTemplate(TemplateSaveForm::default()));
                    }
                } else if let Some((id, name)) = refresh_target {
                    self.refresh_template(id, &name)?;
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
            Screen::Problems(ref mut screen) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut return_to_chart = false;
                let mut push_line: Option<String> = None;
                let mut open_picker = false;

                {
                    let screen = &mut *screen;
                    match code {
                        KeyCode::Char('q') => {
                            *exit = true;
                        }
                        KeyCode::Esc | KeyCode::Char('p') => {
                            return_to_chart = true;
                        }
                        KeyCode::Up => screen.move_selection(-1),
                        KeyCode::Down => screen.move_selection(1),
                        KeyCode::PageUp => screen.move_selection(-5),
                        KeyCode::PageDown => screen.move_selection(5),
                        KeyCode::Enter => {
                            if let Some(problem) = screen.current_problem() {
                                push_line = Some(problem.assessment_line());
                            } else {
                                status_to_set = Some((
                                    "No problem selected.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('+') => {
                            return Ok(Mode::AddingProblem(ProblemForm::default()));
                        }
                        KeyCode::Char('c') => {
                            open_picker = true;
                        }
                        KeyCode::Char('e') => {
                            if let Some(problem) = screen.current_problem() {
                                return Ok(Mode::EditingProblem {
                                    id: problem.id,
                                    form: ProblemForm::from_problem(problem),
                                });
                            } else {
                                status_to_set = Some((
                                    "No problem selected to edit.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('-') => {
                            if let Some(problem) = screen.current_problem() {
                                return Ok(Mode::ConfirmEntryDelete(ConfirmEntryDelete {
                                    kind: EntryKind::Problem,
                                    id: problem.id,
                                    label: problem.label.clone(),
                                }));
                            } else {
                                status_to_set = Some((
                                    "No problem selected to delete.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        _ => {}
                    }
                }

                if return_to_chart {
                    self.clear_status();
                    self.screen = Screen::Chart;
                } else if let Some(line) = push_line {
                    self.chart.append_to(SectionId::Assessment, &line);
                    self.set_status(format!("Added to Assessment: {line}"), StatusKind::Info);
                } else if open_picker {
                    let mut picker = CodePicker::new();
                    picker.awaiting = Some(self.submit_code_search("")?);
                    return Ok(Mode::PickingCode(picker));
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
            Screen::Medications(ref mut screen) => {
                let mut status_to_set: Option<(String, StatusKind)> = None;
                let mut return_to_chart = false;
                let mut start_search = false;

                {
                    let screen = &mut *screen;
                    match code {
                        KeyCode::Char('q') => {
                            *exit = true;
                        }
                        KeyCode::Esc | KeyCode::Char('m') => {
                            return_to_chart = true;
                        }
                        KeyCode::Up => screen.move_selection(-1),
                        KeyCode::Down => screen.move_selection(1),
                        KeyCode::PageUp => screen.move_selection(-5),
                        KeyCode::PageDown => screen.move_selection(5),
                        KeyCode::Char('f') => {
                            start_search = true;
                        }
                        KeyCode::Enter => {
                            if let Some(hit) = screen.current_hit().cloned() {
                                return Ok(Mode::EnteringSig(SigForm::for_medication(hit)));
                            } else {
                                status_to_set = Some((
                                    "No medication selected.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        KeyCode::Char('+') => {
                            return Ok(Mode::AddingMedication(MedicationForm::default()));
                        }
                        KeyCode::Char('-') => {
                            if let Some(hit) = screen.current_hit() {
                                return Ok(Mode::ConfirmEntryDelete(ConfirmEntryDelete {
                                    kind: EntryKind::Medication,
                                    id: hit.id,
                                    label: hit.display_name(),
                                }));
                            } else {
                                status_to_set = Some((
                                    "No medication selected to delete.".to_string(),
                                    StatusKind::Error,
                                ));
                            }
                        }
                        _ => {}
                    }
                }

                if return_to_chart {
                    self.clear_status();
                    self.screen = Screen::Chart;
                } else if start_search {
                    return Ok(Mode::Searching(SearchState {
                        target: SearchTarget::Medications,
                        query: String::new(),
                    }));
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
        }
    }

    fn handle_editing_section(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Tab => {
                self.focused = self.focused.next();
                return Mode::EditingSection;
            }
            KeyCode::BackTab => {
                self.focused = self.focused.previous();
                return Mode::EditingSection;
            }
            _ => {}
        }

        let buffer = self.chart.section_mut(self.focused);
        if let EditorEvent::Expanded = editor::apply_key(buffer, &self.book, code) {
            self.set_status("Abbreviation expanded.", StatusKind::Info);
        }
        Mode::EditingSection
    }

    fn handle_add_abbrev(&mut self, code: KeyCode, mut form: AbbrevForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add abbreviation cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_abbreviation(&form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingAbbrev(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_abbrev(&mut self, code: KeyCode, id: i64, mut form: AbbrevForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_abbreviation(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingAbbrev { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_add_problem(&mut self, code: KeyCode, mut form: ProblemForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add problem cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_problem(&form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingProblem(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_problem(&mut self, code: KeyCode, id: i64, mut form: ProblemForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((code_value, label)) => {
                    match update_problem(&self.conn, id, code_value.as_deref(), &label) {
                        Ok(_) => {
                            self.reload_problems()?;
                            self.set_status("Problem updated.", StatusKind::Info);
                            keep_open = false;
                        }
                        Err(err) => self.report_form_error(&mut form.error, err),
                    }
                }
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingProblem { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_pick_code(&mut self, code: KeyCode, mut picker: CodePicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Up => {
                picker.move_selection(-1);
                Ok(Mode::PickingCode(picker))
            }
            KeyCode::Down => {
                picker.move_selection(1);
                Ok(Mode::PickingCode(picker))
            }
            KeyCode::PageUp => {
                picker.move_selection(-5);
                Ok(Mode::PickingCode(picker))
            }
            KeyCode::PageDown => {
                picker.move_selection(5);
                Ok(Mode::PickingCode(picker))
            }
            KeyCode::Enter => match picker.current_hit() {
                Some(hit) => Ok(Mode::AddingProblem(ProblemForm::from_code(
                    &hit.code, &hit.label,
                ))),
                None => Ok(Mode::PickingCode(picker)),
            },
            KeyCode::Backspace => {
                picker.query.pop();
                picker.awaiting = Some(self.submit_code_search(&picker.query)?);
                Ok(Mode::PickingCode(picker))
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                picker.query.push(ch);
                picker.awaiting = Some(self.submit_code_search(&picker.query)?);
                Ok(Mode::PickingCode(picker))
            }
            _ => Ok(Mode::PickingCode(picker)),
        }
    }

    fn handle_add_medication(&mut self, code: KeyCode, mut form: MedicationForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add medication cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_medication(&form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingMedication(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_entering_sig(&mut self, code: KeyCode, mut form: SigForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Prescription cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((dose, frequency, days)) => {
                    let order = MedicationOrder {
                        medication: form.medication.clone(),
                        dose,
                        frequency,
                        days,
                    };
                    let line = order.render();
                    self.chart.append_to(SectionId::Plan, &line);
                    self.focused = SectionId::Plan;
                    self.screen = Screen::Chart;
                    self.set_status(format!("Added to Plan: {line}"), StatusKind::Info);
                    keep_open = false;
                }
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::EnteringSig(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_saving_template(&mut self, code: KeyCode, mut form: TemplateSaveForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Save template cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_note_as_template(&form) {
                Ok(_) => keep_open = false,
                Err(err) => self.report_form_error(&mut form.error, err),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::SavingTemplate(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_pick_report(&mut self, code: KeyCode, mut selected: usize) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Up => {
                selected = selected.saturating_sub(1);
                Mode::PickingReport { selected }
            }
            KeyCode::Down => {
                if selected + 1 < ReportKind::ALL.len() {
                    selected += 1;
                }
                Mode::PickingReport { selected }
            }
            KeyCode::Enter => {
                let kind = ReportKind::ALL[selected.min(ReportKind::ALL.len() - 1)];
                Mode::FillingReport(ReportForm::new(kind))
            }
            _ => Mode::PickingReport { selected },
        }
    }

    fn handle_filling_report(&mut self, code: KeyCode, mut form: ReportForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Report cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => {
                form.cycle(-1);
            }
            KeyCode::Right => {
                form.cycle(1);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.kind.build(&form.values) {
                Ok(block) => {
                    let target = form.kind.target();
                    self.chart.append_to(target, &block);
                    self.focused = target;
                    self.screen = Screen::Chart;
                    self.set_status(
                        format!("{} added to {}.", form.kind.title(), target.title()),
                        StatusKind::Info,
                    );
                    keep_open = false;
                }
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(' ') => {
                if !form.cycle(1) && form.push_char(' ') {
                    form.error = None;
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::FillingReport(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match state.target {
            SearchTarget::Abbreviations => {
                let screen = match &mut self.screen {
                    Screen::Abbreviations(s) => s,
                    _ => return Ok(Mode::Normal),
                };

                match code {
                    KeyCode::Esc => {
                        screen.set_filter(None);
                        return Ok(Mode::Normal);
                    }
                    KeyCode::Enter => {
                        return Ok(Mode::Normal);
                    }
                    KeyCode::Up => {
                        screen.move_selection(-1);
                        return Ok(Mode::Searching(state));
                    }
                    KeyCode::Down => {
                        screen.move_selection(1);
                        return Ok(Mode::Searching(state));
                    }
                    KeyCode::Backspace => {
                        state.query.pop();
                    }
                    KeyCode::Char(ch) if !ch.is_control() => {
                        state.query.push(ch);
                    }
                    _ => {}
                }

                if state.query.trim().is_empty() {
                    screen.set_filter(None);
                } else {
                    screen.set_filter(Some(state.query.clone()));
                }

                Ok(Mode::Searching(state))
            }
            SearchTarget::Medications => {
                if !matches!(self.screen, Screen::Medications(_)) {
                    return Ok(Mode::Normal);
                }

                match code {
                    KeyCode::Esc => return Ok(Mode::Normal),
                    KeyCode::Enter => {
                        if let Screen::Medications(ref screen) = self.screen {
                            if let Some(hit) = screen.current_hit().cloned() {
                                return Ok(Mode::EnteringSig(SigForm::for_medication(hit)));
                            }
                        }
                        return Ok(Mode::Searching(state));
                    }
                    KeyCode::Up => {
                        if let Screen::Medications(ref mut screen) = self.screen {
                            screen.move_selection(-1);
                        }
                        return Ok(Mode::Searching(state));
                    }
                    KeyCode::Down => {
                        if let Screen::Medications(ref mut screen) = self.screen {
                            screen.move_selection(1);
                        }
                        return Ok(Mode::Searching(state));
                    }
                    KeyCode::Backspace => {
                        state.query.pop();
                    }
                    KeyCode::Char(ch) if !ch.is_control() => {
                        state.query.push(ch);
                    }
                    _ => return Ok(Mode::Searching(state)),
                }

                let seq = self.submit_medication_search(&state.query)?;
                if let Screen::Medications(ref mut screen) = self.screen {
                    screen.query = state.query.clone();
                    screen.awaiting = Some(seq);
                }

                Ok(Mode::Searching(state))
            }
        }
    }

    fn handle_confirm_entry_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmEntryDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_entry_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        self.report_error(err);
                        Ok(Mode::ConfirmEntryDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmEntryDelete(confirm)),
        }
    }

    fn handle_confirm_clear_chart(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Clear cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.chart.clear_all();
                self.focused = SectionId::ChiefComplaint;
                self.set_status("Note cleared.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmClearChart,
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        // Degenerate terminals get the content full-screen and no footer.
        let (content_area, footer_area) = if area.height > footer_height {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (rows[0], rows[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Chart => self.draw_chart(frame, content_area),
            Screen::Abbreviations(screen) => self.draw_abbreviations(frame, content_area, screen),
            Screen::Templates(screen) => self.draw_templates(frame, content_area, screen),
            Screen::Problems(screen) => self.draw_problems(frame, content_area, screen),
            Screen::Medications(screen) => self.draw_medications(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingAbbrev(form) => {
                self.draw_abbrev_form(frame, area, "Add Abbreviation", form)
            }
            Mode::EditingAbbrev { form, .. } => {
                self.draw_abbrev_form(frame, area, "Edit Abbreviation", form)
            }
            Mode::AddingProblem(form) => self.draw_problem_form(frame, area, "Add Problem", form),
            Mode::EditingProblem { form, .. } => {
                self.draw_problem_form(frame, area, "Edit Problem", form)
            }
            Mode::PickingCode(picker) => self.draw_code_picker(frame, area, picker),
            Mode::AddingMedication(form) => self.draw_medication_form(frame, area, form),
            Mode::EnteringSig(form) => self.draw_sig_form(frame, area, form),
            Mode::SavingTemplate(form) => self.draw_template_save(frame, area, form),
            Mode::PickingReport { selected } => self.draw_report_picker(frame, area, *selected),
            Mode::FillingReport(form) => self.draw_report_form(frame, area, form),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::ConfirmEntryDelete(confirm) => self.draw_confirm_entry(frame, area, confirm),
            Mode::ConfirmClearChart => self.draw_confirm_clear(frame, area),
            Mode::Normal | Mode::EditingSection => {}
        }
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SECTION_LIST_WIDTH), Constraint::Min(1)])
            .split(area);

        self.draw_section_list(frame, chunks[0]);
        self.draw_section_editor(frame, chunks[1]);
    }

    fn draw_section_list(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = SectionId::ALL
            .iter()
            .map(|section| {
                let key = match section.index() {
                    9 => 0,
                    idx => idx + 1,
                };
                let marker = if self.chart.section(*section).is_empty() {
                    ' '
                } else {
                    '•'
                };
                ListItem::new(format!("{key} {marker} {}", section.title()))
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).title("Sections");
        render_selectable(frame, area, block, items, self.focused.index());
    }

    fn draw_section_editor(&self, frame: &mut Frame, area: Rect) {
        let buffer = self.chart.section(self.focused);
        let editing = matches!(self.mode, Mode::EditingSection);

        let title = if editing {
            format!("{} [editing]", self.focused.title())
        } else {
            self.focused.title().to_string()
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);

        let (caret_line, caret_col) = buffer.caret_line_col();
        let total_lines = buffer.text().lines().count().max(caret_line + 1);
        let scroll = editor::scroll_offset(caret_line, inner.height as usize, total_lines);

        if buffer.is_empty() && !editing {
            let placeholder = Paragraph::new(Line::from(Span::styled(
                "Press Enter or 'e' to write.",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let paragraph = Paragraph::new(buffer.text().to_string())
            .block(block)
            .scroll((scroll as u16, 0));
        frame.render_widget(paragraph, area);

        if editing && inner.width > 0 && inner.height > 0 {
            let x = inner.x + (caret_col as u16).min(inner.width.saturating_sub(1));
            let y = inner.y + caret_line.saturating_sub(scroll) as u16;
            frame.set_cursor_position((x, y));
        }
    }

    fn draw_abbreviations(&self, frame: &mut Frame, area: Rect, screen: &AbbrevScreen) {
        let title = match &screen.filter {
            Some(q) if !q.trim().is_empty() => format!("Abbreviations (filter: {q})"),
            _ => "Abbreviations".to_string(),
        };

        if screen.entries.is_empty() {
            let message = Paragraph::new("No abbreviations yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        if screen.filtered_entries.is_empty() {
            let message = Paragraph::new("No abbreviations match the current search.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .filtered_entries
            .iter()
            .map(|entry| ListItem::new(entry.display_line()))
            .collect();

        let block = Block::default().borders(Borders::ALL).title(title);
        render_selectable(frame, area, block, items, screen.selected);
    }

    fn draw_templates(&self, frame: &mut Frame, area: Rect, screen: &TemplateScreen) {
        if screen.templates.is_empty() {
            let message =
                Paragraph::new("No templates yet. Press 'n' to save the current note as one.")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Templates"));
            frame.render_widget(message, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let items: Vec<ListItem> = screen
            .templates
            .iter()
            .map(|template| ListItem::new(template.name.clone()))
            .collect();

        let block = Block::default().borders(Borders::ALL).title("Templates");
        render_selectable(frame, chunks[0], block, items, screen.selected);

        let preview = screen
            .current_template()
            .map(|template| template.content.clone())
            .unwrap_or_default();
        let paragraph = Paragraph::new(preview)
            .block(Block::default().borders(Borders::ALL).title("Preview"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, chunks[1]);
    }

    fn draw_problems(&self, frame: &mut Frame, area: Rect, screen: &ProblemScreen) {
        if screen.problems.is_empty() {
            let message =
                Paragraph::new("No problems yet. Press '+' to add one or 'c' to search codes.")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title("Problem List"));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .problems
            .iter()
            .map(|problem| ListItem::new(problem.assessment_line()))
            .collect();

        let block = Block::default().borders(Borders::ALL).title("Problem List");
        render_selectable(frame, area, block, items, screen.selected);
    }

    fn draw_medications(&self, frame: &mut Frame, area: Rect, screen: &MedicationScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let query_bar = Paragraph::new(Span::raw(format!("Search: {}", screen.query)))
            .block(Block::default().borders(Borders::ALL).title("Medications"));
        frame.render_widget(query_bar, chunks[0]);

        if screen.hits.is_empty() {
            let text = if screen.awaiting.is_some() {
                "Searching..."
            } else if screen.query.trim().is_empty() {
                "Press 'f' and type to search the catalog."
            } else {
                "No medications match."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = screen
            .hits
            .iter()
            .map(|hit| ListItem::new(hit.display_name()))
            .collect();

        let block = Block::default().borders(Borders::ALL);
        render_selectable(frame, chunks[1], block, items, screen.selected);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let status_line = match &self.status {
            Some(status) => Line::from(Span::styled(status.text.clone(), status.kind.style())),
            None => Line::from(""),
        };
        let footer = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let bar = Rect {
            height: 3u16.min(area.height),
            ..area
        };
        frame.render_widget(Clear, bar);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let inner = block.inner(bar);
        let text = format!("Search: {}", state.query);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            bar,
        );

        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::EditingSection) => hint_line(&[
                ("[Esc]", "Done"),
                ("[Tab]", "Next Section"),
                ("[:short + Space]", "Expand"),
            ]),
            (_, Mode::PickingCode(_)) => hint_line(&[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Use Code"),
                ("[Esc]", "Cancel"),
            ]),
            (_, Mode::PickingReport { .. }) => hint_line(&[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Fill In"),
                ("[Esc]", "Cancel"),
            ]),
            (_, Mode::FillingReport(_)) => hint_line(&[
                ("[Tab]", "Next Field"),
                ("[←→]", "Choose"),
                ("[Enter]", "Insert"),
                ("[Esc]", "Cancel"),
            ]),
            (_, Mode::Searching(state)) => match state.target {
                SearchTarget::Abbreviations => hint_line(&[
                    ("[↑↓]", "Select"),
                    ("[Enter]", "Keep Filter"),
                    ("[Esc]", "Clear"),
                ]),
                SearchTarget::Medications => hint_line(&[
                    ("[↑↓]", "Select"),
                    ("[Enter]", "Prescribe"),
                    ("[Esc]", "Done"),
                ]),
            },
            (Screen::Abbreviations(_), _) => hint_line(&[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ]),
            (Screen::Templates(_), _) => hint_line(&[
                ("[↑↓]", "Select"),
                ("[Enter]", "Merge"),
                ("[n]", "Save Note"),
                ("[u]", "Refresh"),
                ("[-]", "Delete"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ]),
            (Screen::Problems(_), _) => hint_line(&[
                ("[↑↓]", "Select"),
                ("[Enter]", "To Assessment"),
                ("[+]", "Add"),
                ("[c]", "Codes"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ]),
            (Screen::Medications(_), _) => hint_line(&[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[Enter]", "Prescribe"),
                ("[+]", "Add"),
                ("[-]", "Delete"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ]),
            _ => hint_line(&[
                ("[↑↓]", "Section"),
                ("[1-0]", "Jump"),
                ("[Enter]", "Edit"),
                ("[a]", "Abbreviations"),
                ("[t]", "Templates"),
                ("[p]", "Problems"),
                ("[m]", "Medications"),
                ("[r]", "Reports"),
                ("[x]", "Export"),
                ("[o]", "Open Export"),
                ("[D]", "Clear"),
                ("[q]", "Quit"),
            ]),
        }
    }

    fn draw_abbrev_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &AbbrevForm) {
        let inner = popup_inner(frame, area, 60, 40, title);

        let lines = vec![
            form.build_line("Short", AbbrevField::Short),
            form.build_line("Expansion", AbbrevField::Expansion),
            Line::from(""),
            form_status_line(
                form.error.as_ref(),
                "Enter to save • Tab to switch • Esc to cancel",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (cursor_x, cursor_y) = match form.active {
            AbbrevField::Short => {
                let prefix = "Short: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AbbrevField::Short) as u16,
                    inner.y,
                )
            }
            AbbrevField::Expansion => {
                let prefix = "Expansion: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AbbrevField::Expansion) as u16,
                    inner.y + 1,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_problem_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ProblemForm) {
        let inner = popup_inner(frame, area, 60, 40, title);

        let lines = vec![
            form.build_line("Label", ProblemField::Label),
            form.build_line("Code", ProblemField::Code),
            Line::from(""),
            form_status_line(
                form.error.as_ref(),
                "Enter to save • Tab to switch • Esc to cancel",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (cursor_x, cursor_y) = match form.active {
            ProblemField::Label => {
                let prefix = "Label: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(ProblemField::Label) as u16,
                    inner.y,
                )
            }
            ProblemField::Code => {
                let prefix = "Code: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(ProblemField::Code) as u16,
                    inner.y + 1,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_code_picker(&self, frame: &mut Frame, area: Rect, picker: &CodePicker) {
        let inner = popup_inner(frame, area, 70, 60, "Disease Codes");

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let query_line = Paragraph::new(Span::raw(format!("Search: {}", picker.query)));
        frame.render_widget(query_line, chunks[0]);

        if picker.hits.is_empty() {
            let text = if picker.awaiting.is_some() {
                "Searching..."
            } else {
                "No codes match."
            };
            let message = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)));
            frame.render_widget(message, chunks[1]);
        } else {
            let items: Vec<ListItem> = picker
                .hits
                .iter()
                .map(|hit| ListItem::new(hit.display_line()))
                .collect();
            let block = Block::default().borders(Borders::NONE);
            render_selectable(frame, chunks[1], block, items, picker.selected);
        }

        let cursor_x = chunks[0].x + "Search: ".len() as u16 + picker.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, chunks[0].y));
    }

    fn draw_medication_form(&self, frame: &mut Frame, area: Rect, form: &MedicationForm) {
        let inner = popup_inner(frame, area, 60, 40, "Add Medication");

        let lines = vec![
            form.build_line("Name", MedicationField::Name),
            form.build_line("Strength", MedicationField::Strength),
            form.build_line("Route", MedicationField::Route),
            Line::from(""),
            form_status_line(
                form.error.as_ref(),
                "Enter to save • Tab to switch • Esc to cancel",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (cursor_x, cursor_y) = match form.active {
            MedicationField::Name => {
                let prefix = "Name: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(MedicationField::Name) as u16,
                    inner.y,
                )
            }
            MedicationField::Strength => {
                let prefix = "Strength: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(MedicationField::Strength) as u16,
                    inner.y + 1,
                )
            }
            MedicationField::Route => {
                let prefix = "Route: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(MedicationField::Route) as u16,
                    inner.y + 2,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_sig_form(&self, frame: &mut Frame, area: Rect, form: &SigForm) {
        let inner = popup_inner(frame, area, 60, 45, "Prescribe");

        let lines = vec![
            Line::from(Span::styled(
                form.medication.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            form.build_line("Dose", SigField::Dose),
            form.build_line("Frequency", SigField::Frequency),
            form.build_line("Days", SigField::Days),
            Line::from(""),
            form_status_line(
                form.error.as_ref(),
                "Enter to add to Plan • Tab to switch • Esc to cancel",
            ),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (cursor_x, cursor_y) = match form.active {
            SigField::Dose => {
                let prefix = "Dose: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(SigField::Dose) as u16,
                    inner.y + 2,
                )
            }
            SigField::Frequency => {
                let prefix = "Frequency: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(SigField::Frequency) as u16,
                    inner.y + 3,
                )
            }
            SigField::Days => {
                let prefix = "Days: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(SigField::Days) as u16,
                    inner.y + 4,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_template_save(&self, frame: &mut Frame, area: Rect, form: &TemplateSaveForm) {
        let inner = popup_inner(frame, area, 60, 30, "Save Note as Template");

        let lines = vec![
            form.build_line(),
            Line::from(""),
            form_status_line(form.error.as_ref(), "Enter to save • Esc to cancel"),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let cursor_x = inner.x + "Name: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_report_picker(&self, frame: &mut Frame, area: Rect, selected: usize) {
        let inner = popup_inner(frame, area, 50, 50, "Reports");

        let items: Vec<ListItem> = ReportKind::ALL
            .iter()
            .map(|kind| ListItem::new(kind.title()))
            .collect();
        let block = Block::default().borders(Borders::NONE);
        render_selectable(
            frame,
            inner,
            block,
            items,
            selected.min(ReportKind::ALL.len() - 1),
        );
    }

    fn draw_report_form(&self, frame: &mut Frame, area: Rect, form: &ReportForm) {
        let inner = popup_inner(frame, area, 70, 60, form.kind.title());

        let mut lines: Vec<Line> = (0..form.values.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_status_line(
            form.error.as_ref(),
            "Enter to insert • Tab to move • ←/→ to choose • Esc to cancel",
        ));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if let Some((x, y)) = form.cursor() {
            frame.set_cursor_position((inner.x + x, inner.y + y));
        }
    }

    fn draw_confirm_entry(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmEntryDelete) {
        let inner = popup_inner(frame, area, 60, 30, "Confirm Deletion");

        let lines = vec![
            Line::from(format!(
                "Delete {} '{}'?",
                confirm.kind.noun(),
                confirm.label
            )),
            Line::from("Note text already inserted is not affected."),
            Line::from(""),
            form_status_line(None, "Press Y to confirm or N / Esc to cancel."),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_confirm_clear(&self, frame: &mut Frame, area: Rect) {
        let inner = popup_inner(frame, area, 60, 30, "Clear All Sections");

        let lines = vec![
            Line::from("Clear every section of the note?"),
            Line::from("This cannot be undone."),
            Line::from(""),
            form_status_line(None, "Press Y to confirm or N / Esc to cancel."),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    /// Put the failure message on the form and echo it in the footer.
    fn report_form_error(&mut self, form_error: &mut Option<String>, err: Error) {
        let message = surface_error(&err);
        *form_error = Some(message.clone());
        self.set_status(message, StatusKind::Error);
    }

    fn report_error(&mut self, err: Error) {
        self.set_status(surface_error(&err), StatusKind::Error);
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn merge_template(&mut self, name: &str, content: &str) {
        let outcome = merge_into_chart(&mut self.chart, self.focused, content, &self.book);
        let message = match outcome {
            MergeOutcome::InsertedAtFocus => {
                format!("Inserted '{name}' into {}.", self.focused.title())
            }
            MergeOutcome::Merged {
                sections,
                leading_insert,
            } => {
                let plural = if sections == 1 { "" } else { "s" };
                if leading_insert {
                    format!(
                        "Merged '{name}' into {sections} section{plural}; leading text went to {}.",
                        self.focused.title()
                    )
                } else {
                    format!("Merged '{name}' into {sections} section{plural}.")
                }
            }
        };
        self.screen = Screen::Chart;
        self.set_status(message, StatusKind::Info);
    }

    fn refresh_template(&mut self, id: i64, name: &str) -> Result<()> {
        if self.chart.is_all_empty() {
            self.set_status("Nothing in the note to save.", StatusKind::Error);
            return Ok(());
        }
        let blob = self.chart.render_blob();
        match update_template(&self.conn, id, name, &blob) {
            Ok(_) => {
                self.reload_templates()?;
                self.set_status(format!("Template '{name}' refreshed."), StatusKind::Info);
            }
            Err(err) => self.report_error(err),
        }
        Ok(())
    }

    fn save_new_abbreviation(&mut self, form: &AbbrevForm) -> Result<()> {
        let (short, expansion) = form.parse_inputs()?;
        let entry = create_abbreviation(&self.conn, &short, &expansion)?;
        self.reload_abbreviations()?;
        self.set_status(
            format!("Added abbreviation '{}'.", entry.short),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_existing_abbreviation(&mut self, id: i64, form: &AbbrevForm) -> Result<()> {
        let (short, expansion) = form.parse_inputs()?;
        update_abbreviation(&self.conn, id, &short, &expansion)?;
        self.reload_abbreviations()?;
        self.set_status(format!("Updated abbreviation '{short}'."), StatusKind::Info);
        Ok(())
    }

    fn save_new_problem(&mut self, form: &ProblemForm) -> Result<()> {
        let (code, label) = form.parse_inputs()?;
        let problem = create_problem(&self.conn, code.as_deref(), &label)?;
        self.reload_problems()?;
        self.set_status(
            format!("Added '{}' to the problem list.", problem.label),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_new_medication(&mut self, form: &MedicationForm) -> Result<()> {
        let (name, strength, route) = form.parse_inputs()?;
        let medication = create_medication(&self.conn, &name, &strength, &route)?;

        // Re-run the current search so the new row shows up without retyping.
        let query = match &self.screen {
            Screen::Medications(screen) => Some(screen.query.clone()),
            _ => None,
        };
        if let Some(query) = query {
            let seq = self.submit_medication_search(&query)?;
            if let Screen::Medications(ref mut screen) = self.screen {
                screen.awaiting = Some(seq);
            }
        }

        self.set_status(
            format!("Added {} to the catalog.", medication.display_name()),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_note_as_template(&mut self, form: &TemplateSaveForm) -> Result<()> {
        let name = form.parse_inputs()?;
        let blob = self.chart.render_blob();
        let template = create_template(&self.conn, &name, &blob)?;
        self.reload_templates()?;
        self.set_status(
            format!("Saved template '{}'.", template.name),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_entry_delete(&mut self, confirm: &ConfirmEntryDelete) -> Result<()> {
        match confirm.kind {
            EntryKind::Abbreviation => {
                delete_abbreviation(&self.conn, confirm.id)?;
                self.reload_abbreviations()?;
            }
            EntryKind::Template => {
                delete_template(&self.conn, confirm.id)?;
                self.reload_templates()?;
            }
            EntryKind::Problem => {
                delete_problem(&self.conn, confirm.id)?;
                self.reload_problems()?;
            }
            EntryKind::Medication => {
                delete_medication(&self.conn, confirm.id)?;
                if let Screen::Medications(ref mut screen) = self.screen {
                    screen.remove_hit(confirm.id);
                }
            }
        }
        self.set_status(
            format!("Deleted {} '{}'.", confirm.kind.noun(), confirm.label),
            StatusKind::Info,
        );
        Ok(())
    }

    fn export_note(&mut self) -> Result<()> {
        if self.chart.is_all_empty() {
            self.set_status("Nothing to export.", StatusKind::Error);
            return Ok(());
        }

        let dir = export_dir()?;
        let file_name = format!("note-{}.txt", Local::now().format("%Y%m%d-%H%M%S"));
        let path = dir.join(file_name);

        let mut blob = self.chart.render_blob();
        blob.push('\n');
        fs::write(&path, blob)
            .with_context(|| format!("failed to write {}", path.display()))?;

        self.set_status(
            format!("Exported note to {}.", path.display()),
            StatusKind::Info,
        );
        self.last_export = Some(path);
        Ok(())
    }

    fn open_last_export(&mut self) {
        match &self.last_export {
            Some(path) => match open_path(path) {
                Ok(_) => {
                    let message = format!("Opened {}.", path.display());
                    self.set_status(message, StatusKind::Info);
                }
                Err(err) => {
                    self.set_status(format!("Failed to open export: {err}"), StatusKind::Error);
                }
            },
            None => self.set_status("No export yet. Press 'x' first.", StatusKind::Error),
        }
    }

    fn open_abbreviations(&mut self) -> Result<()> {
        let entries = fetch_abbreviations(&self.conn)?;
        self.book = AbbrevBook::from_entries(&entries);
        self.screen = Screen::Abbreviations(AbbrevScreen::new(entries));
        Ok(())
    }

    fn open_templates(&mut self) -> Result<()> {
        let templates = fetch_templates(&self.conn)?;
        self.screen = Screen::Templates(TemplateScreen::new(templates));
        Ok(())
    }

    fn open_problems(&mut self) -> Result<()> {
        let problems = fetch_problems(&self.conn)?;
        self.screen = Screen::Problems(ProblemScreen::new(problems));
        Ok(())
    }

    fn open_medications(&mut self) -> Result<()> {
        // An empty query browses the top of the catalog right away.
        let seq = self.submit_medication_search("")?;
        let mut screen = MedicationScreen::new();
        screen.awaiting = Some(seq);
        self.screen = Screen::Medications(screen);
        Ok(())
    }

    fn reload_abbreviations(&mut self) -> Result<()> {
        let entries = fetch_abbreviations(&self.conn)?;
        self.book = AbbrevBook::from_entries(&entries);
        if let Screen::Abbreviations(ref mut screen) = self.screen {
            screen.set_entries(entries);
        }
        Ok(())
    }

    fn reload_templates(&mut self) -> Result<()> {
        if let Screen::Templates(ref mut screen) = self.screen {
            let templates = fetch_templates(&self.conn)?;
            screen.set_templates(templates);
        }
        Ok(())
    }

    fn reload_problems(&mut self) -> Result<()> {
        if let Screen::Problems(ref mut screen) = self.screen {
            let problems = fetch_problems(&self.conn)?;
            screen.set_problems(problems);
        }
        Ok(())
    }

    fn submit_code_search(&mut self, query: &str) -> Result<u64> {
        self.search_seq += 1;
        let seq = self.search_seq;
        self.search.submit(SearchRequest {
            seq,
            scope: SearchScope::DiseaseCodes,
            query: query.to_string(),
        })?;
        Ok(seq)
    }

    fn submit_medication_search(&mut self, query: &str) -> Result<u64> {
        self.search_seq += 1;
        let seq = self.search_seq;
        self.search.submit(SearchRequest {
            seq,
            scope: SearchScope::Medications,
            query: query.to_string(),
        })?;
        Ok(seq)
    }
}
