use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

/// Rectangle centered inside `area` covering the given percentage of each
/// dimension. Every modal dialog draws inside one of these.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let side_x = (100 - percent_x) / 2;
    let side_y = (100 - percent_y) / 2;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(side_x),
            Constraint::Percentage(percent_x),
            Constraint::Percentage(side_x),
        ])
        .split(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(side_y),
            Constraint::Percentage(percent_y),
            Constraint::Percentage(side_y),
        ])
        .split(columns[1]);
    rows[1]
}

/// Innermost message of an error chain, the part shown in one-line status
/// fields.
pub(crate) fn surface_error(err: &Error) -> String {
    match err.chain().last() {
        Some(cause) => cause.to_string(),
        None => err.to_string(),
    }
}

/// Build a footer hint line from `[key]`/action pairs, all styled the same
/// way so every screen's hints look alike.
pub(crate) fn hint_line(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (idx, (key, action)) in pairs.iter().enumerate() {
        spans.push(Span::styled(*key, key_style));
        let separator = if idx + 1 == pairs.len() { " " } else { "   " };
        spans.push(Span::raw(format!(" {action}{separator}")));
    }
    Line::from(spans)
}

/// Clear a centered popup, draw its titled border, and hand back the inner
/// drawing region.
pub(crate) fn popup_inner(
    frame: &mut Frame,
    area: Rect,
    percent_x: u16,
    percent_y: u16,
    title: &str,
) -> Rect {
    let popup_area = centered_rect(percent_x, percent_y, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default().title(title.to_owned()).borders(Borders::ALL);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    inner
}

/// Red error text when the form has one, otherwise a gray key hint. Every
/// modal form ends with one of these lines.
pub(crate) fn form_status_line(error: Option<&String>, hint: &'static str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}

/// Render `items` as a stateful list with the selection style used
/// throughout the app, a yellow arrow on the highlighted row.
pub(crate) fn render_selectable(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    items: Vec<ListItem>,
    selected: usize,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}
