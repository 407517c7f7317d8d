use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Put the terminal into raw mode on the alternate screen, then drive the
/// draw/input loop until the user quits.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    event_loop(app, &mut terminal)?;
    restore_terminal(&mut terminal)
}

fn setup_terminal() -> Result<Term> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal backend")
}

/// One pass per tick: collect finished search replies, redraw, then wait up
/// to 250ms for a key. Returns once a key handler asks to exit.
fn event_loop(app: &mut App, terminal: &mut Term) -> Result<()> {
    loop {
        app.poll_background();

        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(Duration::from_millis(250)).context("event polling failed")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("failed to read event")? {
            if key.kind == KeyEventKind::Press && app.handle_key(key.code)? {
                return Ok(());
            }
        }
    }
}

/// Restore the terminal to its original state after the app exits.
fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
