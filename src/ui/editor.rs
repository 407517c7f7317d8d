//! Keystroke handling and scrolling for the section editor. The buffer holds
//! all the interesting state; this module just maps keys onto it and decides
//! which slice of lines fits the panel.

use crossterm::event::KeyCode;

use crate::note::{AbbrevBook, SectionBuffer};

/// What a keystroke did inside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditorEvent {
    /// An abbreviation was replaced before the delimiter went in.
    Expanded,
    /// The key edited or moved within the buffer.
    Handled,
    /// Not an editor key; the caller decides what it means.
    Ignored,
}

/// Apply one key to the focused buffer. Space and Enter first give the word
/// behind the caret a chance to expand, then insert their delimiter, so an
/// expansion and the keystroke that triggered it land together.
pub(crate) fn apply_key(
    buffer: &mut SectionBuffer,
    book: &AbbrevBook,
    code: KeyCode,
) -> EditorEvent {
    match code {
        KeyCode::Char(ch) if ch == ' ' => {
            let expanded = buffer.expand_abbrev_at_caret(book);
            buffer.insert_char(' ');
            if expanded {
                EditorEvent::Expanded
            } else {
                EditorEvent::Handled
            }
        }
        KeyCode::Char(ch) if !ch.is_control() => {
            buffer.insert_char(ch);
            EditorEvent::Handled
        }
        KeyCode::Enter => {
            let expanded = buffer.expand_abbrev_at_caret(book);
            buffer.insert_char('\n');
            if expanded {
                EditorEvent::Expanded
            } else {
                EditorEvent::Handled
            }
        }
        KeyCode::Backspace => {
            buffer.backspace();
            EditorEvent::Handled
        }
        KeyCode::Delete => {
            buffer.delete_forward();
            EditorEvent::Handled
        }
        KeyCode::Left => {
            buffer.move_left();
            EditorEvent::Handled
        }
        KeyCode::Right => {
            buffer.move_right();
            EditorEvent::Handled
        }
        KeyCode::Up => {
            buffer.move_up();
            EditorEvent::Handled
        }
        KeyCode::Down => {
            buffer.move_down();
            EditorEvent::Handled
        }
        KeyCode::Home => {
            buffer.move_line_start();
            EditorEvent::Handled
        }
        KeyCode::End => {
            buffer.move_line_end();
            EditorEvent::Handled
        }
        _ => EditorEvent::Ignored,
    }
}

/// First visible line for a panel `height` lines tall, keeping the caret's
/// line in view with a little headroom once the text outgrows the panel.
pub(crate) fn scroll_offset(caret_line: usize, height: usize, total_lines: usize) -> usize {
    if height == 0 || total_lines <= height {
        return 0;
    }
    let max_offset = total_lines - height;
    caret_line.saturating_sub(height.saturating_sub(1)).min(max_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::SectionId;

    fn buffer() -> SectionBuffer {
        SectionBuffer::new(SectionId::Subjective)
    }

    fn book_with_bp() -> AbbrevBook {
        let mut book = AbbrevBook::new();
        book.insert("bp", "blood pressure");
        book
    }

    #[test]
    fn space_expands_then_inserts_the_delimiter() {
        let mut buffer = buffer();
        let book = book_with_bp();
        for ch in ":bp".chars() {
            apply_key(&mut buffer, &book, KeyCode::Char(ch));
        }

        let event = apply_key(&mut buffer, &book, KeyCode::Char(' '));
        assert_eq!(event, EditorEvent::Expanded);
        assert_eq!(buffer.text(), "blood pressure ");
    }

    #[test]
    fn enter_expands_and_breaks_the_line() {
        let mut buffer = buffer();
        let book = book_with_bp();
        for ch in ":bp".chars() {
            apply_key(&mut buffer, &book, KeyCode::Char(ch));
        }

        let event = apply_key(&mut buffer, &book, KeyCode::Enter);
        assert_eq!(event, EditorEvent::Expanded);
        assert_eq!(buffer.text(), "blood pressure\n");
    }

    #[test]
    fn unknown_tokens_pass_through_quietly() {
        let mut buffer = buffer();
        let book = book_with_bp();
        for ch in ":xyz".chars() {
            apply_key(&mut buffer, &book, KeyCode::Char(ch));
        }

        let event = apply_key(&mut buffer, &book, KeyCode::Char(' '));
        assert_eq!(event, EditorEvent::Handled);
        assert_eq!(buffer.text(), ":xyz ");
    }

    #[test]
    fn function_keys_are_ignored() {
        let mut buffer = buffer();
        let book = AbbrevBook::new();
        assert_eq!(apply_key(&mut buffer, &book, KeyCode::F(5)), EditorEvent::Ignored);
        assert!(buffer.is_empty());
    }

    #[test]
    fn scrolling_tracks_the_caret_inside_long_text() {
        // Short text never scrolls.
        assert_eq!(scroll_offset(3, 10, 5), 0);
        // Caret at the bottom of a long buffer pins to the end.
        assert_eq!(scroll_offset(19, 10, 20), 10);
        // Mid-text keeps the caret on the last visible row.
        assert_eq!(scroll_offset(12, 10, 20), 3);
    }
}
