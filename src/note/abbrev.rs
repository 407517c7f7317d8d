//! Abbreviation expansion. A book of short→expansion pairs is loaded from the
//! store once and consulted every time the editor sees a word delimiter, so
//! lookups have to be cheap and never touch the database.

use std::collections::BTreeMap;

use chrono::Local;

use crate::models::Abbreviation;

/// Character that marks a word as an abbreviation. `:bp` expands, `bp` does
/// not, which keeps ordinary prose from ever expanding by accident.
pub const SIGIL: char = ':';

/// Reserved key that expands to today's date. Checked before the user's own
/// entries so a stored `date` row can never shadow it.
pub const DATE_KEY: &str = "date";

/// In-memory expansion table. Entries are kept sorted so the abbreviation
/// screen can show them in a stable order without re-sorting.
#[derive(Debug, Default, Clone)]
pub struct AbbrevBook {
    entries: BTreeMap<String, String>,
}

impl AbbrevBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the book from stored rows, typically right after startup or an
    /// edit on the abbreviation screen.
    pub fn from_entries(rows: &[Abbreviation]) -> Self {
        let mut book = Self::new();
        for row in rows {
            book.insert(&row.short, &row.expansion);
        }
        book
    }

    pub fn insert(&mut self, short: &str, expansion: &str) {
        self.entries.insert(short.to_string(), expansion.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a bare key (no sigil). The date key wins over stored entries.
    pub fn lookup(&self, key: &str) -> Option<String> {
        if key == DATE_KEY {
            return Some(Local::now().format("%Y-%m-%d").to_string());
        }
        self.entries.get(key).cloned()
    }

    /// Resolve a full token as typed: sigil prefix plus a non-empty key. A
    /// lone sigil or an unknown key resolves to nothing and the caller leaves
    /// the token as typed.
    pub fn expand_token(&self, token: &str) -> Option<String> {
        let key = token.strip_prefix(SIGIL)?;
        if key.is_empty() {
            return None;
        }
        self.lookup(key)
    }

    /// Expand every whitespace-delimited token in `text` that resolves,
    /// keeping all whitespace exactly as written. Tokens that do not resolve
    /// pass through untouched, so running this twice is harmless.
    pub fn expand_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();

        for ch in text.chars() {
            if ch.is_whitespace() {
                self.flush_word(&mut out, &mut word);
                out.push(ch);
            } else {
                word.push(ch);
            }
        }
        self.flush_word(&mut out, &mut word);
        out
    }

    fn flush_word(&self, out: &mut String, word: &mut String) {
        if word.is_empty() {
            return;
        }
        match self.expand_token(word) {
            Some(expansion) => out.push_str(&expansion),
            None => out.push_str(word),
        }
        word.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> AbbrevBook {
        let mut book = AbbrevBook::new();
        book.insert("htn", "hypertension");
        book.insert("dm", "diabetes mellitus");
        book
    }

    #[test]
    fn tokens_need_the_sigil_and_a_key() {
        let book = sample_book();
        assert_eq!(book.expand_token(":htn").as_deref(), Some("hypertension"));
        assert_eq!(book.expand_token("htn"), None);
        assert_eq!(book.expand_token(":"), None);
        assert_eq!(book.expand_token(":nope"), None);
    }

    #[test]
    fn date_key_beats_stored_entries() {
        let mut book = sample_book();
        book.insert(DATE_KEY, "not a date");

        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(book.expand_token(":date").as_deref(), Some(today.as_str()));
    }

    #[test]
    fn expand_text_preserves_whitespace_and_unknowns() {
        let book = sample_book();
        let input = "hx of :htn and :dm\n  :unknown stays";
        let expanded = book.expand_text(input);
        assert_eq!(
            expanded,
            "hx of hypertension and diabetes mellitus\n  :unknown stays"
        );
    }

    #[test]
    fn expand_text_is_idempotent_on_its_own_output() {
        let book = sample_book();
        let once = book.expand_text(":htn :dm");
        assert_eq!(book.expand_text(&once), once);
    }
}
