//! Note model split across logical submodules. Everything here is plain data
//! and pure functions, testable without a terminal or a database.

mod abbrev;
mod chart;
mod section;
mod template;

pub use abbrev::{AbbrevBook, DATE_KEY, SIGIL};
pub use chart::NoteChart;
pub use section::{SectionBuffer, SectionId};
pub use template::{merge_into_chart, MergeOutcome};
