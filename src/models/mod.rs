//! Data models for wordwise.
//!
//! This module contains the core data structures shared by storage,
//! services and the CLI.

mod date;
mod story;
mod word;

pub use date::{CalendarDate, DayBoundary};
pub use story::{StoryChapter, WordAssociation};
pub use word::{
    CorpusItem, DailyItem, DailySelection, SelectionRow, Translation, TranslationEntry,
};
