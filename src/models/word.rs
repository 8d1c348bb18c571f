//! Corpus words and daily selections.

use super::CalendarDate;
use serde::{Deserialize, Serialize};

/// One translation of a corpus word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Translation {
    /// Display text, possibly listing several senses (`"跑, 奔跑"`).
    pub text: String,
    /// Grammatical category tag (`"v"`, `"n"`, ...).
    pub category: String,
}

impl Translation {
    /// Creates a translation.
    #[must_use]
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }
}

/// A word in the read-only corpus with all of its known translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusItem {
    /// The word itself.
    pub key: String,
    /// Translations in corpus order.
    pub translations: Vec<Translation>,
}

impl CorpusItem {
    /// Creates a corpus item.
    #[must_use]
    pub fn new(key: impl Into<String>, translations: Vec<Translation>) -> Self {
        Self {
            key: key.into(),
            translations,
        }
    }
}

/// A raw persisted row of a daily selection.
///
/// Stores hold one row per chosen word. Racing writers may leave duplicate
/// rows for the same date; readers deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRow {
    /// The chosen word.
    pub key: String,
    /// Translation text recorded when the word was chosen.
    pub translation: String,
    /// Category tag recorded when the word was chosen.
    pub category: String,
    /// The date this row belongs to.
    pub date: CalendarDate,
}

/// A short-form translation shown for a daily word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationEntry {
    /// First sense of the translation text.
    pub text: String,
    /// Grammatical category tag.
    pub category: String,
}

/// One word of a daily selection with its deduplicated translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyItem {
    /// The word.
    pub key: String,
    /// Deduplicated short-form translations.
    pub translations: Vec<TranslationEntry>,
}

impl DailyItem {
    /// Returns the first translation, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&TranslationEntry> {
        self.translations.first()
    }
}

/// The words chosen for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySelection {
    /// The date this selection belongs to.
    pub date: CalendarDate,
    /// Selected words in selection order.
    pub items: Vec<DailyItem>,
}

impl DailySelection {
    /// Creates an empty selection for a date.
    #[must_use]
    pub const fn empty(date: CalendarDate) -> Self {
        Self {
            date,
            items: Vec::new(),
        }
    }

    /// Returns the number of selected words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no words were selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the selected words in order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }

    /// Finds a selected word by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DailyItem> {
        self.items.iter().find(|item| item.key == key)
    }
}
