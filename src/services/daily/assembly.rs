//! Turns persisted rows and corpus translations into a [`DailySelection`].
//!
//! Translations are deduplicated in two passes:
//!
//! 1. By normalized full text and category, so `"跑，奔跑"` and `"跑, 奔跑 "`
//!    count as the same translation.
//! 2. By short form and category, so `"跑, 奔跑"` and `"跑 "` collapse to a
//!    single `"跑"` entry.
//!
//! The short form keeps only the first delimited sense; later senses are
//! dropped from the displayed entry.

use std::collections::{HashMap, HashSet};

use crate::models::{
    CalendarDate, CorpusItem, DailyItem, DailySelection, SelectionRow, Translation,
    TranslationEntry,
};

/// Characters separating alternate senses in a translation text.
pub const SENSE_DELIMITERS: [char; 4] = [',', ';', '，', '；'];

/// Normalizes translation text for duplicate detection.
///
/// Trims the ends, drops whitespace after a sense delimiter and collapses
/// any other whitespace run to a single space.
#[must_use]
pub fn normalize_translation(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            pending_space = !normalized.ends_with(SENSE_DELIMITERS);
            continue;
        }
        if pending_space {
            normalized.push(' ');
        }
        pending_space = false;
        normalized.push(c);
    }
    normalized
}

/// Returns the first sense of a translation text, trimmed.
#[must_use]
pub fn short_form(text: &str) -> &str {
    text.split(SENSE_DELIMITERS).next().unwrap_or_default().trim()
}

/// Deduplicates translations into short-form entries, keeping first
/// occurrences in order. Entries with an empty short form are skipped.
#[must_use]
pub fn dedup_translations<'a>(
    translations: impl IntoIterator<Item = &'a Translation>,
) -> Vec<TranslationEntry> {
    let mut seen_full = HashSet::new();
    let mut seen_short = HashSet::new();
    let mut entries = Vec::new();

    for translation in translations {
        let full_key = (
            normalize_translation(&translation.text),
            translation.category.trim(),
        );
        if !seen_full.insert(full_key) {
            continue;
        }

        let short = short_form(&translation.text);
        if short.is_empty() {
            continue;
        }
        if seen_short.insert((short, translation.category.trim())) {
            entries.push(TranslationEntry {
                text: short.to_string(),
                category: translation.category.trim().to_string(),
            });
        }
    }
    entries
}

/// Returns the distinct keys of `rows` in first-appearance order.
#[must_use]
pub fn distinct_keys(rows: &[SelectionRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.key.as_str()))
        .map(|row| row.key.clone())
        .collect()
}

/// Builds the selection for `date` from its persisted rows.
///
/// Each key shows every translation the corpus knows for it. A key the
/// corpus no longer contains falls back to the translations recorded in its
/// own rows.
#[must_use]
pub fn assemble(date: CalendarDate, rows: &[SelectionRow], corpus: &[CorpusItem]) -> DailySelection {
    let by_key: HashMap<&str, &CorpusItem> =
        corpus.iter().map(|item| (item.key.as_str(), item)).collect();

    let items = distinct_keys(rows)
        .into_iter()
        .map(|key| {
            let translations = if let Some(item) = by_key.get(key.as_str()) {
                dedup_translations(&item.translations)
            } else {
                let recorded: Vec<Translation> = rows
                    .iter()
                    .filter(|row| row.key == key)
                    .map(|row| Translation::new(row.translation.as_str(), row.category.as_str()))
                    .collect();
                dedup_translations(&recorded)
            };
            DailyItem { key, translations }
        })
        .collect();

    DailySelection { date, items }
}
