//! Caches for assembled daily selections.
//!
//! A cache holds selections keyed by [`CalendarDate`]. The only invalidation
//! rule is the date itself: asking for a different date is a miss.

use std::sync::Mutex;

use crate::models::{CalendarDate, DailySelection};

/// Cache of assembled daily selections.
///
/// Implementations must be safe to share between threads. A cache must
/// never return a selection for a date other than the one requested.
pub trait SelectionCache: Send + Sync {
    /// Returns the cached selection for `date`, if any.
    fn get(&self, date: &CalendarDate) -> Option<DailySelection>;

    /// Stores a selection under its own date.
    fn put(&self, selection: &DailySelection);
}

/// Holds the selection of a single day.
///
/// Storing a selection for a new date replaces the previous one, so memory
/// stays bounded for a long-running process.
#[derive(Debug, Default)]
pub struct DayCache {
    current: Mutex<Option<DailySelection>>,
}

impl DayCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the date currently cached, if any.
    #[must_use]
    pub fn cached_date(&self) -> Option<CalendarDate> {
        self.current
            .lock()
            .ok()
            .and_then(|current| current.as_ref().map(|s| s.date))
    }
}

impl SelectionCache for DayCache {
    fn get(&self, date: &CalendarDate) -> Option<DailySelection> {
        // Lock failures are treated as misses; the selection is rebuilt from
        // the store.
        let current = self.current.lock().ok()?;
        current.as_ref().filter(|s| s.date == *date).cloned()
    }

    fn put(&self, selection: &DailySelection) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Selection cache mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        };
        *current = Some(selection.clone());
    }
}

/// A cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SelectionCache for NoCache {
    fn get(&self, _date: &CalendarDate) -> Option<DailySelection> {
        None
    }

    fn put(&self, _selection: &DailySelection) {}
}
