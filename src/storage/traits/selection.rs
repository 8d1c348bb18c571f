//! Daily selection store trait.

use crate::Result;
use crate::models::{CalendarDate, SelectionRow};

/// Trait for stores of persisted daily selections.
///
/// Stores need no uniqueness constraint. Two processes racing on an empty
/// date may both insert; readers deduplicate, so writes are at-least-once.
pub trait SelectionStore: Send + Sync {
    /// Returns every row stored for a date, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_date(&self, date: &CalendarDate) -> Result<Vec<SelectionRow>>;

    /// Appends rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be written.
    fn insert_rows(&self, rows: &[SelectionRow]) -> Result<()>;
}
