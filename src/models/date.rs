//! Calendar dates and day boundaries.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-8601 calendar date format used for storage keys and seeds.
const ISO_FORMAT: &str = "%Y-%m-%d";

/// Which clock decides when "today" rolls over.
///
/// Every process sharing a selection store must use the same boundary,
/// since the selection seed is derived from the date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// Days roll over at midnight UTC.
    #[default]
    Utc,
    /// Days roll over at midnight in the serving host's local timezone.
    Local,
}

impl DayBoundary {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Utc => "utc",
            Self::Local => "local",
        }
    }

    /// Parses a boundary string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "utc" => Some(Self::Utc),
            "local" => Some(Self::Local),
            _ => None,
        }
    }

    /// Returns today's date on this boundary.
    #[must_use]
    pub fn today(self) -> CalendarDate {
        match self {
            Self::Utc => CalendarDate(Utc::now().date_naive()),
            Self::Local => CalendarDate(Local::now().date_naive()),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A day-granularity calendar date.
///
/// Displays and parses as `YYYY-MM-DD`; that string form is the key under
/// which daily selections are stored and the input of [`CalendarDate::seed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Wraps a `chrono` date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from year, month and day, if valid.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses an ISO `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the string is not a valid date.
    pub fn parse(s: &str) -> crate::Result<Self> {
        NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)
            .map(Self)
            .map_err(|e| crate::Error::InvalidInput(format!("invalid date '{s}': {e}")))
    }

    /// Returns the wrapped `chrono` date.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Returns the following day.
    #[must_use]
    pub fn next_day(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// Returns the ISO `YYYY-MM-DD` form.
    #[must_use]
    pub fn iso(&self) -> String {
        self.0.format(ISO_FORMAT).to_string()
    }

    /// Derives the sampling seed from the ISO string.
    ///
    /// The seed is the decimal digits of the ISO form read as one integer,
    /// so `2026-10-16` seeds `20261016`.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.iso()
            .bytes()
            .filter(u8::is_ascii_digit)
            .fold(0u64, |acc, b| {
                acc.wrapping_mul(10).wrapping_add(u64::from(b - b'0'))
            })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso())
    }
}

impl std::str::FromStr for CalendarDate {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.iso()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}
