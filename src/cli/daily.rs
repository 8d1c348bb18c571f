//! CLI command for the words of the day.

use crate::config::WordwiseConfig;
use crate::models::{CalendarDate, DailySelection};
use std::io::{self, Write};
use std::str::FromStr;

/// Output format for the daily command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain text (default).
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        })
    }
}

/// Writes a selection as aligned text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_selection_text<W: Write>(writer: &mut W, selection: &DailySelection) -> io::Result<()> {
    writeln!(writer, "Words for {}", selection.date)?;
    if selection.is_empty() {
        writeln!(writer, "(no words; import a corpus first)")?;
        return Ok(());
    }

    let width = selection
        .items
        .iter()
        .map(|item| item.key.chars().count())
        .max()
        .unwrap_or(0);
    for (index, item) in selection.items.iter().enumerate() {
        let meanings = item
            .translations
            .iter()
            .map(|t| {
                if t.category.is_empty() {
                    t.text.clone()
                } else {
                    format!("{}. {}", t.category, t.text)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        writeln!(
            writer,
            "{:>2}. {:<width$}  {meanings}",
            index + 1,
            item.key
        )?;
    }
    Ok(())
}

/// Writes a selection as JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_selection_json<W: Write>(
    writer: &mut W,
    selection: &DailySelection,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(selection)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Executes the daily command.
///
/// # Errors
///
/// Returns an error if the date is invalid, the database cannot be used, or
/// output fails.
pub fn cmd_daily(
    config: &WordwiseConfig,
    date: Option<&str>,
    count: Option<usize>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = super::build_daily_service(config)?;
    if let Some(count) = count {
        if count == 0 {
            return Err(crate::Error::InvalidInput("--count must be positive".to_string()).into());
        }
        service = service.with_word_count(count);
    }

    let date = match date {
        Some(raw) => CalendarDate::parse(raw)?,
        None => service.today_date(),
    };
    let selection = service.selection_for(date)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Text => {
            write_selection_text(&mut handle, &selection)?;
            Ok(())
        },
        OutputFormat::Json => write_selection_json(&mut handle, &selection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyItem, TranslationEntry};

    fn selection() -> DailySelection {
        DailySelection {
            date: CalendarDate::from_ymd(2026, 10, 16).unwrap(),
            items: vec![
                DailyItem {
                    key: "run".to_string(),
                    translations: vec![
                        TranslationEntry {
                            text: "跑".to_string(),
                            category: "v".to_string(),
                        },
                        TranslationEntry {
                            text: "运行".to_string(),
                            category: "n".to_string(),
                        },
                    ],
                },
                DailyItem {
                    key: "apple".to_string(),
                    translations: vec![TranslationEntry {
                        text: "苹果".to_string(),
                        category: String::new(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("other").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_write_selection_text() {
        let mut buffer = Vec::new();
        write_selection_text(&mut buffer, &selection()).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.starts_with("Words for 2026-10-16\n"));
        assert!(output.contains(" 1. run    v. 跑; n. 运行\n"));
        assert!(output.contains(" 2. apple  苹果\n"));
    }

    #[test]
    fn test_write_empty_selection_text() {
        let empty = DailySelection::empty(CalendarDate::from_ymd(2026, 10, 16).unwrap());
        let mut buffer = Vec::new();
        write_selection_text(&mut buffer, &empty).unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("import a corpus"));
    }

    #[test]
    fn test_write_selection_json() {
        let mut buffer = Vec::new();
        write_selection_json(&mut buffer, &selection()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["date"], "2026-10-16");
        assert_eq!(value["items"][0]["key"], "run");
        assert_eq!(value["items"][0]["translations"][1]["text"], "运行");
    }
}
