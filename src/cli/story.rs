//! CLI command for streamed story chapters.

use crate::config::WordwiseConfig;
use crate::models::StoryChapter;
use crate::services::StoryService;
use std::io::{self, Write};

/// Prints a chapter while it streams.
///
/// The title is printed once it has settled, which is when the model has
/// moved on to the content. Content is printed incrementally as it grows.
#[derive(Debug, Default)]
pub struct ChapterPrinter {
    title_printed: bool,
    content_printed: usize,
}

impl ChapterPrinter {
    /// Creates a printer that has printed nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes whatever part of `partial` has not been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn update<W: Write>(&mut self, writer: &mut W, partial: &StoryChapter) -> io::Result<()> {
        if partial.content.is_empty() {
            return Ok(());
        }
        if !self.title_printed {
            writeln!(writer, "# {}\n", partial.title)?;
            self.title_printed = true;
        }
        // Content only ever grows by appending; anything else is left for
        // the final chapter.
        match partial.content.get(self.content_printed..) {
            Some(fresh) if !fresh.is_empty() => {
                write!(writer, "{fresh}")?;
                self.content_printed = partial.content.len();
                writer.flush()?;
            },
            _ => {},
        }
        Ok(())
    }

    /// Writes the rest of the final chapter and its summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn finish<W: Write>(&mut self, writer: &mut W, chapter: &StoryChapter) -> io::Result<()> {
        if !self.title_printed {
            writeln!(writer, "# {}\n", chapter.title)?;
            self.title_printed = true;
        }
        if let Some(rest) = chapter.content.get(self.content_printed..) {
            write!(writer, "{rest}")?;
        }
        self.content_printed = chapter.content.len();
        writeln!(writer, "\n")?;
        writeln!(writer, "Summary: {}", chapter.summary)
    }
}

/// Executes the story command.
///
/// Uses today's words when `words` is `None`.
///
/// # Errors
///
/// Returns an error if no words are available, the LLM request fails, or
/// output fails.
pub fn cmd_story(
    config: &WordwiseConfig,
    words: Option<&str>,
    previous_summary: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let words: Vec<String> = match words {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => super::build_daily_service(config)?
            .today()?
            .keys()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    };

    let llm = super::build_llm_provider(&config.llm);
    let (corpus, _store) = super::open_stores(config)?;
    let service = StoryService::new(llm).with_corpus(corpus);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut printer = ChapterPrinter::new();
    let mut write_error = None;
    let chapter = service.generate_chapter(&words, previous_summary, |partial| {
        if write_error.is_none() {
            write_error = printer.update(&mut handle, partial).err();
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    printer.finish(&mut handle, &chapter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(title: &str, content: &str, summary: &str) -> StoryChapter {
        StoryChapter {
            title: title.to_string(),
            content: content.to_string(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_printer_waits_for_settled_title() {
        let mut printer = ChapterPrinter::new();
        let mut buffer = Vec::new();

        printer.update(&mut buffer, &chapter("The Re", "", "")).unwrap();
        assert!(buffer.is_empty());

        printer.update(&mut buffer, &chapter("The Red Fox", "A fo", "")).unwrap();
        printer.update(&mut buffer, &chapter("The Red Fox", "A fox ran.", "")).unwrap();
        printer
            .finish(&mut buffer, &chapter("The Red Fox", "A fox ran.", "A fox runs."))
            .unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "# The Red Fox\n\nA fox ran.\n\nSummary: A fox runs.\n"
        );
    }

    #[test]
    fn test_printer_finish_without_updates() {
        let mut printer = ChapterPrinter::new();
        let mut buffer = Vec::new();
        printer
            .finish(&mut buffer, &chapter("Rain", "It rained.", "Wet."))
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "# Rain\n\nIt rained.\n\nSummary: Wet.\n"
        );
    }
}
