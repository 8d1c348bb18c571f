//! Token streams: server-sent events in, partial records out.

use super::partial_json::{RepairedJson, complete_json};
use super::extract_json_from_response;
use crate::{Error, Result};
use std::io::BufRead;

/// A domain record that can be built from a partially repaired object.
///
/// Missing fields become empty strings, so every intermediate value is
/// usable by a UI while the stream is still running.
pub trait PartialRecord: Sized + Clone + PartialEq {
    /// Builds the record from a repaired object.
    fn from_partial(map: &RepairedJson) -> Self;

    /// Returns `true` once every field is non-empty.
    fn is_complete(&self) -> bool;
}

/// Accumulates stream deltas and re-parses the cumulative text.
///
/// Each [`push`](Self::push) runs [`complete_json`] over everything received
/// so far and reports a record only when it differs from the last reported
/// one.
#[derive(Debug, Clone)]
pub struct PartialJsonStream<T> {
    buffer: String,
    latest: Option<T>,
    updates: usize,
}

impl<T: PartialRecord> PartialJsonStream<T> {
    /// Creates an empty stream.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
            latest: None,
            updates: 0,
        }
    }

    /// Appends a delta and returns the new record if it changed.
    pub fn push(&mut self, delta: &str) -> Option<&T> {
        self.buffer.push_str(delta);

        let map = complete_json(self.body()?)?;
        let record = T::from_partial(&map);
        if self.latest.as_ref() == Some(&record) {
            return None;
        }

        self.updates += 1;
        self.latest = Some(record);
        self.latest.as_ref()
    }

    /// Returns everything received so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Returns the most recent record, if any prefix was parseable.
    #[must_use]
    pub const fn latest(&self) -> Option<&T> {
        self.latest.as_ref()
    }

    /// Returns how many distinct records were reported.
    #[must_use]
    pub const fn updates(&self) -> usize {
        self.updates
    }

    /// Parses the final text into a record.
    ///
    /// Falls back to extracting a fenced or embedded object when the model
    /// wrapped its answer in prose or a code block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the complete text holds no
    /// parseable object.
    pub fn finish(self) -> Result<T> {
        let parsed = self
            .body()
            .and_then(complete_json)
            .or_else(|| complete_json(extract_json_from_response(&self.buffer)));

        parsed
            .map(|map| T::from_partial(&map))
            .ok_or_else(|| Error::OperationFailed {
                operation: "parse_stream_record".to_string(),
                cause: format!("no JSON object in response: {}", self.buffer),
            })
    }

    /// The buffer from the first `{`, skipping any preamble such as a code fence.
    fn body(&self) -> Option<&str> {
        self.buffer.find('{').map(|start| &self.buffer[start..])
    }
}

impl<T: PartialRecord> Default for PartialJsonStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if present.
    pub event: Option<String>,
    /// The `data:` lines joined with `\n`.
    pub data: String,
}

/// Reads server-sent events from a response body.
///
/// `on_event` is called once per dispatched event and returns `false` to
/// stop reading early (for example on a `[DONE]` marker).
///
/// # Errors
///
/// Returns an error if reading fails or `on_event` fails.
pub fn read_sse_events<R, F>(reader: R, mut on_event: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&SseEvent) -> Result<bool>,
{
    let mut current = SseEvent::default();
    let mut has_data = false;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::OperationFailed {
            operation: "read_sse_stream".to_string(),
            cause: e.to_string(),
        })?;
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            if has_data && !on_event(&current)? {
                return Ok(());
            }
            current = SseEvent::default();
            has_data = false;
            continue;
        }

        // Comment line
        if line.starts_with(':') {
            continue;
        }

        let (field, value) = line.split_once(':').map_or((line, ""), |(field, value)| {
            (field, value.strip_prefix(' ').unwrap_or(value))
        });
        match field {
            "event" => current.event = Some(value.to_string()),
            "data" => {
                if has_data {
                    current.data.push('\n');
                }
                current.data.push_str(value);
                has_data = true;
            },
            _ => {},
        }
    }

    if has_data {
        on_event(&current)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoryChapter;
    use std::io::Cursor;

    #[test]
    fn test_stream_reports_only_changes() {
        let mut stream = PartialJsonStream::<StoryChapter>::new();

        assert!(stream.push("{\"ti").is_none());
        let first = stream.push("tle\": \"Rain").cloned().unwrap();
        assert_eq!(first.title, "Rain");

        // Closing the string does not change the record
        assert!(stream.push("\"").is_none());

        let second = stream.push(", \"content\": \"Drops").cloned().unwrap();
        assert_eq!(second.title, "Rain");
        assert_eq!(second.content, "Drops");
        assert_eq!(stream.updates(), 2);
    }

    #[test]
    fn test_stream_skips_code_fence_preamble() {
        let mut stream = PartialJsonStream::<StoryChapter>::new();
        assert!(stream.push("```json\n").is_none());
        let chapter = stream.push("{\"title\": \"Fog").cloned().unwrap();
        assert_eq!(chapter.title, "Fog");
    }

    #[test]
    fn test_finish_handles_trailing_fence() {
        let mut stream = PartialJsonStream::<StoryChapter>::new();
        stream.push("```json\n{\"title\": \"A\", \"content\": \"B\", \"summary\": \"C\"}\n```");
        let chapter = stream.finish().unwrap();
        assert_eq!(chapter.title, "A");
        assert!(chapter.is_complete());
    }

    #[test]
    fn test_finish_without_object_fails() {
        let mut stream = PartialJsonStream::<StoryChapter>::new();
        stream.push("I cannot write that story.");
        assert!(stream.latest().is_none());
        assert!(matches!(
            stream.finish(),
            Err(Error::OperationFailed { ref operation, .. }) if operation == "parse_stream_record"
        ));
    }

    #[test]
    fn test_read_sse_events() {
        let body = "event: ping\ndata: {\"a\":1}\n\n: comment\ndata: first\ndata: second\n\ndata:[DONE]\n\n";
        let mut events = Vec::new();
        read_sse_events(Cursor::new(body), |event| {
            events.push(event.clone());
            Ok(true)
        })
        .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event.as_deref(), Some("ping"));
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].event, None);
        assert_eq!(events[1].data, "first\nsecond");
        assert_eq!(events[2].data, "[DONE]");
    }

    #[test]
    fn test_read_sse_events_stops_early_and_flushes_tail() {
        let mut seen = Vec::new();
        read_sse_events(Cursor::new("data: a\r\n\r\ndata: b\n\ndata: c\n\n"), |event| {
            seen.push(event.data.clone());
            Ok(event.data != "b")
        })
        .unwrap();
        assert_eq!(seen, vec!["a", "b"]);

        let mut tail = Vec::new();
        read_sse_events(Cursor::new("data: unterminated"), |event| {
            tail.push(event.data.clone());
            Ok(true)
        })
        .unwrap();
        assert_eq!(tail, vec!["unterminated"]);
    }
}
