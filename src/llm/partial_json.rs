//! Best-effort repair of truncated JSON objects.
//!
//! Streaming LLMs deliver a JSON object a few characters at a time. A UI that
//! wants to show a title as soon as it is readable has to parse every prefix
//! of that object. [`complete_json`] closes whatever the stream left open and
//! either returns the object or `None` ("not yet parseable").
//!
//! The repair only balances syntax and fills truncated values with empty
//! strings. It never invents keys, so a successful result is structurally
//! valid JSON whose fields may still be provisionally empty.

use regex::Regex;
use serde_json::{Map, Value};
use std::iter;
use std::sync::LazyLock;

/// Creates a compile-time verified regex wrapped in [`LazyLock`].
macro_rules! lazy_regex {
    ($pattern:expr) => {
        LazyLock::new(|| Regex::new($pattern).unwrap_or_else(|_| unreachable!()))
    };
}

/// A comma (and optional whitespace) directly before a closing brace.
static TRAILING_COMMA: LazyLock<Regex> = lazy_regex!(r",\s*\}");

/// A colon (and optional whitespace) directly before a closing brace.
static MISSING_VALUE: LazyLock<Regex> = lazy_regex!(r":\s*\}");

/// A repaired JSON object.
///
/// The domain produces flat objects with string values (`title`,
/// `content`, `summary`); nested objects are kept as parsed.
pub type RepairedJson = Map<String, Value>;

/// Repairs and parses the cumulative text of a JSON object stream.
///
/// `chunk` must be everything received so far, not only the newest delta.
/// Returns `None` when the text cannot be turned into an object yet; callers
/// should wait for more input and try again. Never panics.
///
/// # Example
///
/// ```rust
/// use wordwise::llm::complete_json;
///
/// let map = complete_json(r#"{"title": "hello"#).unwrap();
/// assert_eq!(map["title"], "hello");
///
/// let map = complete_json(r#"{"title":"#).unwrap();
/// assert_eq!(map["title"], "");
///
/// assert!(complete_json(r#"{"tit"#).is_none());
/// ```
#[must_use]
pub fn complete_json(chunk: &str) -> Option<RepairedJson> {
    if let Some(map) = parse_object(chunk) {
        return Some(map);
    }

    let repaired = repair_text(chunk);
    let parsed = parse_object(&repaired);
    if parsed.is_none() {
        metrics::counter!("partial_json_sentinel_total").increment(1);
        tracing::trace!(
            chunk_len = chunk.len(),
            repaired = %repaired,
            "Partial JSON not yet parseable"
        );
    }
    parsed
}

/// Applies the balancing heuristic without parsing.
///
/// 1. An odd number of `"` gets one `"` appended.
/// 2. Unclosed `{` get matching `}` appended; surplus `}` get `{` prepended.
/// 3. `,` before `}` is dropped.
/// 4. `:` before `}` becomes `:""`.
///
/// Braces and quotes are counted as raw characters, including any inside
/// string values.
#[must_use]
pub fn repair_text(chunk: &str) -> String {
    let (open, close, quotes) =
        chunk
            .chars()
            .fold((0usize, 0usize, 0usize), |(open, close, quotes), c| match c {
                '{' => (open + 1, close, quotes),
                '}' => (open, close + 1, quotes),
                '"' => (open, close, quotes + 1),
                _ => (open, close, quotes),
            });

    let mut text = String::with_capacity(chunk.len() + open.abs_diff(close) + 1);
    if close > open {
        text.extend(iter::repeat_n('{', close - open));
    }
    text.push_str(chunk);
    if quotes % 2 == 1 {
        text.push('"');
    }
    if open > close {
        text.extend(iter::repeat_n('}', open - close));
    }

    let text = TRAILING_COMMA.replace_all(&text, "}");
    MISSING_VALUE.replace_all(&text, r#":""}"#).into_owned()
}

/// Parses text as a JSON object, rejecting every other JSON value.
fn parse_object(text: &str) -> Option<RepairedJson> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn object(value: &Value) -> RepairedJson {
        value.as_object().cloned().unwrap()
    }

    #[test_case(r#"{"title": "hello"#, &json!({"title": "hello"}) ; "unterminated string")]
    #[test_case(r#"{"a": "b", "c": {"d": "e""#, &json!({"a": "b", "c": {"d": "e"}}) ; "unclosed nesting")]
    #[test_case(r#"{"title":"#, &json!({"title": ""}) ; "missing value")]
    #[test_case(r#"{"title":   "#, &json!({"title": ""}) ; "missing value with whitespace")]
    #[test_case(r#"{"title": "x","#, &json!({"title": "x"}) ; "trailing comma")]
    #[test_case(r#"{"title": "x",  "#, &json!({"title": "x"}) ; "trailing comma with whitespace")]
    #[test_case(r#"{"a": {"b":"#, &json!({"a": {"b": ""}}) ; "nested missing value")]
    #[test_case(r#"{"a": {"b": "c","#, &json!({"a": {"b": "c"}}) ; "nested trailing comma")]
    #[test_case("{", &json!({}) ; "lone brace")]
    #[test_case(r#""a": "b"}"#, &json!({"a": "b"}) ; "missing opening brace")]
    fn test_repairs(chunk: &str, expected: &Value) {
        assert_eq!(complete_json(chunk), Some(object(expected)));
    }

    #[test_case("" ; "empty")]
    #[test_case(r#"{"tit"# ; "mid key")]
    #[test_case(r#"{"title""# ; "key without colon")]
    #[test_case(r#"{"title": "x", ""# ; "opening quote of next key")]
    #[test_case(r#"{"title": "x", "con"# ; "partial next key")]
    #[test_case("```json\n{" ; "fenced preamble")]
    #[test_case("}}}}" ; "only closing braces")]
    #[test_case("[1, 2" ; "array")]
    #[test_case("\"just a string\"" ; "string literal")]
    #[test_case("42" ; "number")]
    fn test_not_yet_parseable(chunk: &str) {
        assert_eq!(complete_json(chunk), None);
    }

    #[test]
    fn test_complete_input_is_returned_as_parsed() {
        let text = r#"{"title": "Braces {inside}", "content": "say \"hi\""}"#;
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(complete_json(text), Some(object(&expected)));
    }

    #[test]
    fn test_repair_text_balances_structure() {
        assert_eq!(repair_text(r#"{"a": "b"#), r#"{"a": "b"}"#);
        assert_eq!(repair_text(r#"{"a": {"b":"#), r#"{"a": {"b":""}}"#);
        assert_eq!(repair_text("}"), "{}");
        assert_eq!(repair_text(""), "");
    }

    #[test]
    fn test_every_prefix_is_object_or_sentinel() {
        let text = r#"{"title": "雨の日", "content": "It rained, and the fox stayed in.", "summary": "A quiet day"}"#;
        let expected: Value = serde_json::from_str(text).unwrap();

        let mut last_success = None;
        for (idx, _) in text.char_indices() {
            if let Some(map) = complete_json(&text[..idx]) {
                assert!(map.values().all(Value::is_string));
                last_success = Some(map);
            }
        }
        assert!(last_success.is_some());
        assert_eq!(complete_json(text), Some(object(&expected)));
    }
}
