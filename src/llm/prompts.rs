//! Prompts for the reading features.
//!
//! Every prompt asks for a single flat JSON object with string values, the
//! shape [`complete_json`](super::complete_json) can repair mid-stream.
//! Learner-supplied text is wrapped in XML tags and escaped so it cannot
//! break out of its delimiters.

/// System prompt for story chapters.
pub const STORY_SYSTEM_PROMPT: &str = r#"You write short graded-reader stories for language learners.

Use every word listed in <words> at least once, in natural context. Keep sentences short and the vocabulary simple apart from the listed words.

If <previous_summary> is present, continue that story: keep its characters and setting, and let the new chapter branch on how the listed words are used.

Respond with ONLY a JSON object, no markdown, with these string fields in this order:
- "title": the chapter title
- "content": the chapter text (150-300 words)
- "summary": one or two sentences summarizing the story so far"#;

/// System prompt for word associations.
pub const ASSOCIATION_SYSTEM_PROMPT: &str = r#"You help language learners remember words through vivid associations.

For the word in <word>, invent one memorable association (an image, a sound-alike, or an etymology) and one short example sentence.

Respond with ONLY a JSON object, no markdown, with these string fields in this order:
- "word": the word exactly as given
- "association": the association, at most three sentences
- "example": one example sentence using the word"#;

/// Escapes XML special characters in learner-supplied text.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Builds the user message for a story chapter.
#[must_use]
pub fn build_story_prompt(words: &[String], previous_summary: Option<&str>) -> String {
    let word_list = words
        .iter()
        .map(|w| escape_xml(w.trim()))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!("<words>\n{word_list}\n</words>");
    if let Some(summary) = previous_summary.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!(
            "\n\n<previous_summary>\n{}\n</previous_summary>",
            escape_xml(summary)
        ));
    }
    prompt
}

/// Builds the user message for a word association.
#[must_use]
pub fn build_association_prompt(word: &str, translations: &[String]) -> String {
    let mut prompt = format!("<word>{}</word>", escape_xml(word.trim()));
    if !translations.is_empty() {
        let meanings = translations
            .iter()
            .map(|t| escape_xml(t))
            .collect::<Vec<_>>()
            .join("; ");
        prompt.push_str(&format!("\n<meanings>{meanings}</meanings>"));
    }
    prompt
}
