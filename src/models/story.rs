//! Records streamed from the LLM for the reading features.

use crate::llm::{PartialRecord, RepairedJson};
use serde::{Deserialize, Serialize};

/// Reads a string field, treating missing or non-string values as empty.
fn string_field(map: &RepairedJson, key: &str) -> String {
    map.get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// One chapter of a generated story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChapter {
    /// Chapter title.
    pub title: String,
    /// Chapter body.
    pub content: String,
    /// Short summary used to continue the story.
    pub summary: String,
}

impl PartialRecord for StoryChapter {
    fn from_partial(map: &RepairedJson) -> Self {
        Self {
            title: string_field(map, "title"),
            content: string_field(map, "content"),
            summary: string_field(map, "summary"),
        }
    }

    fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.content.is_empty() && !self.summary.is_empty()
    }
}

/// A memory aid linking a word to an image or story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAssociation {
    /// The word being learned.
    pub word: String,
    /// The association (mnemonic, image, etymology).
    pub association: String,
    /// An example sentence.
    pub example: String,
}

impl PartialRecord for WordAssociation {
    fn from_partial(map: &RepairedJson) -> Self {
        Self {
            word: string_field(map, "word"),
            association: string_field(map, "association"),
            example: string_field(map, "example"),
        }
    }

    fn is_complete(&self) -> bool {
        !self.word.is_empty() && !self.association.is_empty() && !self.example.is_empty()
    }
}
