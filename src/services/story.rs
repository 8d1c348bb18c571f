//! Streamed reading material: story chapters and word associations.
//!
//! Both features ask the model for a flat JSON object and surface partial
//! records while tokens arrive, so a UI can show the title of a chapter long
//! before its body is complete.

use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::llm::prompts::{
    ASSOCIATION_SYSTEM_PROMPT, STORY_SYSTEM_PROMPT, build_association_prompt, build_story_prompt,
};
use crate::llm::{LlmProvider, PartialJsonStream, PartialRecord};
use crate::models::{StoryChapter, WordAssociation};
use crate::storage::{CorpusBackend, CorpusQuery};
use crate::{Error, Result};

/// Service generating streamed stories and associations.
pub struct StoryService {
    llm: Arc<dyn LlmProvider>,
    corpus: Option<Arc<dyn CorpusBackend>>,
}

impl StoryService {
    /// Creates a story service backed by an LLM provider.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, corpus: None }
    }

    /// Adds a corpus used to give the model known meanings of a word.
    #[must_use]
    pub fn with_corpus(mut self, corpus: Arc<dyn CorpusBackend>) -> Self {
        self.corpus = Some(corpus);
        self
    }

    /// Streams a story chapter that uses every word in `words`.
    ///
    /// `previous_summary` continues an earlier chapter. `on_update` receives
    /// each partial chapter that differs from the last one reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `words` has no non-blank word, or
    /// [`Error::OperationFailed`] if the request fails or the response never
    /// contains a parseable chapter.
    #[instrument(
        skip_all,
        fields(provider = self.llm.name(), words = words.len(), continued = previous_summary.is_some())
    )]
    pub fn generate_chapter(
        &self,
        words: &[String],
        previous_summary: Option<&str>,
        mut on_update: impl FnMut(&StoryChapter),
    ) -> Result<StoryChapter> {
        if words.iter().all(|w| w.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "a story needs at least one word".to_string(),
            ));
        }

        let prompt = build_story_prompt(words, previous_summary);
        self.stream_record(STORY_SYSTEM_PROMPT, &prompt, "story_parse", &mut on_update)
    }

    /// Streams a memory association for `word`.
    ///
    /// When a corpus is attached, the word's known translations are included
    /// in the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `word` is blank, or
    /// [`Error::OperationFailed`] if the corpus or the request fails or the
    /// response never contains a parseable association.
    #[instrument(skip_all, fields(provider = self.llm.name(), word = %word))]
    pub fn associate(
        &self,
        word: &str,
        mut on_update: impl FnMut(&WordAssociation),
    ) -> Result<WordAssociation> {
        let word = word.trim();
        if word.is_empty() {
            return Err(Error::InvalidInput("word must not be empty".to_string()));
        }

        let meanings = self.known_meanings(word)?;
        let prompt = build_association_prompt(word, &meanings);
        self.stream_record(
            ASSOCIATION_SYSTEM_PROMPT,
            &prompt,
            "association_parse",
            &mut on_update,
        )
    }

    fn known_meanings(&self, word: &str) -> Result<Vec<String>> {
        let Some(corpus) = &self.corpus else {
            return Ok(Vec::new());
        };
        let items = corpus.lookup(&CorpusQuery::Keys(vec![word.to_string()]))?;
        Ok(items
            .into_iter()
            .flat_map(|item| item.translations)
            .map(|t| t.text)
            .collect())
    }

    fn stream_record<T: PartialRecord>(
        &self,
        system: &str,
        user: &str,
        operation: &str,
        on_update: &mut dyn FnMut(&T),
    ) -> Result<T> {
        let start = Instant::now();
        let mut stream = PartialJsonStream::<T>::new();

        self.llm.stream_with_system(system, user, &mut |delta: &str| {
            if let Some(record) = stream.push(delta) {
                on_update(record);
            }
        })?;

        let updates = stream.updates();
        let record = stream.finish().map_err(|e| {
            metrics::counter!("llm_record_parse_failures_total", "operation" => operation.to_string())
                .increment(1);
            Error::OperationFailed {
                operation: operation.to_string(),
                cause: e.to_string(),
            }
        })?;

        if !record.is_complete() {
            tracing::warn!(operation, "Streamed record is missing fields");
        }
        tracing::debug!(
            updates,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Streamed record complete"
        );
        Ok(record)
    }
}
