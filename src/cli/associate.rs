//! CLI command for word associations.

use crate::config::WordwiseConfig;
use crate::models::WordAssociation;
use crate::services::StoryService;
use std::io::{self, Write};

/// Writes an association.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_association<W: Write>(
    writer: &mut W,
    association: &WordAssociation,
) -> io::Result<()> {
    writeln!(writer, "{}", association.word)?;
    writeln!(writer, "  Association: {}", association.association)?;
    writeln!(writer, "  Example: {}", association.example)
}

/// Executes the associate command.
///
/// # Errors
///
/// Returns an error if the word is blank, the LLM request fails, or output
/// fails.
pub fn cmd_associate(config: &WordwiseConfig, word: &str) -> Result<(), Box<dyn std::error::Error>> {
    let llm = super::build_llm_provider(&config.llm);
    let (corpus, _store) = super::open_stores(config)?;
    let service = StoryService::new(llm).with_corpus(corpus);

    let association = service.associate(word, |partial| {
        tracing::trace!(association_len = partial.association.len(), "Association update");
    })?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_association(&mut handle, &association)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_association() {
        let association = WordAssociation {
            word: "run".to_string(),
            association: "Picture a runner.".to_string(),
            example: "I run daily.".to_string(),
        };
        let mut buffer = Vec::new();
        write_association(&mut buffer, &association).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "run\n  Association: Picture a runner.\n  Example: I run daily.\n"
        );
    }
}
