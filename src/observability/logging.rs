//! Structured logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter when nothing else is configured.
const DEFAULT_LEVEL: &str = "warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from settings and the process
    /// environment.
    ///
    /// Filter precedence: `WORDWISE_LOG`, then `RUST_LOG`, then `debug` when
    /// `verbose` is set, then the configured level, then `warn`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the chosen filter directive does
    /// not parse.
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Result<Self> {
        let directive = filter_directive(settings, verbose, |name| std::env::var(name).ok());
        let filter = EnvFilter::try_new(&directive)
            .map_err(|e| Error::InvalidInput(format!("invalid log filter '{directive}': {e}")))?;

        Ok(Self {
            filter,
            format: settings
                .and_then(|s| s.format.as_deref())
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.and_then(|s| s.file.clone()),
        })
    }
}

/// Chooses the filter directive, reading variables through `lookup`.
fn filter_directive(
    settings: Option<&LoggingSettings>,
    verbose: bool,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    let from_env = ["WORDWISE_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
    if let Some(directive) = from_env {
        return directive;
    }
    if verbose {
        return "debug".to_string();
    }
    settings
        .and_then(|s| s.level.clone())
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}
