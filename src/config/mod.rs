//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then a TOML file, then
//! `WORDWISE_*` environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use crate::models::DayBoundary;
use crate::services::daily::DEFAULT_WORD_COUNT;
use crate::{Error, Result};

/// Main configuration for wordwise.
#[derive(Debug, Clone)]
pub struct WordwiseConfig {
    /// Path to the data directory.
    pub data_dir: PathBuf,
    /// Database file; defaults to `wordwise.db` in the data directory.
    pub database_path: Option<PathBuf>,
    /// Daily selection settings.
    pub daily: DailyConfig,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Daily selection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyConfig {
    /// Number of words chosen per day.
    pub word_count: usize,
    /// Which clock decides when a new day starts.
    pub day_boundary: DayBoundary,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            word_count: DEFAULT_WORD_COUNT,
            day_boundary: DayBoundary::default(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Provider to use.
    pub provider: LlmProviderKind,
    /// Model name.
    pub model: Option<String>,
    /// API key (can be an environment variable reference like `${OPENAI_API_KEY}`).
    pub api_key: Option<String>,
    /// Base URL for the provider API.
    pub base_url: Option<String>,
    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl LlmConfig {
    /// Returns the API key with `${VAR}` references resolved.
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.as_deref()?.trim();
        match key.strip_prefix("${").and_then(|k| k.strip_suffix('}')) {
            Some(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
            None if key.is_empty() => None,
            None => Some(key.to_string()),
        }
    }
}

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProviderKind {
    /// Anthropic Claude.
    #[default]
    Anthropic,
    /// `OpenAI` GPT.
    OpenAi,
}

impl LlmProviderKind {
    /// Parses a provider string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "open_ai" | "open-ai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Log level or filter directive (`info`, `wordwise=debug`).
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Database file.
    pub database_path: Option<String>,
    /// Daily selection section.
    pub daily: Option<ConfigFileDaily>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Daily section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDaily {
    /// Words per day.
    pub word_count: Option<usize>,
    /// Day boundary: `utc` or `local`.
    pub day_boundary: Option<String>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Log level.
    pub level: Option<String>,
    /// Output format.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for WordwiseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_path: None,
            daily: DailyConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Returns the platform data directory for wordwise, or `.wordwise` when
/// the home directory cannot be determined.
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".wordwise"),
        |b| b.data_local_dir().join("wordwise"),
    )
}

impl WordwiseConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/wordwise/` on macOS)
    /// 2. XDG config dir (`~/.config/wordwise/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("wordwise").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("wordwise")
                .join("config.toml"),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `WordwiseConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        config.database_path = file.database_path.map(PathBuf::from);

        if let Some(daily) = file.daily {
            if let Some(word_count) = daily.word_count {
                config.daily.word_count = check_word_count(word_count)?;
            }
            if let Some(boundary) = daily.day_boundary {
                config.daily.day_boundary = parse_day_boundary(&boundary)?;
            }
        }

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                config.llm.provider = parse_provider(&provider)?;
            }
            config.llm.model = llm.model;
            config.llm.api_key = llm.api_key;
            config.llm.base_url = llm.base_url;
            config.llm.max_tokens = llm.max_tokens;
            config.llm.timeout_ms = llm.timeout_ms;
            config.llm.connect_timeout_ms = llm.connect_timeout_ms;
        }

        if let Some(logging) = file.logging {
            config.logging.level = logging.level;
            config.logging.format = logging.format;
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Applies `WORDWISE_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an invalid value.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`, using the same variable
    /// names as [`Self::with_env_overrides`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an invalid value.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WORDWISE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("WORDWISE_DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("WORDWISE_DAILY_COUNT") {
            self.daily.word_count = parse_word_count(&v)?;
        }
        if let Some(v) = get("WORDWISE_DAY_BOUNDARY") {
            self.daily.day_boundary = parse_day_boundary(&v)?;
        }
        if let Some(v) = get("WORDWISE_LLM_PROVIDER") {
            self.llm.provider = parse_provider(&v)?;
        }
        if let Some(v) = get("WORDWISE_LLM_MODEL") {
            self.llm.model = Some(v);
        }
        if let Some(v) = get("WORDWISE_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = get("WORDWISE_LLM_TIMEOUT_MS") {
            self.llm.timeout_ms = Some(parse_number("WORDWISE_LLM_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = get("WORDWISE_LOG_FORMAT") {
            self.logging.format = Some(v);
        }
        if let Some(v) = get("WORDWISE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
        Ok(self)
    }

    /// Returns the database file path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("wordwise.db"))
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }
}

fn check_word_count(count: usize) -> Result<usize> {
    if count == 0 {
        return Err(Error::InvalidInput(
            "daily word count must be positive".to_string(),
        ));
    }
    Ok(count)
}

fn parse_word_count(value: &str) -> Result<usize> {
    let count = value.trim().parse::<usize>().map_err(|_| {
        Error::InvalidInput(format!(
            "daily word count must be a positive integer, got '{value}'"
        ))
    })?;
    check_word_count(count)
}

fn parse_day_boundary(value: &str) -> Result<DayBoundary> {
    DayBoundary::parse(value).ok_or_else(|| {
        Error::InvalidInput(format!(
            "day boundary must be 'utc' or 'local', got '{value}'"
        ))
    })
}

fn parse_provider(value: &str) -> Result<LlmProviderKind> {
    LlmProviderKind::parse(value)
        .ok_or_else(|| Error::InvalidInput(format!("unknown LLM provider '{value}'")))
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{name} must be a number, got '{value}'")))
}
