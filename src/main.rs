//! Binary entry point for wordwise.
//!
//! This binary provides the CLI interface for the wordwise vocabulary tools.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use wordwise::WordwiseConfig;
use wordwise::cli::{
    OutputFormat, cmd_associate, cmd_config, cmd_daily, cmd_import, cmd_repair, cmd_story,
};
use wordwise::observability;

/// Wordwise - daily vocabulary words and streamed reading material.
#[derive(Parser)]
#[command(name = "wordwise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Show the words of the day.
    Daily {
        /// Date to show (YYYY-MM-DD); defaults to today.
        #[arg(short, long)]
        date: Option<String>,

        /// Number of words to choose when the day is generated.
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Repair a partial JSON object (reads stdin when no text is given).
    Repair {
        /// The partial JSON text.
        text: Option<String>,
    },

    /// Import a corpus CSV with `word,translation,category` columns.
    Import {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Stream a story chapter.
    Story {
        /// Words to use (comma-separated); defaults to today's words.
        #[arg(short, long)]
        words: Option<String>,

        /// Summary of the previous chapter to continue from.
        #[arg(short, long)]
        previous: Option<String>,
    },

    /// Stream a memory association for a word.
    Associate {
        /// The word.
        word: String,
    },

    /// Show the effective configuration.
    Config,
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &WordwiseConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Daily {
            date,
            count,
            format,
        } => cmd_daily(config, date.as_deref(), count, format),

        Commands::Repair { text } => cmd_repair(text),

        Commands::Import { path } => cmd_import(config, &path),

        Commands::Story { words, previous } => {
            cmd_story(config, words.as_deref(), previous.as_deref())
        },

        Commands::Associate { word } => cmd_associate(config, &word),

        Commands::Config => cmd_config(config),
    }
}

/// Loads configuration and applies environment overrides.
fn load_config(path: Option<&str>) -> Result<WordwiseConfig, Box<dyn std::error::Error>> {
    let config = if let Some(config_path) = path {
        WordwiseConfig::load_from_file(std::path::Path::new(config_path))?
    } else {
        match std::env::var("WORDWISE_CONFIG_PATH") {
            Ok(config_path) if !config_path.trim().is_empty() => {
                WordwiseConfig::load_from_file(std::path::Path::new(&config_path))?
            },
            _ => WordwiseConfig::load_default(),
        }
    };

    Ok(config.with_env_overrides()?)
}
