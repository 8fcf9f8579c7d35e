// src/error.rs
// =============================================================================
// Error types for the checking library.
//
// The library returns these typed errors; the binary and the GitHub
// retrieval code wrap everything in anyhow::Result like the rest of the CLI.
//
// Note that a CheckError never reaches the caller of Checker::check():
// the orchestrator turns it into a failed category inside the report.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Invalid pattern '{pattern}' for section '{section}'")]
    InvalidPattern {
        section: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error in {category}: {message}")]
    Internal { category: String, message: String },
}

pub type Result<T> = std::result::Result<T, CheckError>;
