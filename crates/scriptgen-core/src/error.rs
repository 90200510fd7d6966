//! Error types for script generation.

use std::path::PathBuf;

use thiserror::Error;

/// A credential line that does not hold at least a user and a password.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot parse credentials from line: {line:?}")]
pub struct ParseError {
    /// The raw line as it was read.
    pub line: String,
}

/// Errors that can occur while generating scripts.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential line could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// One or more password references were absent from the secrets map.
    #[error("Missing secret reference(s): {}", .0.join(", "))]
    MissingSecret(Vec<String>),

    /// Input path does not exist or is not a regular file.
    #[error("File path was not supplied or invalid: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Extra argument string could not be split into shell words.
    #[error("Cannot tokenize extra arguments (unbalanced quotes?): {0:?}")]
    ExtraArgs(String),

    /// A command token cannot be quoted for a shell script.
    #[error("Cannot quote command for shell script: {0}")]
    Quote(#[from] shlex::QuoteError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
