//! Error types for postman-executor
//!
//! Every message names the offending manifest entry and field so the user
//! can fix the manifest without reading the source.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of named manifest entry an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An entry of `global.data` or of a test's `data` list
    Data,
    /// An entry of `integration-tests`
    Test,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Data => f.write_str("data object"),
            EntryKind::Test => f.write_str("integration-test object"),
        }
    }
}

/// Main error type for postman-executor
#[derive(Error, Debug)]
pub enum Error {
    // === Manifest Validation Errors ===
    #[error("Invalid manifest structure at {context}: {message}")]
    Shape { context: String, message: String },

    #[error("The {kind} {entry} does not have a {field}. {hint}")]
    MissingField {
        kind: EntryKind,
        entry: String,
        field: &'static str,
        hint: String,
    },

    #[error("The {kind} {entry}.{field} '{reference}' is invalid: {reason}")]
    InvalidFileReference {
        kind: EntryKind,
        entry: String,
        field: &'static str,
        reference: String,
        reason: String,
    },

    #[error("The {kind} {entry} has an invalid database: {reason}")]
    InvalidDatabase {
        kind: EntryKind,
        entry: String,
        reason: String,
    },

    // === Path Resolution Errors ===
    #[error("'{0}' is not a usable path")]
    InvalidPath(String),

    #[error("{} was not found", .0.display())]
    FileNotFound(PathBuf),

    // === Manifest Loading Errors ===
    #[error("The file {} was not found: {error}", path.display())]
    ManifestRead { path: PathBuf, error: String },

    #[error("Cannot load the configuration file {} correctly: {error}", path.display())]
    ManifestParse { path: PathBuf, error: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Execution Errors ===
    #[error("'{tool}' was not found on PATH. Install it or set its location in the config file")]
    ToolNotFound { tool: String },

    #[error("{0}")]
    DatabaseUnavailable(String),

    #[error("Database command '{command}' failed: {message}")]
    DatabaseCommand { command: String, message: String },

    #[error("The server at {url} was not found after {attempts} attempt(s)")]
    ServerUnreachable { url: String, attempts: u32 },

    #[error("Integration test '{test}' failed: {reason}")]
    RunnerFailure { test: String, reason: String },

    #[error("Run aborted")]
    Aborted,

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a structural error at the given manifest position
    pub fn shape(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a missing field error with a hint on where to add it
    pub fn missing_field(kind: EntryKind, entry: &str, field: &'static str) -> Self {
        let hint = if field == "database" {
            format!("Specify a global.database value or a {entry}.database value.")
        } else {
            format!("Specify a {entry}.{field} value.")
        };
        Self::MissingField {
            kind,
            entry: entry.to_string(),
            field,
            hint,
        }
    }

    /// Create an invalid file reference error
    pub fn invalid_file_reference(
        kind: EntryKind,
        entry: &str,
        field: &'static str,
        reference: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFileReference {
            kind,
            entry: entry.to_string(),
            field,
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid database error
    pub fn invalid_database(kind: EntryKind, entry: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDatabase {
            kind,
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a database command failure
    pub fn database_command(command: &str, message: impl Into<String>) -> Self {
        Self::DatabaseCommand {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Create a runner failure for a test
    pub fn runner_failure(test: &str, reason: impl Into<String>) -> Self {
        Self::RunnerFailure {
            test: test.to_string(),
            reason: reason.into(),
        }
    }
}
