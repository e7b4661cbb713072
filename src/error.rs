//! Structured error types for configuration loading.

use crate::config::{ConfigFormat, ValidationError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes used when a configuration failure terminates the process.
pub struct ExitCode;

impl ExitCode {
    /// Configuration could not be parsed or failed validation.
    pub const CONFIG_ERROR: i32 = 2;

    /// Configuration file missing or unreadable.
    pub const IO_ERROR: i32 = 3;
}

/// Error categories for programmatic handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    FileNotFound,
    FileUnreadable,
    MalformedSerialization,
    SchemaValidationFailure,
    AmbiguousConfig,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FileNotFound => write!(f, "file not found"),
            ErrorKind::FileUnreadable => write!(f, "file unreadable"),
            ErrorKind::MalformedSerialization => write!(f, "malformed serialization"),
            ErrorKind::SchemaValidationFailure => write!(f, "schema validation failure"),
            ErrorKind::AmbiguousConfig => write!(f, "ambiguous config"),
        }
    }
}

/// Failure while locating, reading, parsing or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("no config file found (searched: {})", display_paths(searched))]
    NoConfigFile { searched: Vec<PathBuf> },

    #[error("multiple config files present, remove all but one: {}", display_paths(paths))]
    AmbiguousConfig { paths: Vec<PathBuf> },

    #[error("failed to read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config file extension: {} (expected .json, .yaml or .yml)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse {format} config {}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        format: ConfigFormat,
        message: String,
    },

    #[error("config {} does not match schema: {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error("config {} failed validation: {}", path.display(), display_errors(errors))]
    Validation {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::NotFound { .. } | ConfigError::NoConfigFile { .. } => {
                ErrorKind::FileNotFound
            }
            ConfigError::Unreadable { .. } => ErrorKind::FileUnreadable,
            ConfigError::UnsupportedFormat { .. } | ConfigError::Malformed { .. } => {
                ErrorKind::MalformedSerialization
            }
            ConfigError::Schema { .. } | ConfigError::Validation { .. } => {
                ErrorKind::SchemaValidationFailure
            }
            ConfigError::AmbiguousConfig { .. } => ErrorKind::AmbiguousConfig,
        }
    }

    /// Exit code the process should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::FileNotFound | ErrorKind::FileUnreadable => ExitCode::IO_ERROR,
            _ => ExitCode::CONFIG_ERROR,
        }
    }

    /// The file the error refers to, if it concerns a single file.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConfigError::NotFound { path }
            | ConfigError::Unreadable { path, .. }
            | ConfigError::UnsupportedFormat { path }
            | ConfigError::Malformed { path, .. }
            | ConfigError::Schema { path, .. }
            | ConfigError::Validation { path, .. } => Some(path),
            ConfigError::NoConfigFile { .. } | ConfigError::AmbiguousConfig { .. } => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
