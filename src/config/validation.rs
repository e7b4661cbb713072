//! Semantic validation of deserialized configurations.
//!
//! Serde rejects unknown, missing and mistyped fields. Everything beyond
//! that (value ranges, uniqueness, naming) lives here, and reports every
//! violation rather than stopping at the first.

use serde::de::DeserializeOwned;
use std::collections::HashSet;

use super::types::{Config, LOG_LEVELS};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A configuration type the loader can deserialize and validate.
pub trait ConfigSchema: DeserializeOwned + Send + Sync + 'static {
    /// Check semantic constraints after deserialization.
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Ok(())
    }
}

impl ConfigSchema for Config {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "must not be empty"));
        }

        if self.server.host.trim().is_empty() {
            errors.push(ValidationError::new("server.host", "must not be empty"));
        }
        if self.server.port == 0 {
            errors.push(ValidationError::new("server.port", "must be non-zero"));
        }

        let mut seen = HashSet::new();
        for (i, plugin) in self.plugins.iter().enumerate() {
            let field = format!("plugins[{}].name", i);
            if plugin.name.trim().is_empty() {
                errors.push(ValidationError::new(field, "must not be empty"));
            } else if !seen.insert(plugin.name.as_str()) {
                errors.push(ValidationError::new(
                    field,
                    format!("duplicate plugin '{}'", plugin.name),
                ));
            }
        }

        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            errors.push(ValidationError::new(
                "log.level",
                format!(
                    "unknown level '{}' (expected one of: {})",
                    self.log.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
