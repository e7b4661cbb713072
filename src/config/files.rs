//! Config file formats and the well-known config locations.
//!
//! A configuration lives in exactly one of `<dir>/<stem>.json` or
//! `<dir>/<stem>.yaml`. The two are alternatives for the same logical
//! config, so finding both is an error rather than a merge.

use crate::error::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable overriding the directory holding the config files.
pub const ENV_CONFIG_DIR: &str = "CONFIG_LIFECYCLE_DIR";
/// Environment variable overriding the config file stem.
pub const ENV_CONFIG_STEM: &str = "CONFIG_LIFECYCLE_STEM";
/// Environment variable naming an explicit config file (skips discovery).
pub const ENV_CONFIG_PATH: &str = "CONFIG_LIFECYCLE_PATH";

/// Default config file stem.
pub const DEFAULT_STEM: &str = "config";

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// All recognized formats, in discovery order.
    pub const ALL: [ConfigFormat; 2] = [ConfigFormat::Json, ConfigFormat::Yaml];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    /// Parse text in this format into a generic document.
    pub fn parse(&self, content: &str) -> Result<Value, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Render a generic document in this format.
    pub fn render(&self, document: &Value) -> Result<String, String> {
        match self {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(document).map_err(|e| e.to_string())
            }
            ConfigFormat::Yaml => serde_yaml::to_string(document).map_err(|e| e.to_string()),
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            ConfigFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// The well-known config locations for one logical configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Directory holding the config files
    pub dir: PathBuf,
    /// File name without extension
    pub stem: String,
    /// Explicit file that bypasses discovery
    pub explicit: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new(".", DEFAULT_STEM)
    }
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            explicit: None,
        }
    }

    /// Discover paths from environment and defaults.
    pub fn discover() -> Self {
        let dir = std::env::var(ENV_CONFIG_DIR)
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let stem = std::env::var(ENV_CONFIG_STEM).unwrap_or_else(|_| DEFAULT_STEM.to_string());

        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);

        Self {
            dir,
            stem,
            explicit,
        }
    }

    /// Use an explicit config file instead of the well-known locations.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Well-known path for the given format.
    pub fn path_for(&self, format: ConfigFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.stem, format.extension()))
    }

    pub fn json_path(&self) -> PathBuf {
        self.path_for(ConfigFormat::Json)
    }

    pub fn yaml_path(&self) -> PathBuf {
        self.path_for(ConfigFormat::Yaml)
    }

    /// Both well-known paths, in discovery order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        ConfigFormat::ALL
            .iter()
            .map(|f| self.path_for(*f))
            .collect()
    }

    /// Well-known paths that currently exist on disk.
    pub fn existing(&self) -> Vec<PathBuf> {
        self.candidates()
            .into_iter()
            .filter(|p| p.exists())
            .collect()
    }

    /// Resolve the single config file to load.
    ///
    /// An explicit path is returned as-is (its existence is checked at load
    /// time). Otherwise exactly one well-known path must exist.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref explicit) = self.explicit {
            return Ok(explicit.clone());
        }

        let mut existing = self.existing();
        match existing.len() {
            0 => Err(ConfigError::NoConfigFile {
                searched: self.candidates(),
            }),
            1 => Ok(existing.remove(0)),
            _ => Err(ConfigError::AmbiguousConfig { paths: existing }),
        }
    }
}
