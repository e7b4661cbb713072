//! Configuration loader.
//!
//! Reads one config file, parses it according to its extension, deserializes
//! it into the schema type, validates it and publishes it to the store.
//! Any failure is reported to the fatal handler exactly once and the store is
//! left as it was.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::files::{ConfigFormat, ConfigPaths};
use super::store::{ConfigStore, LoadedConfig};
use super::validation::ConfigSchema;
use crate::error::ConfigError;
use crate::fatal::FatalHandler;

/// Read and parse a config file into a generic document.
pub fn read_document(path: &Path) -> Result<(Value, ConfigFormat), ConfigError> {
    let format = ConfigFormat::from_path(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let document = format
        .parse(&content)
        .map_err(|message| ConfigError::Malformed {
            path: path.to_path_buf(),
            format,
            message,
        })?;

    Ok((document, format))
}

/// Read, parse, deserialize and validate a config file without touching any store.
pub fn read_config<C: ConfigSchema>(path: &Path) -> Result<LoadedConfig<C>, ConfigError> {
    let (document, format) = read_document(path)?;

    let config: C = serde_json::from_value(document).map_err(|e| ConfigError::Schema {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    config
        .validate()
        .map_err(|errors| ConfigError::Validation {
            path: path.to_path_buf(),
            errors,
        })?;

    Ok(LoadedConfig::new(config, path.to_path_buf(), format))
}

/// Loads configuration files into a [`ConfigStore`].
pub struct ConfigLoader<C> {
    paths: ConfigPaths,
    store: ConfigStore<C>,
    fatal: Arc<dyn FatalHandler>,
}

impl<C> Clone for ConfigLoader<C> {
    fn clone(&self) -> Self {
        Self {
            paths: self.paths.clone(),
            store: self.store.clone(),
            fatal: Arc::clone(&self.fatal),
        }
    }
}

impl<C> std::fmt::Debug for ConfigLoader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("paths", &self.paths)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<C> ConfigLoader<C> {
    pub fn new(paths: ConfigPaths, store: ConfigStore<C>, fatal: Arc<dyn FatalHandler>) -> Self {
        Self {
            paths,
            store,
            fatal,
        }
    }

    pub fn store(&self) -> &ConfigStore<C> {
        &self.store
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }
}

impl<C: ConfigSchema> ConfigLoader<C> {
    /// Load the config at `path` and publish it to the store.
    ///
    /// A configuration already in the store is replaced; callers that need
    /// isolation reset the store first. On failure the fatal handler is
    /// invoked and the store keeps its previous value.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<LoadedConfig<C>>, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading config");

        let loaded = match read_config::<C>(path) {
            Ok(loaded) => Arc::new(loaded),
            Err(e) => return Err(self.fail(e)),
        };

        if let Some(previous) = self.store.set(Arc::clone(&loaded)) {
            debug!(
                previous = %previous.source.display(),
                "Replacing previously loaded config"
            );
        }

        info!(
            path = %loaded.source.display(),
            format = %loaded.format,
            "Loaded config"
        );
        Ok(loaded)
    }

    /// Locate the config file in the well-known locations and load it.
    pub fn check(&self) -> Result<Arc<LoadedConfig<C>>, ConfigError> {
        let path = match self.paths.resolve() {
            Ok(path) => path,
            Err(e) => return Err(self.fail(e)),
        };
        self.load(path)
    }

    fn fail(&self, err: ConfigError) -> ConfigError {
        debug!(kind = %err.kind(), "Config load failed: {}", err);
        self.fatal.on_fatal(&err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::fatal::FatalRecorder;
    use tempfile::TempDir;

    const VALID_JSON: &str = r#"{
        "name": "plugin-host",
        "server": {"host": "127.0.0.1", "port": 8080},
        "plugins": [{"name": "greeter", "options": {"greeting": "hi"}}]
    }"#;

    const VALID_YAML: &str = r#"
name: plugin-host
server:
  host: 127.0.0.1
  port: 8080
plugins:
  - name: greeter
    options:
      greeting: hi
"#;

    fn setup() -> (TempDir, ConfigLoader<Config>, Arc<FatalRecorder>) {
        let dir = TempDir::new().unwrap();
        let recorder = Arc::new(FatalRecorder::new());
        let loader = ConfigLoader::new(
            ConfigPaths::new(dir.path(), "config"),
            ConfigStore::new(),
            recorder.clone(),
        );
        (dir, loader, recorder)
    }

    #[test]
    fn test_load_json() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().json_path();
        std::fs::write(&path, VALID_JSON).unwrap();

        let loaded = loader.load(&path).unwrap();
        assert_eq!(loaded.format, ConfigFormat::Json);
        assert_eq!(loaded.config.name, "plugin-host");
        assert_eq!(
            loaded.config.plugins[0].options["greeting"],
            Value::String("hi".to_string())
        );
        assert_eq!(loader.store().config(), Some(loaded.config.clone()));
        assert_eq!(recorder.calls(), 0);
    }

    #[test]
    fn test_json_and_yaml_load_equal() {
        let (_dir, loader, _recorder) = setup();
        let json_path = loader.paths().json_path();
        let yaml_path = loader.paths().yaml_path();
        std::fs::write(&json_path, VALID_JSON).unwrap();
        std::fs::write(&yaml_path, VALID_YAML).unwrap();

        let from_json = loader.load(&json_path).unwrap();
        let from_yaml = loader.load(&yaml_path).unwrap();
        assert_eq!(from_json.config, from_yaml.config);
        assert_eq!(from_yaml.format, ConfigFormat::Yaml);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let (_dir, loader, recorder) = setup();

        let err = loader.load(loader.paths().json_path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(recorder.calls(), 1);
        assert!(!loader.store().is_loaded());
    }

    #[test]
    fn test_directory_is_unreadable() {
        let (dir, loader, recorder) = setup();
        let path = dir.path().join("dir.json");
        std::fs::create_dir(&path).unwrap();

        let err = loader.load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileUnreadable);
        assert_eq!(recorder.calls(), 1);
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().json_path();
        std::fs::write(&path, "{ \"name\": ").unwrap();

        let err = loader.load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSerialization);
        assert_eq!(recorder.calls(), 1);
        assert!(!loader.store().is_loaded());
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().yaml_path();
        std::fs::write(&path, "name: [unterminated\n").unwrap();

        let err = loader.load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSerialization);
        assert_eq!(recorder.calls(), 1);
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().json_path();
        std::fs::write(
            &path,
            r#"{"name": "h", "server": {"host": "h", "port": 1}, "surprise": true}"#,
        )
        .unwrap();

        let err = loader.load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidationFailure);
        assert!(err.to_string().contains("surprise"));
        assert_eq!(recorder.calls(), 1);
        assert!(!loader.store().is_loaded());
    }

    #[test]
    fn test_missing_required_field_is_fatal() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().yaml_path();
        std::fs::write(&path, "name: host\n").unwrap();

        let err = loader.load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
        assert_eq!(recorder.calls(), 1);
        assert!(!loader.store().is_loaded());
    }

    #[test]
    fn test_semantic_validation_is_fatal() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().json_path();
        std::fs::write(
            &path,
            r#"{"name": "", "server": {"host": "h", "port": 0}}"#,
        )
        .unwrap();

        match loader.load(&path).unwrap_err() {
            ConfigError::Validation { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
        assert_eq!(recorder.calls(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous() {
        let (_dir, loader, recorder) = setup();
        let path = loader.paths().json_path();
        std::fs::write(&path, VALID_JSON).unwrap();
        loader.load(&path).unwrap();

        std::fs::write(&path, "not json").unwrap();
        assert!(loader.load(&path).is_err());

        assert_eq!(recorder.calls(), 1);
        assert_eq!(loader.store().config().unwrap().name, "plugin-host");
    }

    #[test]
    fn test_check_without_files_is_fatal() {
        let (_dir, loader, recorder) = setup();

        let err = loader.check().unwrap_err();
        assert!(matches!(err, ConfigError::NoConfigFile { .. }));
        assert_eq!(recorder.calls(), 1);
        assert!(!loader.store().is_loaded());
    }

    #[test]
    fn test_check_finds_yaml() {
        let (_dir, loader, recorder) = setup();
        std::fs::write(loader.paths().yaml_path(), VALID_YAML).unwrap();

        let loaded = loader.check().unwrap();
        assert_eq!(loaded.source(), loader.paths().yaml_path());
        assert_eq!(recorder.calls(), 0);
    }

    #[test]
    fn test_check_with_both_files_is_fatal() {
        let (_dir, loader, recorder) = setup();
        std::fs::write(loader.paths().json_path(), VALID_JSON).unwrap();
        std::fs::write(loader.paths().yaml_path(), VALID_YAML).unwrap();

        let err = loader.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousConfig);
        assert_eq!(recorder.calls(), 1);
    }
}
