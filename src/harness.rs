//! Fixture harness for tests that need a loaded configuration.
//!
//! Stages a fixture config file into a well-known location, loads it through
//! the regular loader with a [`FatalRecorder`] in place of process exit, and
//! checks that the store ends up holding exactly the fixture. Tear-down
//! removes the staged files, resets the store, and fails if the fatal path
//! fired at any point.

use serde_json::Value;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{
    ConfigFormat, ConfigLoader, ConfigPaths, ConfigSchema, ConfigStore, LoadedConfig,
    read_config, read_document,
};
use crate::error::ConfigError;
use crate::fatal::FatalRecorder;

/// A harness invariant did not hold.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("stale config file still present after cleanup: {}", path.display())]
    StaleFile { path: PathBuf },

    #[error("fixture {} is itself a well-known config path and would be overwritten", path.display())]
    FixtureAtStagingPath { path: PathBuf },

    #[error("fixture was not staged at {}", path.display())]
    StagingFailed { path: PathBuf },

    #[error("config store expected to be unloaded but holds {}", loaded_from.display())]
    StoreNotUnloaded { loaded_from: PathBuf },

    #[error("config store expected to hold a configuration but is unloaded")]
    StoreNotLoaded,

    #[error("loaded config does not match fixture {}:\n  loaded:  {loaded}\n  fixture: {expected}", fixture.display())]
    FixtureMismatch {
        fixture: PathBuf,
        loaded: String,
        expected: String,
    },

    #[error(
        "fatal config path was invoked {calls} time(s); a load failed or the config was never loaded: {}",
        errors.join("; ")
    )]
    FatalInvoked { calls: usize, errors: Vec<String> },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture could not be prepared: {0}")]
    Config(#[from] ConfigError),
}

/// Stages a fixture config and drives the loader against it.
pub struct ConfigHarness<C> {
    fixture: PathBuf,
    loader: ConfigLoader<C>,
    recorder: Arc<FatalRecorder>,
}

impl<C> Debug for ConfigHarness<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHarness")
            .field("fixture", &self.fixture)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl<C> ConfigHarness<C>
where
    C: ConfigSchema + PartialEq + Debug,
{
    /// Harness over the well-known `paths`, staging copies of `fixture`.
    pub fn new(paths: ConfigPaths, fixture: impl Into<PathBuf>) -> Self {
        let recorder = Arc::new(FatalRecorder::new());
        let loader = ConfigLoader::new(paths, ConfigStore::new(), recorder.clone());
        Self {
            fixture: fixture.into(),
            loader,
            recorder,
        }
    }

    /// Harness staging into `dir/<stem>.{json,yaml}`.
    pub fn in_dir(dir: impl Into<PathBuf>, stem: &str, fixture: impl Into<PathBuf>) -> Self {
        Self::new(ConfigPaths::new(dir, stem), fixture)
    }

    pub fn store(&self) -> &ConfigStore<C> {
        self.loader.store()
    }

    pub fn loader(&self) -> &ConfigLoader<C> {
        &self.loader
    }

    pub fn recorder(&self) -> &FatalRecorder {
        &self.recorder
    }

    pub fn paths(&self) -> &ConfigPaths {
        self.loader.paths()
    }

    pub fn fixture(&self) -> &Path {
        &self.fixture
    }

    /// Fail if the fixture lives at one of the paths the harness stages to.
    pub fn check_fixture_location(&self) -> Result<(), HarnessError> {
        if self
            .paths()
            .candidates()
            .iter()
            .any(|candidate| same_file(candidate, &self.fixture))
        {
            return Err(HarnessError::FixtureAtStagingPath {
                path: self.fixture.clone(),
            });
        }
        Ok(())
    }

    /// Remove config files left over at either well-known path.
    pub fn cleanup_files(&self) -> Result<(), HarnessError> {
        self.check_fixture_location()?;
        for path in self.paths().candidates() {
            if path.exists() {
                debug!(path = %path.display(), "Removing config file");
                std::fs::remove_file(&path).map_err(|e| HarnessError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            }
            if path.exists() {
                return Err(HarnessError::StaleFile { path });
            }
        }
        Ok(())
    }

    /// Place the fixture at the well-known path for `format`.
    ///
    /// A fixture in the other format is transcoded through its parsed
    /// document so both locations can be exercised from one fixture.
    pub fn stage_fixture(&self, format: ConfigFormat) -> Result<PathBuf, HarnessError> {
        self.check_fixture_location()?;
        let target = self.paths().path_for(format);
        let fixture_format = ConfigFormat::from_path(&self.fixture)?;

        if fixture_format == format {
            std::fs::copy(&self.fixture, &target).map_err(|e| HarnessError::Io {
                path: self.fixture.clone(),
                source: e,
            })?;
        } else {
            let (document, _) = read_document(&self.fixture)?;
            let rendered = render(format, &document, &self.fixture)?;
            std::fs::write(&target, rendered).map_err(|e| HarnessError::Io {
                path: target.clone(),
                source: e,
            })?;
        }

        if !target.exists() {
            return Err(HarnessError::StagingFailed { path: target });
        }
        debug!(fixture = %self.fixture.display(), target = %target.display(), "Staged fixture");
        Ok(target)
    }

    /// Stage the fixture as JSON and load it. See [`ConfigHarness::set_up_with`].
    pub fn set_up(&self) -> Result<Arc<LoadedConfig<C>>, HarnessError> {
        self.set_up_with(ConfigFormat::Json)
    }

    /// Stage the fixture in `format`, load it from a reset store, and verify
    /// that the store holds exactly the fixture with no fatal failure recorded.
    pub fn set_up_with(&self, format: ConfigFormat) -> Result<Arc<LoadedConfig<C>>, HarnessError> {
        self.cleanup_files()?;
        self.stage_fixture(format)?;

        self.store().reset();
        self.assert_unloaded()?;

        // A failed load has already been recorded; release reports it.
        if self.loader.check().is_err() {
            self.recorder.release()?;
        }

        let loaded = self.assert_loaded()?;
        self.assert_matches_fixture(&loaded.config)?;
        self.recorder.release()?;
        Ok(loaded)
    }

    /// Remove staged files and reset the store.
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned. Fails if the fatal path was taken since the last release.
    pub fn tear_down(&self) -> Result<(), HarnessError> {
        let cleanup = self.cleanup_files();
        self.store().reset();
        let release = self.recorder.release();
        cleanup.and(release)
    }

    pub fn assert_unloaded(&self) -> Result<(), HarnessError> {
        match self.store().get() {
            None => Ok(()),
            Some(current) => Err(HarnessError::StoreNotUnloaded {
                loaded_from: current.source.clone(),
            }),
        }
    }

    pub fn assert_loaded(&self) -> Result<Arc<LoadedConfig<C>>, HarnessError> {
        self.store().get().ok_or(HarnessError::StoreNotLoaded)
    }

    /// Compare `config` with the fixture, parsed through the same pipeline.
    pub fn assert_matches_fixture(&self, config: &C) -> Result<(), HarnessError> {
        let expected = read_config::<C>(&self.fixture)?;
        if *config == expected.config {
            return Ok(());
        }
        Err(HarnessError::FixtureMismatch {
            fixture: self.fixture.clone(),
            loaded: format!("{:?}", config),
            expected: format!("{:?}", expected.config),
        })
    }
}

impl<C> Drop for ConfigHarness<C> {
    fn drop(&mut self) {
        for path in self.loader.paths().candidates() {
            if path.exists()
                && !same_file(&path, &self.fixture)
                && let Err(e) = std::fs::remove_file(&path)
            {
                warn!(path = %path.display(), "Failed to remove staged config: {}", e);
            }
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn render(format: ConfigFormat, document: &Value, fixture: &Path) -> Result<String, HarnessError> {
    format.render(document).map_err(|message| {
        HarnessError::Config(ConfigError::Malformed {
            path: fixture.to_path_buf(),
            format,
            message,
        })
    })
}
