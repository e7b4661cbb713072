//! Shared handle to the currently loaded configuration.
//!
//! The store is either unloaded or holds one fully validated configuration.
//! Values are swapped in whole via `ArcSwapOption`, so readers get a
//! consistent snapshot without locking and never see a half-applied config.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::files::ConfigFormat;

/// A validated configuration together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig<C> {
    pub config: C,
    /// File the configuration was read from
    pub source: PathBuf,
    pub format: ConfigFormat,
    pub loaded_at: DateTime<Utc>,
}

impl<C> LoadedConfig<C> {
    pub fn new(config: C, source: PathBuf, format: ConfigFormat) -> Self {
        Self {
            config,
            source,
            format,
            loaded_at: Utc::now(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Cloneable handle to the configuration state.
///
/// Clones share the same underlying slot. Application code reads through
/// [`ConfigStore::get`]; only the loader writes.
pub struct ConfigStore<C> {
    current: Arc<ArcSwapOption<LoadedConfig<C>>>,
}

impl<C> Clone for ConfigStore<C> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<C> Default for ConfigStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for ConfigStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.current.load_full();
        f.debug_struct("ConfigStore")
            .field("loaded", &current.is_some())
            .field("source", &current.as_ref().map(|c| c.source.clone()))
            .finish()
    }
}

impl<C> ConfigStore<C> {
    /// Create an unloaded store.
    pub fn new() -> Self {
        Self {
            current: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Snapshot of the current configuration, or `None` when unloaded.
    ///
    /// Never triggers a load.
    pub fn get(&self) -> Option<Arc<LoadedConfig<C>>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Clear back to unloaded. Calling this on an unloaded store is a no-op.
    pub fn reset(&self) {
        if self.current.swap(None).is_some() {
            tracing::debug!("Config store reset");
        }
    }

    /// Replace the current configuration. Last write wins.
    pub(crate) fn set(&self, loaded: Arc<LoadedConfig<C>>) -> Option<Arc<LoadedConfig<C>>> {
        self.current.swap(Some(loaded))
    }
}

impl<C: Clone> ConfigStore<C> {
    /// Clone of the current typed configuration, without load metadata.
    pub fn config(&self) -> Option<C> {
        self.current.load_full().map(|c| c.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(value: u32) -> Arc<LoadedConfig<u32>> {
        Arc::new(LoadedConfig::new(
            value,
            PathBuf::from("config.json"),
            ConfigFormat::Json,
        ))
    }

    #[test]
    fn test_new_store_is_unloaded() {
        let store: ConfigStore<u32> = ConfigStore::new();
        assert!(!store.is_loaded());
        assert!(store.get().is_none());
        assert!(store.config().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let store = ConfigStore::new();
        assert!(store.set(loaded(7)).is_none());

        let current = store.get().unwrap();
        assert_eq!(current.config, 7);
        assert_eq!(current.source(), Path::new("config.json"));
        assert_eq!(store.config(), Some(7));
    }

    #[test]
    fn test_set_replaces_previous() {
        let store = ConfigStore::new();
        store.set(loaded(1));
        let previous = store.set(loaded(2)).unwrap();

        assert_eq!(previous.config, 1);
        assert_eq!(store.config(), Some(2));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let store = ConfigStore::new();
        store.set(loaded(1));

        store.reset();
        assert!(!store.is_loaded());
        store.reset();
        assert!(!store.is_loaded());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_snapshot_survives_reset() {
        let store = ConfigStore::new();
        store.set(loaded(5));
        let snapshot = store.get().unwrap();

        store.reset();
        assert_eq!(snapshot.config, 5);
        assert!(store.get().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ConfigStore::new();
        let reader = store.clone();

        store.set(loaded(3));
        assert_eq!(reader.config(), Some(3));

        reader.reset();
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_concurrent_readers_see_whole_values() {
        let store = ConfigStore::new();
        store.set(loaded(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(current) = reader.get() {
                            assert!(current.config < 100);
                        }
                    }
                })
            })
            .collect();

        for i in 1..100 {
            store.set(loaded(i));
            if i % 10 == 0 {
                store.reset();
            }
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
