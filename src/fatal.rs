//! Fatal configuration failure handling.
//!
//! The loader never exits the process itself. It reports each failure to a
//! [`FatalHandler`] exactly once and returns the error; the handler decides
//! what a fatal failure means. Production wires in [`ExitOnFatal`], tests
//! wire in a [`FatalRecorder`] and assert on what it captured.

use std::sync::Mutex;
use tracing::error;

use crate::error::ConfigError;
use crate::harness::HarnessError;

/// Receives unrecoverable configuration failures.
pub trait FatalHandler: Send + Sync {
    fn on_fatal(&self, error: &ConfigError);
}

/// Logs the failure and terminates the process with the error's exit code.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitOnFatal;

impl FatalHandler for ExitOnFatal {
    fn on_fatal(&self, err: &ConfigError) {
        error!(kind = %err.kind(), "Invalid configuration, exiting: {}", err);
        eprintln!("Error: {}", err);
        std::process::exit(err.exit_code());
    }
}

/// Records fatal failures instead of terminating.
#[derive(Debug, Default)]
pub struct FatalRecorder {
    errors: Mutex<Vec<String>>,
}

impl FatalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the fatal path was taken.
    pub fn calls(&self) -> usize {
        self.lock().len()
    }

    pub fn was_called(&self) -> bool {
        self.calls() > 0
    }

    /// Messages of every recorded failure, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Stop intercepting. Fails loudly if anything was recorded so a swallowed
    /// load failure cannot go unnoticed.
    pub fn release(&self) -> Result<(), HarnessError> {
        let mut errors = self.lock();
        if errors.is_empty() {
            return Ok(());
        }
        let recorded = std::mem::take(&mut *errors);
        Err(HarnessError::FatalInvoked {
            calls: recorded.len(),
            errors: recorded,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // Poisoning leaves the list intact.
        self.errors.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FatalHandler for FatalRecorder {
    fn on_fatal(&self, err: &ConfigError) {
        self.lock().push(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn not_found() -> ConfigError {
        ConfigError::NotFound {
            path: PathBuf::from("config.json"),
        }
    }

    #[test]
    fn test_recorder_counts_calls() {
        let recorder = FatalRecorder::new();
        assert!(!recorder.was_called());

        recorder.on_fatal(&not_found());
        recorder.on_fatal(&not_found());

        assert_eq!(recorder.calls(), 2);
        assert!(recorder.errors()[0].contains("config.json"));
    }

    #[test]
    fn test_release_clean() {
        let recorder = FatalRecorder::new();
        assert!(recorder.release().is_ok());
    }

    #[test]
    fn test_release_after_fatal_fails() {
        let recorder = FatalRecorder::new();
        recorder.on_fatal(&not_found());

        match recorder.release() {
            Err(HarnessError::FatalInvoked { calls, errors }) => {
                assert_eq!(calls, 1);
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected FatalInvoked, got {:?}", other),
        }

        // Released state is clean again.
        assert!(!recorder.was_called());
        assert!(recorder.release().is_ok());
    }
}
