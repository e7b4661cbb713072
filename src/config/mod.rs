//! Configuration lifecycle.
//!
//! A configuration file is located in one of two well-known places,
//! loaded, validated and published to a [`ConfigStore`]:
//!
//! ```text
//! <dir>/<stem>.json | <dir>/<stem>.yaml
//!     → files.rs (locate, detect format)
//!     → loader.rs (parse, deserialize, validate)
//!     → store.rs (atomic swap, read-only snapshots)
//! ```
//!
//! A failed load never reaches the store. It is reported to the loader's
//! [`FatalHandler`](crate::fatal::FatalHandler), which in production exits
//! the process.
//!
//! ## Environment Variables
//! - `CONFIG_LIFECYCLE_PATH` - Explicit config file (skips discovery)
//! - `CONFIG_LIFECYCLE_DIR` - Directory holding the config files (default: `.`)
//! - `CONFIG_LIFECYCLE_STEM` - Config file name without extension (default: `config`)

mod files;
mod loader;
mod store;
mod types;
mod validation;

pub use files::{
    ConfigFormat, ConfigPaths, DEFAULT_STEM, ENV_CONFIG_DIR, ENV_CONFIG_PATH, ENV_CONFIG_STEM,
};
pub use loader::{ConfigLoader, read_config, read_document};
pub use store::{ConfigStore, LoadedConfig};
pub use types::*;
pub use validation::{ConfigSchema, ValidationError};
