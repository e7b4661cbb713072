//! config-lifecycle
//!
//! Loads the application configuration from its well-known location and
//! exits on any failure. Useful as a pre-flight check before starting the
//! application, or to inspect the validated result.

use anyhow::Result;
use clap::Parser;
use config_lifecycle::cli::{Cli, Command};
use config_lifecycle::config::{Config, ConfigFormat, ConfigLoader, ConfigPaths, ConfigStore};
use config_lifecycle::fatal::ExitOnFatal;
use config_lifecycle::logging::{LogTarget, init_logging};
use std::sync::Arc;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let paths = cli.config_paths();
    debug!("Config paths: {:?}", paths);

    match cli.command {
        Some(Command::Paths) => print_paths(&paths),
        Some(Command::Show { format }) => {
            let loader = build_loader(paths);
            let loaded = loader.check()?;
            let document = serde_json::to_value(&loaded.config)?;
            let rendered = ConfigFormat::from(format)
                .render(&document)
                .map_err(anyhow::Error::msg)?;
            println!("{}", rendered.trim_end());
        }
        Some(Command::Check) | None => {
            let loader = build_loader(paths);
            let loaded = loader.check()?;
            println!("OK {} ({})", loaded.source.display(), loaded.format);
        }
    }

    Ok(())
}

fn build_loader(paths: ConfigPaths) -> ConfigLoader<Config> {
    ConfigLoader::new(paths, ConfigStore::new(), Arc::new(ExitOnFatal))
}

fn print_paths(paths: &ConfigPaths) {
    if let Some(ref explicit) = paths.explicit {
        let state = if explicit.exists() { "present" } else { "missing" };
        println!("{} (explicit, {})", explicit.display(), state);
        return;
    }
    for path in paths.candidates() {
        let state = if path.exists() { "present" } else { "missing" };
        println!("{} ({})", path.display(), state);
    }
}
