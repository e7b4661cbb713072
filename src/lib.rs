//! Configuration lifecycle library.
//!
//! Loads a JSON or YAML configuration from a well-known location, validates
//! it, and exposes it through a resettable store. Includes a fixture harness
//! for tests that need a loaded configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod fatal;
pub mod harness;
pub mod logging;
