//! Parsing and validation of `strand.toml` project configuration files.
//!
//! The configuration names the schematic to analyse, the top-level circuit,
//! the HDL dialect whose identifier rules and component support the design
//! rule check enforces, and per-code overrides for reporting.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
