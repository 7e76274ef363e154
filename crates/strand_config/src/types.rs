//! Configuration types deserialized from `strand.toml`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The top-level project configuration parsed from `strand.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Target HDL settings.
    #[serde(default)]
    pub hdl: HdlConfig,
    /// Design rule check reporting settings.
    #[serde(default)]
    pub drc: DrcConfig,
}

/// Core project metadata required in every `strand.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
    /// Path of the schematic JSON file, relative to the project directory.
    pub schematic: String,
    /// Name of the top-level circuit; defaults to the schematic's own top.
    #[serde(default)]
    pub top: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// The HDL dialect the validated netlist will be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdlDialect {
    /// VHDL: case-insensitive identifiers, no `__`, no trailing `_`.
    #[default]
    Vhdl,
    /// Verilog: case-sensitive identifiers.
    Verilog,
}

impl fmt::Display for HdlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdlDialect::Vhdl => write!(f, "VHDL"),
            HdlDialect::Verilog => write!(f, "Verilog"),
        }
    }
}

/// HDL settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HdlConfig {
    /// Target dialect.
    #[serde(default)]
    pub dialect: HdlDialect,
}

/// Reporting overrides applied to diagnostics after validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrcConfig {
    /// Warning codes that are not reported.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Warning codes that are reported as errors.
    #[serde(default)]
    pub deny: Vec<String>,
    /// Whether severe warnings fail the check.
    #[serde(default)]
    pub strict: bool,
}
