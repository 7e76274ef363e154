//! Shared pipeline helpers for CLI commands.
//!
//! Contains project root resolution, project loading (configuration plus
//! schematic), the validation step shared by every command, and the
//! reporting overrides from `[drc]` and the command line.

use std::path::{Path, PathBuf};

use strand_config::{ConfigError, DrcConfig, ProjectConfig, CONFIG_FILE};
use strand_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use strand_netlist::{AnalysisOptions, DrcStatus, NetlistStore};
use strand_schematic::{CircuitId, Schematic};
use tracing::debug;

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `strand.toml`.
///
/// Returns the directory containing `strand.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `strand.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        let cwd = std::env::current_dir()?;
        find_project_root(&cwd)
    }
}

/// A loaded project: its configuration, schematic and chosen top circuit.
pub struct Project {
    /// The project directory.
    pub dir: PathBuf,
    /// The parsed `strand.toml`.
    pub config: ProjectConfig,
    /// The schematic named by the configuration.
    pub schematic: Schematic,
    /// The top-level circuit to validate.
    pub top: CircuitId,
}

/// Loads the project from the resolved root.
///
/// `top_override` replaces the configured top circuit. Without either, the
/// schematic's own top circuit is used.
pub fn load_project(
    global: &GlobalArgs,
    top_override: Option<&str>,
) -> Result<Project, Box<dyn std::error::Error>> {
    let dir = resolve_project_root(global)?;
    let config = strand_config::load_config(&dir)?;
    let schematic_path = dir.join(&config.project.schematic);
    let schematic = Schematic::load(&schematic_path)
        .map_err(|e| format!("{}: {e}", schematic_path.display()))?;
    let top = resolve_top(&schematic, top_override.or(config.project.top.as_deref()))?;
    debug!(
        project = %config.project.name,
        schematic = %schematic_path.display(),
        "loaded project"
    );
    Ok(Project {
        dir,
        config,
        schematic,
        top,
    })
}

/// Finds the top circuit by name, or falls back to the schematic's top.
fn resolve_top(schematic: &Schematic, name: Option<&str>) -> Result<CircuitId, ConfigError> {
    match name {
        Some(name) => schematic
            .circuit_by_name(name)
            .ok_or_else(|| ConfigError::UnknownCircuit(name.to_string())),
        None => schematic
            .top()
            .ok_or_else(|| ConfigError::MissingField("project.top".to_string())),
    }
}

/// Validates the project's hierarchy and returns the store, the overall
/// status and every diagnostic reported.
pub fn validate_project(
    project: &Project,
) -> Result<(NetlistStore, DrcStatus, Vec<Diagnostic>), Box<dyn std::error::Error>> {
    let mut store = NetlistStore::new();
    let sink = DiagnosticSink::new();
    let mut options = AnalysisOptions::new(project.config.hdl.dialect)
        .with_progress(|sheet, milestone| debug!(sheet, %milestone, "progress"));
    let status = store.validate(&project.schematic, project.top, &mut options, &sink)?;
    Ok((store, status, sink.take_all()))
}

/// Reporting overrides, merged from `[drc]` and the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Warning codes that are dropped.
    pub allow: Vec<DiagnosticCode>,
    /// Warning codes that are reported as errors.
    pub deny: Vec<DiagnosticCode>,
    /// Whether severe warnings are reported as errors.
    pub strict: bool,
}

/// Merges the `[drc]` table with CLI `--allow`/`--deny`/`--strict`.
///
/// A code given on the command line is removed from the opposite list.
pub fn merge_overrides(
    config: &DrcConfig,
    allow_args: &[String],
    deny_args: &[String],
    strict: bool,
) -> Result<Overrides, Box<dyn std::error::Error>> {
    let mut allow: Vec<String> = config.allow.clone();
    let mut deny: Vec<String> = config.deny.clone();

    for code in deny_args {
        allow.retain(|c| c != code);
        if !deny.contains(code) {
            deny.push(code.clone());
        }
    }
    for code in allow_args {
        deny.retain(|c| c != code);
        if !allow.contains(code) {
            allow.push(code.clone());
        }
    }

    Ok(Overrides {
        allow: parse_codes(&allow)?,
        deny: parse_codes(&deny)?,
        strict: strict || config.strict,
    })
}

fn parse_codes(codes: &[String]) -> Result<Vec<DiagnosticCode>, Box<dyn std::error::Error>> {
    let mut parsed = Vec::with_capacity(codes.len());
    for c in codes {
        let code = c
            .parse::<DiagnosticCode>()
            .map_err(|e| format!("invalid diagnostic code '{c}': {e}"))?;
        parsed.push(code);
    }
    Ok(parsed)
}

/// Applies `overrides` to `diags`. Only warnings are ever dropped or
/// promoted; errors stay errors.
pub fn apply_overrides(diags: Vec<Diagnostic>, overrides: &Overrides) -> Vec<Diagnostic> {
    diags
        .into_iter()
        .filter(|d| !(d.severity.is_warning() && overrides.allow.contains(&d.code)))
        .map(|mut d| {
            let promote = match d.severity {
                Severity::Warning => overrides.deny.contains(&d.code),
                Severity::SevereWarning => overrides.strict || overrides.deny.contains(&d.code),
                _ => false,
            };
            if promote {
                d.severity = Severity::Error;
            }
            d
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use strand_diagnostics::Category;

    fn code(s: &str) -> DiagnosticCode {
        s.parse().unwrap()
    }

    #[test]
    fn find_project_root_in_current() {
        let dir = write_project(&passthrough(), "");
        let root = find_project_root(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let dir = write_project(&passthrough(), "");
        let sub = dir.path().join("sheets");
        std::fs::create_dir_all(&sub).unwrap();
        let root = find_project_root(&sub).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(find_project_root(dir.path()).is_err());
    }

    #[test]
    fn resolve_config_file_uses_parent() {
        let dir = write_project(&passthrough(), "");
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().join("strand.toml").to_string_lossy().into_owned()),
        };
        assert_eq!(resolve_project_root(&global).unwrap(), dir.path());
    }

    #[test]
    fn load_project_uses_schematic_top() {
        let dir = write_project(&passthrough(), "");
        let project = load_project(&global_for(&dir), None).unwrap();
        assert_eq!(project.schematic.circuit(project.top).name(), "main");
        assert_eq!(project.config.project.name, "demo");
    }

    #[test]
    fn load_project_unknown_top() {
        let dir = write_project(&passthrough(), "top = \"nowhere\"\n");
        let err = load_project(&global_for(&dir), None).err().unwrap();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn load_project_missing_schematic() {
        let dir = write_project(&passthrough(), "");
        std::fs::remove_file(dir.path().join("design.json")).unwrap();
        let err = load_project(&global_for(&dir), None).err().unwrap();
        assert!(err.to_string().contains("design.json"));
    }

    #[test]
    fn validate_project_passes_clean_design() {
        let dir = write_project(&clocked(), "");
        let project = load_project(&global_for(&dir), None).unwrap();
        let (store, status, diags) = validate_project(&project).unwrap();
        assert!(status.is_passed(), "{diags:?}");
        assert_eq!(store.clock_sources().len(), 1);
        assert!(diags.iter().all(|d| !d.severity.is_error()));
    }

    #[test]
    fn merge_cli_overrides_config() {
        let config = DrcConfig {
            allow: vec!["W207".into()],
            deny: vec!["W208".into()],
            strict: false,
        };
        let merged = merge_overrides(&config, &["W208".into()], &["W207".into()], false).unwrap();
        assert_eq!(merged.allow, vec![code("W208")]);
        assert_eq!(merged.deny, vec![code("W207")]);
        assert!(!merged.strict);
    }

    #[test]
    fn merge_rejects_bad_code() {
        let err = merge_overrides(&DrcConfig::default(), &["bogus".into()], &[], false).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn overrides_only_touch_warnings() {
        let w = code("W207");
        let e = DiagnosticCode {
            category: Category::Error,
            number: 204,
        };
        let diags = vec![
            Diagnostic::warning(w, "unused"),
            Diagnostic::severe(code("W303"), "gated"),
            Diagnostic::error(e, "short"),
        ];
        let overrides = Overrides {
            allow: vec![w, e],
            deny: Vec::new(),
            strict: true,
        };
        let out = apply_overrides(diags, &overrides);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].severity, Severity::Error);
        assert_eq!(out[1].code, e);
    }

    #[test]
    fn deny_promotes_warning() {
        let w = code("W208");
        let overrides = Overrides {
            deny: vec![w],
            ..Overrides::default()
        };
        let out = apply_overrides(vec![Diagnostic::warning(w, "dangling")], &overrides);
        assert_eq!(out[0].severity, Severity::Error);
    }
}
