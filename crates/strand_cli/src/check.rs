//! `strand check`: design rule check of a whole hierarchy.
//!
//! The pipeline:
//!
//! 1. Find project root (walk up looking for `strand.toml`)
//! 2. Load config and schematic
//! 3. Validate the hierarchy below the top circuit
//! 4. Apply `[drc]` and command-line reporting overrides
//! 5. Render diagnostics

use strand_diagnostics::{Diagnostic, DiagnosticRenderer, Severity, TerminalRenderer};

use crate::pipeline::{apply_overrides, load_project, merge_overrides, validate_project};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `strand check` command.
///
/// Returns exit code 0 if the hierarchy passed and no error was reported,
/// 1 otherwise.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global, args.top.as_deref())?;
    let top_name = project.schematic.circuit(project.top).name().to_string();

    if !global.quiet {
        eprintln!(
            "   Checking {} v{} (top `{}`, {})",
            project.config.project.name, project.config.project.version, top_name, project.config.hdl.dialect
        );
    }

    let overrides = merge_overrides(&project.config.drc, &args.allow, &args.deny, args.strict)?;
    let (_, status, diagnostics) = validate_project(&project)?;
    let diagnostics = apply_overrides(diagnostics, &overrides);
    let shown: Vec<&Diagnostic> = diagnostics
        .iter()
        .filter(|d| global.verbose || d.severity != Severity::Info)
        .collect();

    match args.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &shown {
                eprintln!("{}", renderer.render(diag, &project.schematic));
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&shown).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }

    let error_count = diagnostics.iter().filter(|d| d.severity.is_error()).count();
    let warning_count = diagnostics.iter().filter(|d| d.severity.is_warning()).count();

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Result: {} ({} error(s), {} warning(s))",
            status, error_count, warning_count
        );
    }

    if !status.is_passed() || error_count > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
