//! E101: Unsupported component. Cannot be generated for the target dialect.

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E101};

/// Rejects components with no HDL counterpart, such as simulation-only
/// terminals and loggers.
pub struct UnsupportedComponent;

impl DrcRule for UnsupportedComponent {
    fn code(&self) -> DiagnosticCode {
        E101
    }

    fn name(&self) -> &str {
        "unsupported-component"
    }

    fn description(&self) -> &str {
        "component cannot be generated for the target HDL"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        let dialect = ctx.dialect.to_string();
        for (id, comp) in ctx.hdl_components() {
            if !comp.kind.hdl_supported(ctx.dialect) {
                sink.emit(errors::error_unsupported_component(
                    ctx.name(),
                    &comp.kind.display_name(),
                    &dialect,
                    id.as_raw(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::test_util::{run, sheet};
    use strand_config::HdlDialect;
    use strand_schematic::{Component, GateKind, Location};

    #[test]
    fn flags_simulation_only() {
        let (s, main) = sheet(vec![
            Component::simulation_only("TTY", Location::new(0, 0), 7),
            Component::gate(GateKind::Not, &[Location::new(0, 20)], Location::new(20, 20), 1),
        ]);
        let diags = run(&UnsupportedComponent, &s, main, HdlDialect::Verilog);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("TTY"));
        assert!(diags[0].message.contains("Verilog"));
    }

    #[test]
    fn rule_metadata() {
        assert_eq!(UnsupportedComponent.name(), "unsupported-component");
        assert_eq!(format!("{}", UnsupportedComponent.code()), "E101");
    }
}
