//! E106: Tri-state driver. Cannot be expressed in the generated netlist.

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E106};

/// Rejects components that drive a high-impedance output.
pub struct TriStateDriver;

impl DrcRule for TriStateDriver {
    fn code(&self) -> DiagnosticCode {
        E106
    }

    fn name(&self) -> &str {
        "tri-state-driver"
    }

    fn description(&self) -> &str {
        "component drives a tri-state output"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        for (id, comp) in ctx.hdl_components() {
            if comp.kind.has_tri_state_driver() {
                sink.emit(errors::error_tri_state(
                    ctx.name(),
                    &comp.kind.display_name(),
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
    use strand_schematic::{Component, Location};

    #[test]
    fn controlled_buffer_is_rejected() {
        let (s, main) = sheet(vec![
            Component::controlled_buffer(Location::new(0, 0), Location::new(10, 10), Location::new(20, 0)),
            Component::multiplexer(
                &[Location::new(0, 40), Location::new(0, 50)],
                Location::new(10, 60),
                1,
                Location::new(20, 45),
                1,
            ),
        ]);
        let diags = run(&TriStateDriver, &s, main, HdlDialect::Vhdl);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("controlled buffer"));
    }
}
