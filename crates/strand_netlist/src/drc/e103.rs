//! E103: Label is a component name. Collides with a generated entity.

use std::collections::HashSet;

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E103};
use crate::label::label_key;

/// Rejects labels equal to the entity name of any component on the sheet.
///
/// Sub-circuit instances are named after their sheet, so an instance labelled
/// like the sheet it instantiates is caught here too.
pub struct LabelIsComponentName;

impl DrcRule for LabelIsComponentName {
    fn code(&self) -> DiagnosticCode {
        E103
    }

    fn name(&self) -> &str {
        "label-is-component-name"
    }

    fn description(&self) -> &str {
        "label equals the entity name of a component or sheet"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        let names: HashSet<String> = ctx
            .hdl_components()
            .map(|(_, c)| label_key(&ctx.schematic.hdl_name(c)))
            .filter(|n| !n.is_empty())
            .collect();
        for (id, comp) in ctx.hdl_components() {
            if comp.is_unlabelled() {
                continue;
            }
            if names.contains(&label_key(&comp.label)) {
                sink.emit(errors::error_label_is_component_name(
                    ctx.name(),
                    &comp.label,
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
    use strand_schematic::{Component, GateKind, Location, Schematic};

    #[test]
    fn label_named_after_gate_entity() {
        let (s, main) = sheet(vec![
            Component::gate(GateKind::And, &[Location::new(0, 0)], Location::new(20, 0), 1),
            Component::input_pin("and_gate", Location::new(0, 40), 1),
        ]);
        let diags = run(&LabelIsComponentName, &s, main, HdlDialect::Vhdl);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("and_gate"));
    }

    #[test]
    fn instance_named_after_its_sheet() {
        let mut s = Schematic::new();
        let top = s.add_circuit("top");
        let alu = s.add_circuit("alu");
        s.add_component(alu, Component::input_pin("a", Location::new(0, 0), 1));
        s.instantiate(top, alu, "ALU", &[("a", Location::new(0, 0))])
            .expect("pin exists");
        let diags = run(&LabelIsComponentName, &s, top, HdlDialect::Vhdl);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, E103);
    }

    #[test]
    fn ordinary_labels_pass() {
        let (s, main) = sheet(vec![
            Component::gate(GateKind::Or, &[Location::new(0, 0)], Location::new(20, 0), 1),
            Component::input_pin("enable", Location::new(0, 40), 1),
        ]);
        assert!(run(&LabelIsComponentName, &s, main, HdlDialect::Vhdl).is_empty());
    }
}
