//! E105: Duplicate label. Two components on one sheet share a name.

use std::collections::HashMap;

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};
use strand_schematic::ComponentId;

use super::{DrcContext, DrcRule};
use crate::errors::{self, E105};
use crate::label::label_key;

/// Rejects labels used by more than one component. Labels are compared
/// after normalisation and without regard to case.
pub struct DuplicateLabel;

impl DrcRule for DuplicateLabel {
    fn code(&self) -> DiagnosticCode {
        E105
    }

    fn name(&self) -> &str {
        "duplicate-label"
    }

    fn description(&self) -> &str {
        "two components on one sheet share a label"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        let mut first: HashMap<String, ComponentId> = HashMap::new();
        for (id, comp) in ctx.hdl_components() {
            if comp.is_unlabelled() {
                continue;
            }
            match first.get(&label_key(&comp.label)) {
                Some(prev) => sink.emit(errors::error_duplicate_label(
                    ctx.name(),
                    &comp.label,
                    id.as_raw(),
                    prev.as_raw(),
                )),
                None => {
                    first.insert(label_key(&comp.label), id);
                }
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
    fn case_insensitive_duplicates() {
        let (s, main) = sheet(vec![
            Component::input_pin("Data", Location::new(0, 0), 1),
            Component::output_pin("DATA", Location::new(0, 20), 1),
            Component::output_pin("data", Location::new(0, 40), 1),
        ]);
        let diags = run(&DuplicateLabel, &s, main, HdlDialect::Vhdl);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.code == E105));
    }

    #[test]
    fn tunnels_may_share_labels() {
        let (s, main) = sheet(vec![
            Component::tunnel("clk", Location::new(0, 0), 1),
            Component::tunnel("clk", Location::new(0, 20), 1),
        ]);
        assert!(run(&DuplicateLabel, &s, main, HdlDialect::Vhdl).is_empty());
    }
}
