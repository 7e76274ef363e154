//! E104: Invalid label. Not an identifier of the target dialect.

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E104};
use crate::label::is_valid_label;

/// Checks that every label, once normalised, is a legal identifier that is
/// not a reserved word.
pub struct InvalidLabel;

impl DrcRule for InvalidLabel {
    fn code(&self) -> DiagnosticCode {
        E104
    }

    fn name(&self) -> &str {
        "invalid-label"
    }

    fn description(&self) -> &str {
        "label is not a valid identifier in the target HDL"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        let dialect = ctx.dialect.to_string();
        for (id, comp) in ctx.hdl_components() {
            if comp.is_unlabelled() || is_valid_label(&comp.label, ctx.dialect) {
                continue;
            }
            sink.emit(errors::error_invalid_label(
                ctx.name(),
                &comp.label,
                &dialect,
                id.as_raw(),
            ));
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
    fn reserved_words_depend_on_dialect() {
        let (s, main) = sheet(vec![Component::input_pin("signal", Location::new(0, 0), 1)]);
        assert_eq!(run(&InvalidLabel, &s, main, HdlDialect::Vhdl).len(), 1);
        assert!(run(&InvalidLabel, &s, main, HdlDialect::Verilog).is_empty());

        let (s, main) = sheet(vec![Component::input_pin("wire", Location::new(0, 0), 1)]);
        assert!(run(&InvalidLabel, &s, main, HdlDialect::Vhdl).is_empty());
        assert_eq!(run(&InvalidLabel, &s, main, HdlDialect::Verilog).len(), 1);
    }

    #[test]
    fn vhdl_rejects_trailing_underscore() {
        let (s, main) = sheet(vec![Component::output_pin("out_", Location::new(0, 0), 1)]);
        let diags = run(&InvalidLabel, &s, main, HdlDialect::Vhdl);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("VHDL"));
    }

    #[test]
    fn unlabelled_components_are_skipped() {
        let (s, main) = sheet(vec![Component::constant(0, Location::new(0, 0), 1)]);
        assert!(run(&InvalidLabel, &s, main, HdlDialect::Vhdl).is_empty());
    }
}
