//! E110: Invalid sub-circuit name. The sheet cannot become an entity.

use std::collections::HashSet;

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E110};
use crate::label::is_valid_identifier;

/// Checks that every instantiated sheet has a name usable as an entity name.
/// Each offending sheet is reported once per parent sheet.
pub struct InvalidSubcircuitName;

impl DrcRule for InvalidSubcircuitName {
    fn code(&self) -> DiagnosticCode {
        E110
    }

    fn name(&self) -> &str {
        "invalid-subcircuit-name"
    }

    fn description(&self) -> &str {
        "instantiated sheet name is not a valid identifier"
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        let dialect = ctx.dialect.to_string();
        let mut reported = HashSet::new();
        for (id, comp) in ctx.hdl_components() {
            let Some(child) = comp.kind.subcircuit() else {
                continue;
            };
            let Some(sheet) = ctx.schematic.try_circuit(child) else {
                continue;
            };
            if is_valid_identifier(sheet.name(), ctx.dialect) || !reported.insert(child) {
                continue;
            }
            sink.emit(errors::error_invalid_subcircuit_name(
                ctx.name(),
                sheet.name(),
                &dialect,
                id.as_raw(),
            ));
        }
    }
}
