//! E102: Missing label. Pins, instances and board I/O need a name.

use strand_diagnostics::{DiagnosticCode, DiagnosticSink};

use super::{DrcContext, DrcRule};
use crate::errors::{self, E102};
use crate::status::DrcStatus;

/// Requires a non-blank label on every component that becomes a named port
/// or instance in the generated HDL.
pub struct MissingLabel;

impl DrcRule for MissingLabel {
    fn code(&self) -> DiagnosticCode {
        E102
    }

    fn name(&self) -> &str {
        "missing-label"
    }

    fn description(&self) -> &str {
        "component requires a label but has none"
    }

    fn failure(&self) -> DrcStatus {
        DrcStatus::ERROR | DrcStatus::ANNOTATE_REQUIRED
    }

    fn check(&self, ctx: &DrcContext<'_>, sink: &DiagnosticSink) {
        for (id, comp) in ctx.hdl_components() {
            if comp.kind.requires_label() && comp.is_unlabelled() {
                sink.emit(errors::error_missing_label(
                    ctx.name(),
                    &comp.kind.display_name(),
                    id.as_raw(),
                ));
            }
        }
    }
}
