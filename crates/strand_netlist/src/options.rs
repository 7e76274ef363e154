//! Analysis options and progress milestones.

use std::fmt;

use strand_config::HdlDialect;

/// A fixed point in netlist construction, reported to the progress callback.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Milestone {
    /// Wires were grouped into nets.
    NetsAggregated,
    /// Wireless nets between touching ends were created.
    HiddenNetsDetected,
    /// Same-labelled tunnels were merged.
    TunnelsMerged,
    /// The splitter hierarchy was built.
    SplittersResolved,
    /// Every component end was bound to its root nets.
    RolesAssigned,
    /// Forced-root nets were linked through their splitters.
    ComplexSplittersResolved,
    /// Clock ids were propagated through the hierarchy.
    ClockTreeTraced,
    /// Board I/O bubbles were numbered.
    HierarchyBuilt,
    /// Clock inputs were checked for gating.
    GatedClocksChecked,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Milestone::NetsAggregated => "nets aggregated",
            Milestone::HiddenNetsDetected => "hidden nets detected",
            Milestone::TunnelsMerged => "tunnels merged",
            Milestone::SplittersResolved => "splitters resolved",
            Milestone::RolesAssigned => "roles assigned",
            Milestone::ComplexSplittersResolved => "complex splitters resolved",
            Milestone::ClockTreeTraced => "clock tree traced",
            Milestone::HierarchyBuilt => "hierarchy built",
            Milestone::GatedClocksChecked => "gated clocks checked",
        };
        f.write_str(text)
    }
}

/// Settings for one validation run.
pub struct AnalysisOptions<'a> {
    /// Target dialect; decides label validity and component support.
    pub dialect: HdlDialect,
    progress: Option<Box<dyn FnMut(&str, Milestone) + 'a>>,
}

impl<'a> AnalysisOptions<'a> {
    /// Creates options for `dialect` without a progress callback.
    pub fn new(dialect: HdlDialect) -> Self {
        Self {
            dialect,
            progress: None,
        }
    }

    /// Installs a callback invoked with the sheet name at every milestone.
    pub fn with_progress(mut self, callback: impl FnMut(&str, Milestone) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub(crate) fn report(&mut self, circuit: &str, milestone: Milestone) {
        if let Some(progress) = self.progress.as_mut() {
            progress(circuit, milestone);
        }
    }
}

impl Default for AnalysisOptions<'_> {
    fn default() -> Self {
        Self::new(HdlDialect::default())
    }
}
