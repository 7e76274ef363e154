//! The netlist store: validates a sheet hierarchy bottom-up and runs the
//! design-wide clock and board I/O analyses on its top sheet.
//!
//! Every sheet is netlisted once no matter how often it is instantiated.
//! Netlists are cached between runs and rebuilt only when their sheet or one
//! of the sheets they instantiate changed.

use std::collections::{HashMap, HashSet};

use strand_common::{ContentHash, Ident, InternalError, Interner, StrandResult};
use strand_config::HdlDialect;
use strand_diagnostics::DiagnosticSink;
use strand_schematic::{CircuitId, Schematic};
use tracing::{debug, info, warn};

use crate::builder::build_netlist;
use crate::clock::{ClockSources, ClockTracer};
use crate::component::{BubbleCounts, BubbleSpan, PortKind};
use crate::drc::{check_sheet_names, DrcContext, DrcEngine};
use crate::errors::{self, Aborted, Stage};
use crate::gated::GatedClockCheck;
use crate::netlist::Netlist;
use crate::options::{AnalysisOptions, Milestone};
use crate::path::HierarchyPath;
use crate::roles::{check_short_circuits, check_sinks_without_source, check_unconnected_inputs};
use crate::status::DrcStatus;

/// Outcome of checking one sheet during a validation run.
#[derive(Clone, Copy, Debug)]
struct Visit {
    status: DrcStatus,
    rebuilt: bool,
}

impl Visit {
    fn failed(status: DrcStatus) -> Self {
        Self {
            status,
            rebuilt: false,
        }
    }
}

/// State of one validation run.
struct Run<'s> {
    schematic: &'s Schematic,
    sink: &'s DiagnosticSink,
    visited: HashMap<CircuitId, Visit>,
    stack: Vec<CircuitId>,
}

/// Owns the netlists of every sheet and the design-wide clock sources.
pub struct NetlistStore {
    netlists: HashMap<CircuitId, Netlist>,
    clock_sources: ClockSources,
    interner: Interner,
    drc: DrcEngine,
    dialect: Option<HdlDialect>,
}

impl NetlistStore {
    /// Creates an empty store running the built-in design rules.
    pub fn new() -> Self {
        Self::with_engine(DrcEngine::new())
    }

    /// Creates an empty store running the rules of `drc`.
    pub fn with_engine(drc: DrcEngine) -> Self {
        Self {
            netlists: HashMap::new(),
            clock_sources: ClockSources::default(),
            interner: Interner::new(),
            drc,
            dialect: None,
        }
    }

    /// Validates the hierarchy below `top` and builds every netlist in it.
    ///
    /// Sheets are checked children first. A sheet whose children failed is
    /// left `REQUIRED` and the children's status is passed up. Only when the
    /// whole hierarchy passed are clock trees traced, board I/O bubbles
    /// numbered and clock inputs checked for gating.
    ///
    /// Netlists built for another dialect are rebuilt. Problems in the
    /// schematic are reported to `sink` and reflected in the returned status;
    /// `Err` means `top` is not a sheet of `schematic`.
    pub fn validate(
        &mut self,
        schematic: &Schematic,
        top: CircuitId,
        options: &mut AnalysisOptions<'_>,
        sink: &DiagnosticSink,
    ) -> StrandResult<DrcStatus> {
        let top_sheet = schematic
            .try_circuit(top)
            .ok_or_else(|| InternalError::new(format!("top sheet {top} does not exist")))?;
        info!(top = top_sheet.name(), dialect = %options.dialect, "validating hierarchy");
        if self.dialect.is_some_and(|d| d != options.dialect) {
            debug!(dialect = %options.dialect, "dialect changed, rebuilding every sheet");
            self.invalidate_all();
        }
        self.dialect = Some(options.dialect);
        self.refresh(schematic);

        let names = check_sheet_names(schematic, top, sink);
        if !names.is_passed() {
            self.clear_analysis();
            return Ok(names);
        }

        let mut run = Run {
            schematic,
            sink,
            visited: HashMap::new(),
            stack: Vec::new(),
        };
        let visit = self.check_circuit(&mut run, top, options);
        if !visit.status.is_passed() {
            warn!(top = top_sheet.name(), status = %visit.status, "hierarchy failed design rules");
            self.clear_analysis();
            return Ok(visit.status);
        }

        let status = match self.analyse_top(top, options, sink) {
            Ok(()) => DrcStatus::PASSED,
            Err(Aborted) => {
                warn!(top = top_sheet.name(), "top-level analysis aborted");
                self.clear_analysis();
                if let Some(nl) = self.netlists.get_mut(&top) {
                    nl.clear();
                    nl.status = DrcStatus::ERROR;
                }
                DrcStatus::ERROR
            }
        };
        Ok(status)
    }

    /// Marks every netlist whose sheet changed since its last build as
    /// `REQUIRED` and drops netlists of deleted sheets.
    pub fn refresh(&mut self, schematic: &Schematic) {
        self.netlists
            .retain(|&id, _| schematic.try_circuit(id).is_some());
        for (&id, nl) in self.netlists.iter_mut() {
            let Some(sheet) = schematic.try_circuit(id) else {
                continue;
            };
            if nl.revision != Some(sheet.revision()) || nl.name != sheet.name() {
                nl.mark_required();
            }
        }
    }

    /// Forces a rebuild of `circuit` on the next validation.
    pub fn invalidate(&mut self, circuit: CircuitId) {
        if let Some(nl) = self.netlists.get_mut(&circuit) {
            nl.mark_required();
        }
    }

    /// Forces a rebuild of every sheet on the next validation.
    pub fn invalidate_all(&mut self) {
        for nl in self.netlists.values_mut() {
            nl.mark_required();
        }
    }

    /// The netlist of `circuit`, if it was ever built.
    pub fn netlist(&self, circuit: CircuitId) -> Option<&Netlist> {
        self.netlists.get(&circuit)
    }

    /// DRC status of `circuit`; `REQUIRED` if it was never checked.
    pub fn status(&self, circuit: CircuitId) -> DrcStatus {
        self.netlists
            .get(&circuit)
            .map_or(DrcStatus::REQUIRED, Netlist::status)
    }

    /// Clock generators found by the last successful validation.
    pub fn clock_sources(&self) -> &ClockSources {
        &self.clock_sources
    }

    /// Number of distinct clock trees in the design.
    pub fn number_of_clock_trees(&self) -> usize {
        self.clock_sources.len()
    }

    /// Returns `true` if any component in the design needs the global clock.
    pub fn requires_global_clock(&self) -> bool {
        self.clock_sources.requires_global_clock()
    }

    /// The interner holding hierarchy path labels.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Builds a hierarchy path from instance labels.
    pub fn path(&self, labels: &[&str]) -> HierarchyPath {
        HierarchyPath::from_labels(&self.interner, labels.iter().copied())
    }

    /// Hash over the netlists of every sheet reachable from `top`.
    ///
    /// Validating an unchanged design twice gives the same fingerprint.
    pub fn fingerprint(&self, top: CircuitId) -> ContentHash {
        let mut order = vec![top];
        let mut i = 0;
        while i < order.len() {
            if let Some(nl) = self.netlists.get(&order[i]) {
                for sub in nl.subcircuits().filter_map(|c| c.subcircuit()) {
                    if !order.contains(&sub) {
                        order.push(sub);
                    }
                }
            }
            i += 1;
        }
        let hashes: Vec<ContentHash> = order
            .iter()
            .filter_map(|id| self.netlists.get(id))
            .map(Netlist::fingerprint)
            .collect();
        ContentHash::combine(&hashes)
    }

    /// Checks `circuit` and everything it instantiates, children first.
    ///
    /// Each sheet is checked at most once per run. Reaching a sheet that is
    /// still on the stack is a recursive instantiation.
    fn check_circuit(
        &mut self,
        run: &mut Run<'_>,
        circuit: CircuitId,
        options: &mut AnalysisOptions<'_>,
    ) -> Visit {
        if let Some(&visit) = run.visited.get(&circuit) {
            return visit;
        }
        let schematic = run.schematic;
        if let Some(pos) = run.stack.iter().position(|&c| c == circuit) {
            let mut chain: Vec<&str> = run.stack[pos..]
                .iter()
                .map(|&c| schematic.circuit(c).name())
                .collect();
            chain.push(schematic.circuit(circuit).name());
            run.sink.emit(errors::error_recursive_instantiation(&chain));
            return Visit::failed(DrcStatus::ERROR);
        }

        run.stack.push(circuit);
        let mut child_status = DrcStatus::PASSED;
        let mut child_rebuilt = false;
        for child in schematic.subcircuits_of(circuit) {
            let visit = self.check_circuit(run, child, options);
            child_status |= visit.status;
            child_rebuilt |= visit.rebuilt;
        }
        run.stack.pop();

        let visit = self.check_sheet(run, circuit, child_status, child_rebuilt, options);
        run.visited.insert(circuit, visit);
        visit
    }

    /// Runs the design rules on one sheet and builds its netlist.
    fn check_sheet(
        &mut self,
        run: &Run<'_>,
        circuit: CircuitId,
        child_status: DrcStatus,
        child_rebuilt: bool,
        options: &mut AnalysisOptions<'_>,
    ) -> Visit {
        let sheet = run.schematic.circuit(circuit);
        let name = sheet.name();
        let mut nl = self
            .netlists
            .remove(&circuit)
            .unwrap_or_else(|| Netlist::new(circuit, name));

        if !child_status.is_passed() {
            nl.clear();
            nl.name = name.to_string();
            self.netlists.insert(circuit, nl);
            return Visit::failed(child_status);
        }

        if !child_rebuilt && nl.is_valid() {
            debug!(sheet = name, "reusing netlist");
            self.netlists.insert(circuit, nl);
            return Visit {
                status: DrcStatus::PASSED,
                rebuilt: false,
            };
        }

        nl.clear();
        nl.name = name.to_string();
        let ctx = DrcContext::new(run.schematic, circuit, options.dialect);
        let rules = self.drc.run(&ctx, run.sink);
        if !rules.is_passed() {
            nl.status = rules;
            self.netlists.insert(circuit, nl);
            return Visit::failed(rules);
        }

        let status = match build_netlist(&mut nl, sheet, &self.netlists, run.sink, options) {
            Err(Aborted) => {
                warn!(sheet = name, "netlist construction aborted");
                DrcStatus::ERROR
            }
            Ok(()) if check_short_circuits(&nl, run.sink) => DrcStatus::ERROR,
            Ok(()) => {
                check_sinks_without_source(&nl, run.sink);
                check_unconnected_inputs(&nl, run.sink);
                DrcStatus::PASSED
            }
        };
        if status.is_passed() {
            nl.revision = Some(sheet.revision());
            run.sink.emit(errors::info_passed(name));
            info!(sheet = name, "sheet passed");
        } else {
            nl.clear();
        }
        nl.status = status;
        self.netlists.insert(circuit, nl);
        Visit {
            status,
            rebuilt: true,
        }
    }

    /// Clock tracing, board I/O numbering, the port check and gated clock
    /// detection on a fully built hierarchy.
    fn analyse_top(
        &mut self,
        top: CircuitId,
        options: &mut AnalysisOptions<'_>,
        sink: &DiagnosticSink,
    ) -> Stage<()> {
        let top_name = self
            .netlists
            .get(&top)
            .map(|nl| nl.name.clone())
            .unwrap_or_default();

        let mut trees =
            ClockTracer::new(&self.netlists, &self.interner, sink, &mut self.clock_sources).run(top)?;
        for (id, nl) in self.netlists.iter_mut() {
            nl.clock_tree = trees.remove(id).unwrap_or_default();
        }
        options.report(&top_name, Milestone::ClockTreeTraced);

        for nl in self.netlists.values_mut() {
            nl.local_bubbles = BubbleCounts::default();
            for comp in &mut nl.components {
                comp.clear_bubbles();
            }
        }
        let mut processed = HashSet::new();
        self.construct_hierarchy_tree(top, &mut processed);
        self.enumerate_global_bubbles(top, &HierarchyPath::root(), BubbleCounts::default());
        options.report(&top_name, Milestone::HierarchyBuilt);

        if let Some(nl) = self.netlists.get(&top) {
            let ports = nl.number_of_ports(PortKind::Input)
                + nl.number_of_ports(PortKind::Output)
                + nl.number_of_ports(PortKind::InOut);
            if ports == 0 && nl.local_bubbles.is_zero() {
                sink.emit(errors::error_no_ports(&top_name));
                return Err(Aborted);
            }
        }

        GatedClockCheck::new(&self.netlists, &self.interner, sink).detect_gated_clocks(top)?;
        options.report(&top_name, Milestone::GatedClocksChecked);

        info!(
            top = %top_name,
            clocks = self.clock_sources.len(),
            "hierarchy validated"
        );
        Ok(())
    }

    /// Assigns every sub-circuit instance and board I/O component of
    /// `circuit` its local range of bubble ids, sub-circuits first, and
    /// returns the sheet's total. Each sheet is numbered once.
    fn construct_hierarchy_tree(
        &mut self,
        circuit: CircuitId,
        processed: &mut HashSet<CircuitId>,
    ) -> BubbleCounts {
        if !processed.insert(circuit) {
            return self
                .netlists
                .get(&circuit)
                .map(|nl| nl.local_bubbles)
                .unwrap_or_default();
        }
        let Some(nl) = self.netlists.get(&circuit) else {
            return BubbleCounts::default();
        };
        let subs: Vec<(usize, Option<CircuitId>)> = nl
            .subcircuits
            .iter()
            .map(|&slot| (slot, nl.components[slot].subcircuit()))
            .collect();
        let devices: Vec<(usize, BubbleCounts)> = nl
            .ordinary
            .iter()
            .filter_map(|&slot| {
                let (i, o, io) = nl.components[slot].kind().io_bubbles()?;
                Some((slot, BubbleCounts::new(i, o, io)))
            })
            .collect();

        let mut spans = Vec::with_capacity(subs.len() + devices.len());
        for (slot, child) in subs {
            let count = match child {
                Some(child) => self.construct_hierarchy_tree(child, processed),
                None => BubbleCounts::default(),
            };
            spans.push((slot, count));
        }
        spans.extend(devices);

        let Some(nl) = self.netlists.get_mut(&circuit) else {
            return BubbleCounts::default();
        };
        let mut next = BubbleCounts::default();
        for (slot, count) in spans {
            nl.components[slot].set_local_bubbles(BubbleSpan { start: next, count });
            next += count;
        }
        nl.local_bubbles = next;
        debug!(sheet = %nl.name, bubbles = next.total(), "numbered local bubbles");
        next
    }

    /// Records the global bubble range of every instance below `path`,
    /// offsetting local ranges by `start`.
    fn enumerate_global_bubbles(&mut self, circuit: CircuitId, path: &HierarchyPath, start: BubbleCounts) {
        let Some(nl) = self.netlists.get(&circuit) else {
            return;
        };
        let interner = &self.interner;
        let entries: Vec<(usize, Option<CircuitId>, Ident, BubbleSpan)> = nl
            .subcircuits
            .iter()
            .chain(&nl.ordinary)
            .filter_map(|&slot| {
                let comp = &nl.components[slot];
                let span = comp.local_bubbles()?;
                Some((slot, comp.subcircuit(), interner.get_or_intern(comp.label()), span))
            })
            .collect();

        for (slot, child, label, span) in entries {
            let at = start + span.start;
            let child_path = path.child(label);
            if let Some(nl) = self.netlists.get_mut(&circuit) {
                nl.components[slot].add_global_bubbles(child_path.clone(), at, span.count);
            }
            if let Some(child) = child {
                if !span.count.is_zero() {
                    self.enumerate_global_bubbles(child, &child_path, at);
                }
            }
        }
    }

    /// Drops clock trees and bubble numbering from every netlist.
    fn clear_analysis(&mut self) {
        self.clock_sources.clear();
        for nl in self.netlists.values_mut() {
            nl.clock_tree.clear();
            nl.local_bubbles = BubbleCounts::default();
            for comp in &mut nl.components {
                comp.clear_bubbles();
            }
        }
    }
}

impl Default for NetlistStore {
    fn default() -> Self {
        Self::new()
    }
}
