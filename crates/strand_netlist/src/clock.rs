//! Clock tree tracing.
//!
//! Every clock generator reachable from the top sheet gets a sequential
//! [`ClockId`]. Starting at the generator's output bit the id is propagated
//! along root nets, across splitters, down into sub-circuit input pins and up
//! out of output pins into the enclosing instance. Marks are recorded per
//! hierarchy path in the [`ClockTree`] of the sheet they belong to.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use strand_common::Interner;
use strand_diagnostics::{DiagnosticSink, Mark};
use strand_schematic::{CircuitId, ComponentId};
use tracing::debug;

use crate::component::{PortKind, PortRef};
use crate::errors::{self, Aborted, Stage};
use crate::net::NetId;
use crate::netlist::Netlist;
use crate::path::HierarchyPath;

/// Identifier of a clock source, unique within one top-level analysis.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct ClockId(u32);

impl ClockId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clock#{}", self.0)
    }
}

/// Registry of clock generators and design-wide clock requirements.
#[derive(Clone, Debug, Default)]
pub struct ClockSources {
    ids: HashMap<(CircuitId, ComponentId), ClockId>,
    order: Vec<(CircuitId, ComponentId)>,
    requires_global_clock: bool,
}

impl ClockSources {
    /// Returns the id of a generator, assigning the next one on first sight.
    pub fn clock_id(&mut self, circuit: CircuitId, component: ComponentId) -> ClockId {
        if let Some(id) = self.ids.get(&(circuit, component)) {
            return *id;
        }
        let id = ClockId(self.order.len() as u32);
        self.ids.insert((circuit, component), id);
        self.order.push((circuit, component));
        id
    }

    /// The id of a generator, if it has one.
    pub fn get(&self, circuit: CircuitId, component: ComponentId) -> Option<ClockId> {
        self.ids.get(&(circuit, component)).copied()
    }

    /// Number of registered generators.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no generator is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Generators in id order.
    pub fn sources(&self) -> impl Iterator<Item = (ClockId, CircuitId, ComponentId)> + '_ {
        self.order
            .iter()
            .enumerate()
            .map(|(i, &(c, k))| (ClockId(i as u32), c, k))
    }

    /// Returns `true` if some component needs the global clock of the target.
    pub fn requires_global_clock(&self) -> bool {
        self.requires_global_clock
    }

    pub(crate) fn set_requires_global_clock(&mut self) {
        self.requires_global_clock = true;
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
        self.requires_global_clock = false;
    }
}

/// Clock ids of root-net bits, per hierarchy path, for one sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockTree {
    marks: HashMap<HierarchyPath, HashMap<(NetId, u32), ClockId>>,
}

impl ClockTree {
    /// Records `id` on `(net, bit)` at `path`.
    ///
    /// Returns `false` if the bit was already marked, which ends tracing
    /// along that branch.
    pub(crate) fn mark(&mut self, path: &HierarchyPath, net: NetId, bit: u32, id: ClockId) -> bool {
        let level = self.marks.entry(path.clone()).or_default();
        if level.contains_key(&(net, bit)) {
            return false;
        }
        level.insert((net, bit), id);
        true
    }

    /// The clock id on `(net, bit)` at `path`.
    pub fn clock_id(&self, path: &HierarchyPath, net: NetId, bit: u32) -> Option<ClockId> {
        self.marks.get(path)?.get(&(net, bit)).copied()
    }

    /// Hierarchy paths with at least one mark.
    pub fn paths(&self) -> impl Iterator<Item = &HierarchyPath> {
        self.marks.keys()
    }

    /// Marks at `path`, ordered by net and bit.
    pub fn marks_at(&self, path: &HierarchyPath) -> Vec<(NetId, u32, ClockId)> {
        let mut out: Vec<_> = self
            .marks
            .get(path)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&(n, b), &id)| (n, b, id)))
            .collect();
        out.sort();
        out
    }

    /// Returns `true` if nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.marks.values().all(HashMap::is_empty)
    }

    pub(crate) fn sorted_marks(&self) -> Vec<(&HierarchyPath, NetId, u32, ClockId)> {
        let mut out: Vec<_> = self
            .marks
            .iter()
            .flat_map(|(p, m)| m.iter().map(move |(&(n, b), &id)| (p, n, b, id)))
            .collect();
        out.sort();
        out
    }

    pub(crate) fn clear(&mut self) {
        self.marks.clear();
    }
}

/// One sheet on the way from the top to the current instance.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Level {
    pub(crate) circuit: CircuitId,
    /// Slot of the instance in the parent's netlist; `None` at the top.
    pub(crate) instance: Option<usize>,
}

impl Level {
    pub(crate) fn top(circuit: CircuitId) -> Self {
        Self {
            circuit,
            instance: None,
        }
    }
}

/// Collects clock marks for a whole hierarchy without touching the netlists.
pub(crate) struct ClockTracer<'a> {
    netlists: &'a HashMap<CircuitId, Netlist>,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    sources: &'a mut ClockSources,
    trees: BTreeMap<CircuitId, ClockTree>,
}

impl<'a> ClockTracer<'a> {
    pub(crate) fn new(
        netlists: &'a HashMap<CircuitId, Netlist>,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
        sources: &'a mut ClockSources,
    ) -> Self {
        Self {
            netlists,
            interner,
            sink,
            sources,
            trees: BTreeMap::new(),
        }
    }

    /// Traces every clock source below `top` and returns the clock trees of
    /// every sheet in the hierarchy.
    pub(crate) fn run(mut self, top: CircuitId) -> Stage<BTreeMap<CircuitId, ClockTree>> {
        self.sources.clear();
        let levels = [Level::top(top)];
        self.mark_clock_sources(&levels, &HierarchyPath::root())?;
        debug!(sources = self.sources.len(), "traced clock tree");
        Ok(self.trees)
    }

    fn netlist(&self, circuit: CircuitId) -> Stage<&'a Netlist> {
        let netlists = self.netlists;
        match netlists.get(&circuit) {
            Some(nl) => Ok(nl),
            None => {
                self.sink
                    .emit(errors::error_internal(&circuit.to_string(), "sheet has no netlist"));
                Err(Aborted)
            }
        }
    }

    fn internal(&self, nl: &Netlist, what: &str, component: ComponentId) -> Aborted {
        self.sink.emit(
            errors::error_internal(nl.name(), what).with_marks([Mark::Instance(component.as_raw())]),
        );
        Aborted
    }

    fn mark(&mut self, circuit: CircuitId, path: &HierarchyPath, net: NetId, bit: u32, id: ClockId) -> bool {
        self.trees.entry(circuit).or_default().mark(path, net, bit, id)
    }

    /// Registers and traces the clock generators of the sheet at `levels`,
    /// sub-circuits first.
    fn mark_clock_sources(&mut self, levels: &[Level], path: &HierarchyPath) -> Stage<()> {
        let Some(&Level { circuit, .. }) = levels.last() else {
            return Ok(());
        };
        let nl = self.netlist(circuit)?;
        self.trees.entry(circuit).or_default();
        for &slot in &nl.subcircuits {
            let inst = &nl.components[slot];
            let Some(child) = inst.subcircuit() else {
                continue;
            };
            let mut next = levels.to_vec();
            next.push(Level {
                circuit: child,
                instance: Some(slot),
            });
            let child_path = path.child(self.interner.get_or_intern(inst.label()));
            self.mark_clock_sources(&next, &child_path)?;
        }
        if nl.components.iter().any(|c| c.kind().requires_global_clock()) {
            self.sources.set_requires_global_clock();
        }
        for &slot in &nl.clock_generators {
            let generator = &nl.components[slot];
            let shaped = generator.end_count() == 1 && generator.end(0).map(|e| e.width()) == Some(1);
            if !shaped {
                self.sink
                    .emit(errors::error_clock_shape(nl.name(), generator.id().as_raw()));
                return Err(Aborted);
            }
            let Some(point) = generator.end(0).and_then(|e| e.point(0)) else {
                continue;
            };
            let Some(net) = point.net() else {
                continue;
            };
            let id = self.sources.clock_id(circuit, generator.id());
            if self.mark(circuit, path, net, point.bit(), id) {
                self.trace_clock_net(levels, path, net, point.bit(), id)?;
            }
        }
        Ok(())
    }

    /// Propagates `id` from `(net, bit)` of the sheet at `levels`.
    fn trace_clock_net(
        &mut self,
        levels: &[Level],
        path: &HierarchyPath,
        net: NetId,
        bit: u32,
        id: ClockId,
    ) -> Stage<()> {
        let Some(&Level { circuit, instance }) = levels.last() else {
            return Ok(());
        };
        let nl = self.netlist(circuit)?;

        // Down into sub-circuits through their input pins.
        for &slot in &nl.subcircuits {
            let inst = &nl.components[slot];
            let Some(child_id) = inst.subcircuit() else {
                continue;
            };
            for end in inst.ends().iter().filter(|e| !e.is_output()) {
                for (b, point) in end.points().iter().enumerate() {
                    if !point.is(net, bit) {
                        continue;
                    }
                    let Some(port) = point.child_port() else {
                        return Err(self.internal(nl, "sub-circuit end without port", inst.id()));
                    };
                    if port.kind != PortKind::Input {
                        continue;
                    }
                    let child = self.netlist(child_id)?;
                    let Some(pin_point) = child
                        .port(port)
                        .and_then(|p| p.end(0))
                        .and_then(|e| e.point(b as u32))
                    else {
                        return Err(self.internal(nl, "sub-circuit input pin not found", inst.id()));
                    };
                    let Some(child_net) = pin_point.net() else {
                        continue;
                    };
                    let child_path = path.child(self.interner.get_or_intern(inst.label()));
                    if self.mark(child_id, &child_path, child_net, pin_point.bit(), id) {
                        let mut next = levels.to_vec();
                        next.push(Level {
                            circuit: child_id,
                            instance: Some(slot),
                        });
                        self.trace_clock_net(&next, &child_path, child_net, pin_point.bit(), id)?;
                    }
                }
            }
        }

        // Up into the enclosing instance through output pins.
        if let (Some(slot), Some(parent_path)) = (instance, path.parent()) {
            let parent_levels = &levels[..levels.len() - 1];
            if let Some(parent_level) = parent_levels.last() {
                let parent = self.netlist(parent_level.circuit)?;
                let inst = &parent.components[slot];
                for (index, &pin_slot) in nl.output_ports.iter().enumerate() {
                    let pin = &nl.components[pin_slot];
                    let Some(pin_end) = pin.end(0) else {
                        continue;
                    };
                    for (b, point) in pin_end.points().iter().enumerate() {
                        if !point.is(net, bit) {
                            continue;
                        }
                        let port = Some(PortRef::new(PortKind::Output, index));
                        let outer = inst
                            .ends()
                            .iter()
                            .filter(|e| e.is_output())
                            .filter_map(|e| e.point(b as u32))
                            .find(|p| p.child_port() == port);
                        let Some(outer) = outer else {
                            return Err(self.internal(parent, "instance output for pin not found", inst.id()));
                        };
                        let Some(outer_net) = outer.net() else {
                            continue;
                        };
                        if self.mark(parent_level.circuit, &parent_path, outer_net, outer.bit(), id) {
                            self.trace_clock_net(parent_levels, &parent_path, outer_net, outer.bit(), id)?;
                        }
                    }
                }
            }
        }

        // Across splitters.
        for (hidden_net, hidden_bit) in nl.hidden_sink_nets(net, bit) {
            if self.mark(circuit, path, hidden_net, hidden_bit, id) {
                self.trace_clock_net(levels, path, hidden_net, hidden_bit, id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_stable() {
        let mut sources = ClockSources::default();
        let c = CircuitId::from_raw(0);
        let a = sources.clock_id(c, ComponentId::from_raw(4));
        let b = sources.clock_id(c, ComponentId::from_raw(2));
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(sources.clock_id(c, ComponentId::from_raw(4)), a);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get(c, ComponentId::from_raw(2)), Some(b));
    }

    #[test]
    fn clear_resets_numbering() {
        let mut sources = ClockSources::default();
        let c = CircuitId::from_raw(0);
        sources.clock_id(c, ComponentId::from_raw(1));
        sources.set_requires_global_clock();
        sources.clear();
        assert!(sources.is_empty());
        assert!(!sources.requires_global_clock());
        assert_eq!(sources.clock_id(c, ComponentId::from_raw(9)).as_raw(), 0);
    }

    #[test]
    fn mark_guard() {
        let mut tree = ClockTree::default();
        let path = HierarchyPath::root();
        let net = NetId::from_raw(0);
        assert!(tree.mark(&path, net, 0, ClockId::from_raw(0)));
        assert!(!tree.mark(&path, net, 0, ClockId::from_raw(1)));
        assert_eq!(tree.clock_id(&path, net, 0), Some(ClockId::from_raw(0)));
        assert_eq!(tree.clock_id(&path, net, 1), None);
        assert_eq!(tree.marks_at(&path).len(), 1);
        tree.clear();
        assert!(tree.is_empty());
    }
}
