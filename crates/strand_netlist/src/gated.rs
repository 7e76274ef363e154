//! Gated clock detection.
//!
//! Runs after the clock tree is traced. A clock input whose bit carries no
//! clock id at its hierarchy path is gated. If its driver is logic inside the
//! sheet the gating is the same for every instance and only warned about. If
//! the driver is a sheet input pin, gating depends on how each instance is
//! fed: such sheets are recorded per instance, and a sheet recorded both as
//! gated and as not gated cannot be generated.

use std::collections::{BTreeMap, HashMap, HashSet};

use strand_common::Interner;
use strand_diagnostics::{Diagnostic, DiagnosticSink, Mark};
use strand_schematic::{CircuitId, ComponentId, ComponentKind, WireId};
use tracing::debug;

use crate::clock::Level;
use crate::component::{NetlistComponent, PortKind, PortRef};
use crate::errors::{self, Aborted, Stage};
use crate::net::ConnectionRef;
use crate::netlist::Netlist;
use crate::path::HierarchyPath;
use crate::roles::describe;

/// A sheet instance, named by its parent sheet and its component there.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
struct Instance {
    parent: CircuitId,
    component: ComponentId,
}

/// One driver of gated clock inputs and everything it gates.
#[derive(Debug)]
struct GatingSource {
    source: ConnectionRef,
    bit: u32,
    wires: Vec<WireId>,
    gated: Vec<ComponentId>,
}

#[derive(Debug, Default)]
struct Findings {
    pin: Vec<GatingSource>,
    logic: Vec<GatingSource>,
}

impl Findings {
    fn record(&mut self, from_pin: bool, source: ConnectionRef, bit: u32, wires: Vec<WireId>, gated: ComponentId) {
        let list = if from_pin { &mut self.pin } else { &mut self.logic };
        match list.iter_mut().find(|s| s.source == source && s.bit == bit) {
            Some(existing) => {
                if !existing.gated.contains(&gated) {
                    existing.gated.push(gated);
                }
            }
            None => list.push(GatingSource {
                source,
                bit,
                wires,
                gated: vec![gated],
            }),
        }
    }
}

/// Walks the hierarchy below the top sheet looking for gated clock inputs.
pub(crate) struct GatedClockCheck<'a> {
    netlists: &'a HashMap<CircuitId, Netlist>,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    gated: BTreeMap<CircuitId, Vec<Instance>>,
    not_gated: BTreeMap<CircuitId, Vec<Instance>>,
    unconnected_warned: HashSet<(CircuitId, ComponentId)>,
    logic_warned: HashSet<(CircuitId, ConnectionRef)>,
}

impl<'a> GatedClockCheck<'a> {
    pub(crate) fn new(
        netlists: &'a HashMap<CircuitId, Netlist>,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            netlists,
            interner,
            sink,
            gated: BTreeMap::new(),
            not_gated: BTreeMap::new(),
            unconnected_warned: HashSet::new(),
            logic_warned: HashSet::new(),
        }
    }

    fn netlist(&self, circuit: CircuitId) -> Stage<&'a Netlist> {
        let netlists = self.netlists;
        netlists.get(&circuit).ok_or_else(|| {
            self.sink
                .emit(errors::error_internal(&circuit.to_string(), "sheet has no netlist"));
            Aborted
        })
    }

    fn internal(&self, nl: &Netlist, what: &str) -> Aborted {
        self.sink.emit(errors::error_internal(nl.name(), what));
        Aborted
    }

    /// Checks every clocked component below `top` and reports sheets used
    /// both gated and not gated.
    pub(crate) fn detect_gated_clocks(mut self, top: CircuitId) -> Stage<()> {
        self.collect_gated_components(&[Level::top(top)], &HierarchyPath::root())?;
        let mut conflict = false;
        for (circuit, plain) in &self.not_gated {
            let Some(gated) = self.gated.get(circuit) else {
                continue;
            };
            conflict = true;
            let nl = self.netlist(*circuit)?;
            let mut diag = errors::error_gated_and_not_gated(nl.name());
            for inst in plain {
                diag = diag.with_note(format!("not gated: {}", self.describe_instance(inst)));
            }
            for inst in gated {
                diag = diag.with_note(format!("gated: {}", self.describe_instance(inst)));
            }
            self.sink.emit(diag);
        }
        debug!(
            gated = self.gated.len(),
            not_gated = self.not_gated.len(),
            "checked gated clocks"
        );
        if conflict {
            Err(Aborted)
        } else {
            Ok(())
        }
    }

    fn describe_instance(&self, inst: &Instance) -> String {
        let Some(parent) = self.netlists.get(&inst.parent) else {
            return inst.component.to_string();
        };
        match parent.component(inst.component) {
            Some(c) => format!("instance `{}` in sheet `{}`", c.label(), parent.name()),
            None => format!("{} in sheet `{}`", inst.component, parent.name()),
        }
    }

    /// Collects gated clock inputs of the sheet at `levels`, sub-circuits first.
    fn collect_gated_components(&mut self, levels: &[Level], path: &HierarchyPath) -> Stage<()> {
        let Some(&Level { circuit, instance }) = levels.last() else {
            return Ok(());
        };
        let nl = self.netlist(circuit)?;
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
            self.collect_gated_components(&next, &child_path)?;
        }

        let mut findings = Findings::default();
        let mut gated = false;
        for comp in nl.components.iter().filter(|c| c.kind().checks_gated_clock()) {
            for &pin in comp.kind().clock_pins() {
                gated |= self.has_gated_clock(nl, circuit, path, comp, pin, &mut findings)?;
            }
        }

        for source in &findings.logic {
            if self.logic_warned.insert((circuit, source.source)) {
                self.sink.emit(self.gating_warning(nl, source, false));
            }
        }

        let parent_level = levels.len().checked_sub(2).map(|i| levels[i]);
        let (Some(parent), Some(slot)) = (parent_level, instance) else {
            for source in &findings.pin {
                self.sink.emit(self.gating_warning(nl, source, true));
            }
            return Ok(());
        };

        for source in &findings.pin {
            let mut notes = Vec::new();
            self.trace_gated_source(levels, source.source, &mut notes)?;
            let mut diag = self.gating_warning(nl, source, true);
            for note in notes {
                diag = diag.with_note(note);
            }
            self.sink.emit(diag);
        }

        let parent_nl = self.netlist(parent.circuit)?;
        let inst = Instance {
            parent: parent.circuit,
            component: parent_nl.components[slot].id(),
        };
        let set = if gated && !findings.pin.is_empty() {
            &mut self.gated
        } else {
            &mut self.not_gated
        };
        let list = set.entry(circuit).or_default();
        if !list.contains(&inst) {
            list.push(inst);
        }
        Ok(())
    }

    fn gating_warning(&self, nl: &Netlist, source: &GatingSource, from_pin: bool) -> Diagnostic {
        let diag = if from_pin {
            errors::warn_possibly_gated_clock(nl.name())
        } else {
            errors::warn_gated_clock(nl.name())
        };
        let driver = nl
            .component(source.source.component)
            .map(describe)
            .unwrap_or_else(|| source.source.component.to_string());
        diag.with_note(format!("driven by {driver}"))
            .with_marks(source.wires.iter().map(|w| Mark::Wire(w.as_raw())))
            .with_marks([Mark::Instance(source.source.component.as_raw())])
            .with_marks(source.gated.iter().map(|c| Mark::Instance(c.as_raw())))
    }

    /// Classifies clock pin `pin` of `comp`. Returns `true` if it is gated.
    fn has_gated_clock(
        &mut self,
        nl: &Netlist,
        circuit: CircuitId,
        path: &HierarchyPath,
        comp: &NetlistComponent,
        pin: usize,
        findings: &mut Findings,
    ) -> Stage<bool> {
        let Some(point) = comp.end(pin).and_then(|e| e.point(0)) else {
            return Err(self.internal(nl, "clock pin index out of range"));
        };
        let Some(net) = point.net() else {
            if self.unconnected_warned.insert((circuit, comp.id())) {
                self.sink.emit(errors::warn_unconnected_clock(
                    nl.name(),
                    &describe(comp),
                    comp.id().as_raw(),
                ));
            }
            return Ok(false);
        };
        let bit = point.bit();
        if nl.clock_id(path, net, bit).is_some() {
            return Ok(false);
        }
        let Some(root) = nl.net(net) else {
            return Err(self.internal(nl, "clock pin bound to a missing net"));
        };
        let (source, wires) = if root.is_forced_root() {
            nl.hidden_source(net, bit, self.sink)?
        } else {
            match nl.connections(net, bit, true) {
                [] => return Ok(false),
                [one] => (*one, root.wires().collect()),
                many => {
                    self.sink.emit(
                        errors::error_ambiguous_hidden_source(nl.name(), bit, many.len())
                            .with_marks(root.wire_marks()),
                    );
                    return Err(Aborted);
                }
            }
        };
        let from_pin = nl
            .component(source.component)
            .is_some_and(|c| c.kind().is_pin());
        findings.record(from_pin, source, bit, wires, comp.id());
        Ok(true)
    }

    /// Follows a gating driver across sheet boundaries and describes each hop.
    ///
    /// Input pins lead up into the enclosing instance; sub-circuit outputs
    /// lead down into the instantiated sheet.
    fn trace_gated_source(&self, levels: &[Level], source: ConnectionRef, notes: &mut Vec<String>) -> Stage<()> {
        let Some(&Level { circuit, instance }) = levels.last() else {
            return Ok(());
        };
        let nl = self.netlist(circuit)?;
        let Some(driver) = nl.component(source.component) else {
            return Err(self.internal(nl, "gating driver is not in the netlist"));
        };
        match driver.kind() {
            ComponentKind::Pin => {
                let (Some(slot), Some(parent_level)) = (instance, levels.len().checked_sub(2).map(|i| levels[i]))
                else {
                    return Ok(());
                };
                let Some(index) = nl
                    .input_ports
                    .iter()
                    .position(|&s| nl.components[s].id() == driver.id())
                else {
                    return Err(self.internal(nl, "gating pin is not an input port"));
                };
                let parent = self.netlist(parent_level.circuit)?;
                let inst = &parent.components[slot];
                let port = Some(PortRef::new(PortKind::Input, index));
                let outer = inst
                    .ends()
                    .iter()
                    .filter_map(|e| e.point(source.bit))
                    .find(|p| p.child_port() == port);
                let Some(outer) = outer else {
                    return Err(self.internal(parent, "instance end for input pin not found"));
                };
                let Some(net) = outer.net() else {
                    return Ok(());
                };
                let (next, _) = parent.hidden_source(net, outer.bit(), self.sink)?;
                self.note_hop(parent, next, notes);
                self.trace_gated_source(&levels[..levels.len() - 1], next, notes)
            }
            ComponentKind::Subcircuit { circuit: child_id, .. } => {
                let Some(port) = driver
                    .end(source.end as usize)
                    .and_then(|e| e.point(source.bit))
                    .and_then(|p| p.child_port())
                else {
                    return Err(self.internal(nl, "sub-circuit end without port"));
                };
                let child = self.netlist(*child_id)?;
                let Some(pin_point) = child
                    .port(port)
                    .and_then(|p| p.end(0))
                    .and_then(|e| e.point(source.bit))
                else {
                    return Err(self.internal(child, "sub-circuit output pin not found"));
                };
                let Some(net) = pin_point.net() else {
                    return Ok(());
                };
                let Some(slot) = nl.slots.get(&driver.id()).copied() else {
                    return Err(self.internal(nl, "sub-circuit instance has no slot"));
                };
                let (next, _) = child.hidden_source(net, pin_point.bit(), self.sink)?;
                self.note_hop(child, next, notes);
                let mut deeper = levels.to_vec();
                deeper.push(Level {
                    circuit: *child_id,
                    instance: Some(slot),
                });
                self.trace_gated_source(&deeper, next, notes)
            }
            _ => Ok(()),
        }
    }

    fn note_hop(&self, nl: &Netlist, driver: ConnectionRef, notes: &mut Vec<String>) {
        let Some(comp) = nl.component(driver.component) else {
            return;
        };
        let note = match comp.kind() {
            ComponentKind::Pin | ComponentKind::Subcircuit { .. } => {
                format!("in sheet `{}` the clock passes through {}", nl.name(), describe(comp))
            }
            _ => format!("in sheet `{}` the clock is gated by {}", nl.name(), describe(comp)),
        };
        notes.push(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_merge_by_source_and_bit() {
        let mut findings = Findings::default();
        let src = ConnectionRef::new(ComponentId::from_raw(1), 0, 0);
        findings.record(true, src, 0, Vec::new(), ComponentId::from_raw(5));
        findings.record(true, src, 0, Vec::new(), ComponentId::from_raw(6));
        findings.record(true, src, 0, Vec::new(), ComponentId::from_raw(6));
        findings.record(true, src, 1, Vec::new(), ComponentId::from_raw(6));
        findings.record(false, src, 0, Vec::new(), ComponentId::from_raw(7));
        assert_eq!(findings.pin.len(), 2);
        assert_eq!(findings.pin[0].gated.len(), 2);
        assert_eq!(findings.logic.len(), 1);
    }
}
