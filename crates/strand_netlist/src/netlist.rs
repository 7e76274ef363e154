//! The per-sheet netlist and its query surface.

use std::collections::HashMap;

use serde::Serialize;
use strand_common::ContentHash;
use strand_schematic::{Arena, CircuitId, ComponentId, ComponentKind, Direction};

use crate::clock::{ClockId, ClockTree};
use crate::component::{BubbleCounts, ConnectionPoint, NetlistComponent, PortKind, PortRef};
use crate::label::label_key;
use crate::net::{ConnectionRef, Net, NetId};
use crate::path::HierarchyPath;
use crate::splitter::SplitterInfo;
use crate::status::DrcStatus;

/// The validated connectivity of one sheet.
///
/// Built once per sheet and shared by every instance of that sheet; instance
/// specific data (clock ids, bubble ranges) is keyed by hierarchy path.
pub struct Netlist {
    pub(crate) circuit: CircuitId,
    pub(crate) name: String,
    pub(crate) status: DrcStatus,
    pub(crate) revision: Option<u64>,
    pub(crate) nets: Arena<NetId, Net>,
    pub(crate) components: Vec<NetlistComponent>,
    pub(crate) slots: HashMap<ComponentId, usize>,
    pub(crate) ordinary: Vec<usize>,
    pub(crate) subcircuits: Vec<usize>,
    pub(crate) clock_generators: Vec<usize>,
    pub(crate) input_ports: Vec<usize>,
    pub(crate) output_ports: Vec<usize>,
    pub(crate) inout_ports: Vec<usize>,
    pub(crate) splitters: Vec<SplitterInfo>,
    pub(crate) local_bubbles: BubbleCounts,
    pub(crate) clock_tree: ClockTree,
}

impl Netlist {
    /// Creates an empty netlist that still has to be built.
    pub fn new(circuit: CircuitId, name: impl Into<String>) -> Self {
        Self {
            circuit,
            name: name.into(),
            status: DrcStatus::REQUIRED,
            revision: None,
            nets: Arena::new(),
            components: Vec::new(),
            slots: HashMap::new(),
            ordinary: Vec::new(),
            subcircuits: Vec::new(),
            clock_generators: Vec::new(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            inout_ports: Vec::new(),
            splitters: Vec::new(),
            local_bubbles: BubbleCounts::default(),
            clock_tree: ClockTree::default(),
        }
    }

    /// Drops every net, component and annotation and marks the netlist stale.
    pub fn clear(&mut self) {
        self.status = DrcStatus::REQUIRED;
        self.revision = None;
        self.nets = Arena::new();
        self.components.clear();
        self.slots.clear();
        self.ordinary.clear();
        self.subcircuits.clear();
        self.clock_generators.clear();
        self.input_ports.clear();
        self.output_ports.clear();
        self.inout_ports.clear();
        self.splitters.clear();
        self.local_bubbles = BubbleCounts::default();
        self.clock_tree.clear();
    }

    /// Forces a rebuild on the next validation.
    pub fn mark_required(&mut self) {
        self.status |= DrcStatus::REQUIRED;
    }

    /// The sheet this netlist was built for.
    pub fn circuit(&self) -> CircuitId {
        self.circuit
    }

    /// The sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// DRC status of the last build.
    pub fn status(&self) -> DrcStatus {
        self.status
    }

    /// Returns `true` if the last build passed.
    pub fn is_valid(&self) -> bool {
        self.status.is_passed()
    }

    pub(crate) fn install_nets(&mut self, nets: Vec<Net>, splitters: Vec<SplitterInfo>) {
        let mut arena = Arena::new();
        for mut net in nets {
            net.init_roles();
            arena.alloc(net);
        }
        self.nets = arena;
        self.splitters = splitters;
    }

    pub(crate) fn push_component(&mut self, component: NetlistComponent) {
        let slot = self.components.len();
        let list = match component.kind() {
            ComponentKind::Clock => &mut self.clock_generators,
            ComponentKind::Subcircuit { .. } => &mut self.subcircuits,
            ComponentKind::Pin => match component.end(0).map(|e| e.direction()) {
                Some(Direction::Output) => &mut self.input_ports,
                Some(Direction::Input) => &mut self.output_ports,
                Some(Direction::InOut) => &mut self.inout_ports,
                None => &mut self.ordinary,
            },
            _ => &mut self.ordinary,
        };
        list.push(slot);
        self.slots.insert(component.id(), slot);
        self.components.push(component);
    }

    /// All nets, roots and children.
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter()
    }

    /// Root nets only.
    pub fn root_nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter().filter(|(_, n)| n.is_root())
    }

    /// Net `id`.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.try_get(id)
    }

    /// Number of single-bit root nets.
    pub fn number_of_nets(&self) -> usize {
        self.root_nets().filter(|(_, n)| !n.is_bus()).count()
    }

    /// Number of multi-bit root nets.
    pub fn number_of_busses(&self) -> usize {
        self.root_nets().filter(|(_, n)| n.is_bus()).count()
    }

    /// Splitters that survived resolution.
    pub fn splitters(&self) -> &[SplitterInfo] {
        &self.splitters
    }

    /// The netlisted component for schematic component `id`.
    pub fn component(&self, id: ComponentId) -> Option<&NetlistComponent> {
        self.slots.get(&id).map(|&s| &self.components[s])
    }

    /// Every netlisted component, in schematic order.
    pub fn components(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.components.iter()
    }

    fn list<'s>(&'s self, slots: &'s [usize]) -> impl Iterator<Item = &'s NetlistComponent> + 's {
        slots.iter().map(move |&s| &self.components[s])
    }

    /// Components that are neither pins, clocks nor sub-circuits.
    pub fn ordinary_components(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.ordinary)
    }

    /// Sub-circuit instances.
    pub fn subcircuits(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.subcircuits)
    }

    /// Clock generators.
    pub fn clock_generators(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.clock_generators)
    }

    /// Pins driving the sheet.
    pub fn input_ports(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.input_ports)
    }

    /// Pins read by the sheet.
    pub fn output_ports(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.output_ports)
    }

    /// Bidirectional pins.
    pub fn inout_ports(&self) -> impl Iterator<Item = &NetlistComponent> {
        self.list(&self.inout_ports)
    }

    fn port_slots(&self, kind: PortKind) -> &[usize] {
        match kind {
            PortKind::Input => &self.input_ports,
            PortKind::InOut => &self.inout_ports,
            PortKind::Output => &self.output_ports,
        }
    }

    /// The pin behind `port`.
    pub fn port(&self, port: PortRef) -> Option<&NetlistComponent> {
        self.port_slots(port.kind)
            .get(port.index)
            .map(|&s| &self.components[s])
    }

    /// Number of pins of `kind`.
    pub fn number_of_ports(&self, kind: PortKind) -> usize {
        self.port_slots(kind).len()
    }

    /// Total width of the pins of `kind`.
    pub fn number_of_port_bits(&self, kind: PortKind) -> u32 {
        self.port_slots(kind)
            .iter()
            .filter_map(|&s| self.components[s].end(0))
            .map(|e| e.width())
            .sum()
    }

    /// Finds the pin labelled `label`. Inputs are searched first, then
    /// bidirectional pins, then outputs.
    pub fn port_info(&self, label: &str) -> Option<PortRef> {
        let key = label_key(label);
        [PortKind::Input, PortKind::InOut, PortKind::Output]
            .into_iter()
            .find_map(|kind| {
                self.port_slots(kind)
                    .iter()
                    .position(|&s| label_key(self.components[s].label()) == key)
                    .map(|index| PortRef::new(kind, index))
            })
    }

    /// The point of the sub-circuit instance labelled `label` that carries
    /// bit `bit` of sheet port `port`.
    pub fn subcircuit_connection(&self, label: &str, port: PortRef, bit: u32) -> Option<&ConnectionPoint> {
        let key = label_key(label);
        let instance = self
            .subcircuits()
            .find(|c| label_key(c.label()) == key)?;
        instance
            .ends()
            .iter()
            .filter_map(|e| e.point(bit))
            .find(|p| p.child_port() == Some(port))
    }

    /// Returns `true` if end `end` of `component` maps to consecutive bits
    /// of one root net.
    pub fn is_continuous_bus(&self, component: &NetlistComponent, end: usize) -> bool {
        let Some(end) = component.end(end) else {
            return true;
        };
        let points = end.points();
        let Some(first) = points.first() else {
            return true;
        };
        points.iter().enumerate().all(|(i, p)| {
            p.net() == first.net() && p.bit() == first.bit() + i as u32
        })
    }

    /// Drivers (`output`) or readers of root bit `(net, bit)`.
    pub fn connections(&self, net: NetId, bit: u32, output: bool) -> &[ConnectionRef] {
        match self.nets.try_get(net).and_then(|n| n.bit(bit)) {
            Some(roles) if output => roles.sources(),
            Some(roles) => roles.sinks(),
            None => &[],
        }
    }

    /// Board I/O bubbles of this sheet, including those of its sub-circuits.
    pub fn local_bubbles(&self) -> BubbleCounts {
        self.local_bubbles
    }

    /// Clock annotations of this sheet, per hierarchy path.
    pub fn clock_tree(&self) -> &ClockTree {
        &self.clock_tree
    }

    /// The clock id on `(net, bit)` in the instance at `path`.
    pub fn clock_id(&self, path: &HierarchyPath, net: NetId, bit: u32) -> Option<ClockId> {
        self.clock_tree.clock_id(path, net, bit)
    }

    /// A hash over nets, components, bubbles and clock annotations.
    ///
    /// Two builds of an unchanged sheet have the same fingerprint.
    pub fn fingerprint(&self) -> ContentHash {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            nets: Vec<(NetId, &'a Net)>,
            components: &'a [NetlistComponent],
            splitters: &'a [SplitterInfo],
            local_bubbles: BubbleCounts,
            clocks: Vec<(&'a HierarchyPath, NetId, u32, ClockId)>,
        }
        let snapshot = Snapshot {
            nets: self.nets.iter().collect(),
            components: &self.components,
            splitters: &self.splitters,
            local_bubbles: self.local_bubbles,
            clocks: self.clock_tree.sorted_marks(),
        };
        let bytes = serde_json::to_vec(&snapshot).unwrap_or_default();
        ContentHash::from_bytes(&bytes)
    }
}
