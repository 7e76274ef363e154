//! Netlist view of a placed component: ends expanded into per-bit points.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use serde::{Serialize, Serializer};
use strand_schematic::{CircuitId, Component, ComponentId, ComponentKind, Direction, Location};

use crate::label::correct_label;
use crate::net::NetId;
use crate::path::HierarchyPath;

/// Which port list of a sheet a pin belongs to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum PortKind {
    /// Drives the sheet.
    Input,
    /// Bidirectional.
    InOut,
    /// Read by the sheet.
    Output,
}

/// A port of a sheet: its kind and position in that kind's list.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct PortRef {
    /// The port list.
    pub kind: PortKind,
    /// Index within the list.
    pub index: usize,
}

impl PortRef {
    /// Creates a port reference.
    pub fn new(kind: PortKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// One bit of one end, bound to a root-net bit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct ConnectionPoint {
    pub(crate) net: Option<NetId>,
    pub(crate) bit: u32,
    pub(crate) child_port: Option<PortRef>,
}

impl ConnectionPoint {
    /// The root net, or `None` if the bit is unconnected.
    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    /// Bit index within the root net.
    pub fn bit(&self) -> u32 {
        self.bit
    }

    /// For sub-circuit ends, the sheet port behind this bit.
    pub fn child_port(&self) -> Option<PortRef> {
        self.child_port
    }

    /// Returns `true` if bound to `(net, bit)`.
    pub fn is(&self, net: NetId, bit: u32) -> bool {
        self.net == Some(net) && self.bit == bit
    }
}

/// A component end with one connection point per bit.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ConnectionEnd {
    location: Location,
    direction: Direction,
    points: Vec<ConnectionPoint>,
}

impl ConnectionEnd {
    fn new(location: Location, direction: Direction, width: u32) -> Self {
        Self {
            location,
            direction,
            points: vec![ConnectionPoint::default(); width as usize],
        }
    }

    /// Where the end sits on the sheet.
    pub fn location(&self) -> Location {
        self.location
    }

    /// The end's direction seen from the component.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` for pure output ends.
    pub fn is_output(&self) -> bool {
        self.direction.is_output_only()
    }

    /// Width in bits.
    pub fn width(&self) -> u32 {
        self.points.len() as u32
    }

    /// The connection point of bit `bit`.
    pub fn point(&self, bit: u32) -> Option<&ConnectionPoint> {
        self.points.get(bit as usize)
    }

    pub(crate) fn point_mut(&mut self, bit: u32) -> Option<&mut ConnectionPoint> {
        self.points.get_mut(bit as usize)
    }

    /// All connection points, bit 0 first.
    pub fn points(&self) -> &[ConnectionPoint] {
        &self.points
    }

    /// Returns `true` if any bit is connected.
    pub fn is_connected(&self) -> bool {
        self.points.iter().any(|p| p.net.is_some())
    }
}

/// Number of board I/O bubbles per direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct BubbleCounts {
    /// Input bubbles.
    pub inputs: u32,
    /// Output bubbles.
    pub outputs: u32,
    /// Bidirectional bubbles.
    pub inouts: u32,
}

impl BubbleCounts {
    /// Creates counts.
    pub fn new(inputs: u32, outputs: u32, inouts: u32) -> Self {
        Self {
            inputs,
            outputs,
            inouts,
        }
    }

    /// Returns `true` if all counts are zero.
    pub fn is_zero(&self) -> bool {
        self.inputs == 0 && self.outputs == 0 && self.inouts == 0
    }

    /// Sum over all directions.
    pub fn total(&self) -> u32 {
        self.inputs + self.outputs + self.inouts
    }
}

impl Add for BubbleCounts {
    type Output = BubbleCounts;

    fn add(self, rhs: BubbleCounts) -> BubbleCounts {
        BubbleCounts::new(
            self.inputs + rhs.inputs,
            self.outputs + rhs.outputs,
            self.inouts + rhs.inouts,
        )
    }
}

impl AddAssign for BubbleCounts {
    fn add_assign(&mut self, rhs: BubbleCounts) {
        *self = *self + rhs;
    }
}

/// A contiguous range of bubbles: first id per direction and count.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct BubbleSpan {
    /// First id per direction.
    pub start: BubbleCounts,
    /// Number of ids per direction.
    pub count: BubbleCounts,
}

/// A component as seen by the netlist.
#[derive(Clone, Debug, Serialize)]
pub struct NetlistComponent {
    id: ComponentId,
    kind: ComponentKind,
    label: String,
    ends: Vec<ConnectionEnd>,
    local_bubbles: Option<BubbleSpan>,
    #[serde(serialize_with = "as_pairs")]
    global_bubbles: BTreeMap<HierarchyPath, BubbleSpan>,
}

fn as_pairs<S: Serializer>(map: &BTreeMap<HierarchyPath, BubbleSpan>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(map.iter())
}

impl NetlistComponent {
    pub(crate) fn new(id: ComponentId, component: &Component) -> Self {
        Self {
            id,
            kind: component.kind.clone(),
            label: correct_label(&component.label),
            ends: component
                .ends
                .iter()
                .map(|e| ConnectionEnd::new(e.location, e.direction, e.width))
                .collect(),
            local_bubbles: None,
            global_bubbles: BTreeMap::new(),
        }
    }

    /// The schematic component.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The component kind.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The normalised label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Kind and label, e.g. "pin `a`" or "or gate".
    pub fn describe(&self) -> String {
        let name = self.kind.display_name();
        if self.label.is_empty() {
            name
        } else {
            format!("{name} `{}`", self.label)
        }
    }

    /// The instantiated sheet, for sub-circuits.
    pub fn subcircuit(&self) -> Option<CircuitId> {
        self.kind.subcircuit()
    }

    /// Number of ends.
    pub fn end_count(&self) -> usize {
        self.ends.len()
    }

    /// End `index`.
    pub fn end(&self, index: usize) -> Option<&ConnectionEnd> {
        self.ends.get(index)
    }

    pub(crate) fn end_mut(&mut self, index: usize) -> Option<&mut ConnectionEnd> {
        self.ends.get_mut(index)
    }

    /// All ends in component order.
    pub fn ends(&self) -> &[ConnectionEnd] {
        &self.ends
    }

    /// Returns `true` if any bit of end `index` is connected.
    pub fn end_is_connected(&self, index: usize) -> bool {
        self.ends.get(index).is_some_and(ConnectionEnd::is_connected)
    }

    /// Finds the end and bit bound to `(net, bit)`, searching inputs or outputs.
    pub fn connection_bit_index(&self, net: NetId, bit: u32, output: bool) -> Option<(usize, u32)> {
        self.ends
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_output() == output)
            .find_map(|(i, e)| {
                e.points
                    .iter()
                    .position(|p| p.is(net, bit))
                    .map(|b| (i, b as u32))
            })
    }

    /// Finds the end of a sub-circuit instance behind sheet port `port`.
    pub fn end_index_for_port(&self, port: PortRef) -> Option<usize> {
        self.ends
            .iter()
            .position(|e| e.points.first().and_then(|p| p.child_port) == Some(port))
    }

    /// This component's bubble range among its sheet's bubbles.
    pub fn local_bubbles(&self) -> Option<BubbleSpan> {
        self.local_bubbles
    }

    /// This component's bubble range for the instance at `path`.
    pub fn global_bubbles(&self, path: &HierarchyPath) -> Option<BubbleSpan> {
        self.global_bubbles.get(path).copied()
    }

    /// Every hierarchy path with a global bubble range.
    pub fn bubble_paths(&self) -> impl Iterator<Item = (&HierarchyPath, &BubbleSpan)> {
        self.global_bubbles.iter()
    }

    pub(crate) fn set_local_bubbles(&mut self, span: BubbleSpan) {
        self.local_bubbles = Some(span);
    }

    pub(crate) fn add_global_bubbles(&mut self, path: HierarchyPath, start: BubbleCounts, count: BubbleCounts) {
        if !count.is_zero() {
            self.global_bubbles.insert(path, BubbleSpan { start, count });
        }
    }

    pub(crate) fn clear_bubbles(&mut self) {
        self.local_bubbles = None;
        self.global_bubbles.clear();
    }
}
