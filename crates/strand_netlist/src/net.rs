//! Nets and the wire aggregator.
//!
//! A [`Net`] is a maximal set of wire segments transitively sharing an
//! endpoint, plus the component-end locations that touch it. Nets form a
//! forest through splitters: a child net is a bit-subset view of its parent
//! and only root nets carry per-bit source/sink roles.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use petgraph::unionfind::UnionFind;
use serde::Serialize;
use strand_diagnostics::Mark;
use strand_schematic::{ArenaId, Circuit, ComponentId, Location, Wire, WireId};
use tracing::debug;

use crate::builder::SheetBuild;
use crate::errors::{self, Aborted, Stage};

/// Opaque, copyable ID for a net within one netlist.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct NetId(u32);

impl NetId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl ArenaId for NetId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

/// One bit of one component end.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct ConnectionRef {
    /// The component.
    pub component: ComponentId,
    /// End index within the component.
    pub end: u32,
    /// Bit index within the end.
    pub bit: u32,
}

impl ConnectionRef {
    /// Creates a connection reference.
    pub fn new(component: ComponentId, end: u32, bit: u32) -> Self {
        Self {
            component,
            end,
            bit,
        }
    }
}

/// A root-net bit reached through a complex splitter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct SplitterLink {
    /// The splitter crossed.
    pub splitter: ComponentId,
    /// Root net on the other side.
    pub net: NetId,
    /// Bit of that root net.
    pub bit: u32,
}

/// Sources and sinks of one bit of a root net.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize)]
pub struct BitRoles {
    pub(crate) sources: Vec<ConnectionRef>,
    pub(crate) sinks: Vec<ConnectionRef>,
    pub(crate) source_nets: Vec<SplitterLink>,
    pub(crate) sink_nets: Vec<SplitterLink>,
}

impl BitRoles {
    /// Component ends driving this bit.
    pub fn sources(&self) -> &[ConnectionRef] {
        &self.sources
    }

    /// Component ends reading this bit.
    pub fn sinks(&self) -> &[ConnectionRef] {
        &self.sinks
    }

    /// Bits of other nets that drive this bit through a complex splitter.
    pub fn source_nets(&self) -> &[SplitterLink] {
        &self.source_nets
    }

    /// Bits of other nets that this bit drives through a complex splitter.
    pub fn sink_nets(&self) -> &[SplitterLink] {
        &self.sink_nets
    }

    /// Number of drivers, direct or through splitters.
    pub fn driver_count(&self) -> usize {
        self.sources.len() + self.source_nets.len()
    }
}

/// A bundle of electrically connected wire segments.
#[derive(Clone, Default, Debug, Serialize)]
pub struct Net {
    wires: BTreeSet<WireId>,
    points: BTreeSet<Location>,
    width: u32,
    parent: Option<NetId>,
    parent_bits: Vec<u32>,
    forced_root: bool,
    tunnels: BTreeSet<String>,
    bits: Vec<BitRoles>,
}

impl Net {
    /// Creates an empty net of unknown width.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a wireless net at a single location.
    pub(crate) fn at_point(location: Location, width: u32) -> Self {
        let mut net = Self::new();
        net.points.insert(location);
        net.width = width;
        net
    }

    pub(crate) fn add_wire(&mut self, id: WireId, wire: &Wire) {
        self.wires.insert(id);
        self.points.extend(wire.endpoints());
    }

    /// Returns `true` if the net passes through `location`.
    pub fn contains(&self, location: Location) -> bool {
        self.points.contains(&location)
    }

    /// Width in bits; 0 while unknown.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` for nets wider than one bit.
    pub fn is_bus(&self) -> bool {
        self.width > 1
    }

    /// Returns `true` if the net has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if a complex splitter made this net a root.
    pub fn is_forced_root(&self) -> bool {
        self.forced_root
    }

    /// The parent net, for child nets.
    pub fn parent(&self) -> Option<NetId> {
        self.parent
    }

    /// Parent bit index of each bit, for child nets.
    pub fn parent_bits(&self) -> &[u32] {
        &self.parent_bits
    }

    /// Wire segments of this net.
    pub fn wires(&self) -> impl Iterator<Item = WireId> + '_ {
        self.wires.iter().copied()
    }

    /// Grid points of this net.
    pub fn points(&self) -> impl Iterator<Item = Location> + '_ {
        self.points.iter().copied()
    }

    /// Tunnel labels attached to this net.
    pub fn tunnels(&self) -> impl Iterator<Item = &str> {
        self.tunnels.iter().map(String::as_str)
    }

    /// Roles of bit `bit`; `None` for child nets and out-of-range bits.
    pub fn bit(&self, bit: u32) -> Option<&BitRoles> {
        self.bits.get(bit as usize)
    }

    pub(crate) fn bit_mut(&mut self, bit: u32) -> Option<&mut BitRoles> {
        self.bits.get_mut(bit as usize)
    }

    pub(crate) fn bits(&self) -> &[BitRoles] {
        &self.bits
    }

    /// Sets the width, returning `false` if a different width is already set.
    pub(crate) fn set_width(&mut self, width: u32) -> bool {
        if self.width == 0 {
            self.width = width;
            true
        } else {
            self.width == width
        }
    }

    pub(crate) fn add_tunnel(&mut self, key: String) {
        self.tunnels.insert(key);
    }

    pub(crate) fn shares_tunnel(&self, other: &Net) -> bool {
        self.tunnels.iter().any(|t| other.tunnels.contains(t))
    }

    /// Absorbs `other`. Returns `false` on a width conflict; the nets are
    /// merged anyway so the caller can report every conflict at once.
    pub(crate) fn merge(&mut self, other: Net) -> bool {
        let compatible = self.set_width(other.width) || other.width == 0;
        self.wires.extend(other.wires);
        self.points.extend(other.points);
        self.tunnels.extend(other.tunnels);
        compatible
    }

    pub(crate) fn set_parent(&mut self, parent: NetId) {
        self.parent = Some(parent);
    }

    pub(crate) fn push_parent_bit(&mut self, bit: u32) {
        self.parent_bits.push(bit);
    }

    pub(crate) fn force_root(&mut self) {
        self.parent = None;
        self.parent_bits.clear();
        self.forced_root = true;
    }

    pub(crate) fn init_roles(&mut self) {
        self.bits = if self.parent.is_none() {
            vec![BitRoles::default(); self.width as usize]
        } else {
            Vec::new()
        };
    }

    pub(crate) fn wire_marks(&self) -> impl Iterator<Item = Mark> + '_ {
        self.wires.iter().map(|w| Mark::Wire(w.as_raw()))
    }
}

/// Returns the index of the net passing through `location`.
pub(crate) fn find_net(nets: &[Net], location: Location) -> Option<usize> {
    nets.iter().position(|n| n.contains(location))
}

/// Groups the wires of `circuit` into nets by shared endpoints.
///
/// Nets come out ordered by their lowest wire id.
pub(crate) fn aggregate_wires(circuit: &Circuit) -> Vec<Net> {
    let wires: Vec<(WireId, &Wire)> = circuit.wires().collect();
    let mut sets = UnionFind::<usize>::new(wires.len());
    let mut first_at: HashMap<Location, usize> = HashMap::new();
    for (i, (_, wire)) in wires.iter().enumerate() {
        for point in wire.endpoints() {
            match first_at.get(&point) {
                Some(&j) => {
                    sets.union(i, j);
                }
                None => {
                    first_at.insert(point, i);
                }
            }
        }
    }

    let mut net_of_set: HashMap<usize, usize> = HashMap::new();
    let mut nets: Vec<Net> = Vec::new();
    for (i, (id, wire)) in wires.iter().enumerate() {
        let set = sets.find(i);
        let index = *net_of_set.entry(set).or_insert_with(|| {
            nets.push(Net::new());
            nets.len() - 1
        });
        nets[index].add_wire(*id, wire);
    }
    debug!(wires = wires.len(), nets = nets.len(), "aggregated wires");
    nets
}

/// Sets net widths from the component ends touching them.
///
/// Every net whose ends disagree is reported in one fatal diagnostic.
pub(crate) fn assign_widths(build: &mut SheetBuild<'_>) -> Stage<()> {
    let mut conflicts: BTreeSet<usize> = BTreeSet::new();
    for (_, comp) in build.components() {
        for end in &comp.ends {
            if let Some(i) = find_net(&build.nets, end.location) {
                if !build.nets[i].set_width(end.width) {
                    conflicts.insert(i);
                }
            }
        }
    }
    if conflicts.is_empty() {
        return Ok(());
    }
    let marks: Vec<Mark> = conflicts
        .iter()
        .flat_map(|&i| build.nets[i].wire_marks())
        .collect();
    build
        .sink
        .emit(errors::error_bitwidth(build.name).with_marks(marks));
    Err(Aborted)
}

/// Creates nets for component ends that touch without a wire.
///
/// Two ends at one location with no net there become a wireless net when
/// their widths agree; otherwise the mismatch is fatal.
pub(crate) fn detect_hidden_nets(build: &mut SheetBuild<'_>) -> Stage<()> {
    let mut first_width: HashMap<Location, u32> = HashMap::new();
    let mut offenders: BTreeSet<ComponentId> = BTreeSet::new();
    let mut created = Vec::new();
    for (id, comp) in build.components() {
        for end in &comp.ends {
            let Some(&width) = first_width.get(&end.location) else {
                first_width.insert(end.location, end.width);
                continue;
            };
            let wired = find_net(&build.nets, end.location).is_some();
            if wired && !created.contains(&end.location) {
                continue;
            }
            if width != end.width {
                offenders.insert(id);
            } else if !wired {
                created.push(end.location);
                build.nets.push(Net::at_point(end.location, width));
            }
        }
    }
    if offenders.is_empty() {
        debug!(hidden = created.len(), "detected wireless nets");
        return Ok(());
    }
    build.sink.emit(
        errors::error_component_width(build.name)
            .with_marks(offenders.iter().map(|c| Mark::Instance(c.as_raw()))),
    );
    Err(Aborted)
}

/// Removes nets of unknown width, i.e. nets no component end touches.
pub(crate) fn drop_empty_nets(build: &mut SheetBuild<'_>) {
    let (empty, kept): (Vec<Net>, Vec<Net>) = std::mem::take(&mut build.nets)
        .into_iter()
        .partition(|n| n.width == 0);
    build.nets = kept;
    for net in &empty {
        build
            .sink
            .emit(errors::warn_empty_net(build.name).with_marks(net.wire_marks()));
    }
}
