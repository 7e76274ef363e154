//! Splitter resolution: bus hierarchy and tracing through complex splitters.
//!
//! A splitter's end 0 is the combined (bus) end; `bit_map[b]` names the
//! fanout end carrying bus bit `b`. The net on the bus end becomes the parent
//! of the nets on the fanout ends. When a fanout net already has a parent, or
//! adopting it would close a cycle, it is forced to be a root of its own and
//! the splitter becomes "complex": bits crossing it are linked explicitly by
//! [`Netlist::resolve_complex_splitters`].

use std::collections::HashSet;

use serde::Serialize;
use strand_diagnostics::{DiagnosticSink, Mark};
use strand_schematic::{Component, ComponentId, Location, WireId};
use tracing::debug;

use crate::builder::SheetBuild;
use crate::errors::{self, Aborted, Stage};
use crate::net::{find_net, ConnectionRef, Net, NetId, SplitterLink};
use crate::netlist::Netlist;

/// Geometry and bit map of one splitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitterInfo {
    id: ComponentId,
    location: Location,
    ends: Vec<Location>,
    widths: Vec<u32>,
    bit_map: Vec<u32>,
}

impl SplitterInfo {
    /// Extracts the splitter data of `component`, if it is a splitter.
    pub fn from_component(id: ComponentId, component: &Component) -> Option<Self> {
        let bit_map = component.kind.bit_map()?.to_vec();
        Some(Self {
            id,
            location: component.location,
            ends: component.ends.iter().map(|e| e.location).collect(),
            widths: component.ends.iter().map(|e| e.width).collect(),
            bit_map,
        })
    }

    /// The splitter component.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Fanout end of each bus bit.
    pub fn bit_map(&self) -> &[u32] {
        &self.bit_map
    }

    /// End locations, bus end first.
    pub fn ends(&self) -> &[Location] {
        &self.ends
    }

    /// Bus bits carried by fanout end `end`, in bus order.
    pub fn fanout_bits(&self, end: usize) -> Vec<u32> {
        self.bit_map
            .iter()
            .enumerate()
            .filter(|(_, &e)| e as usize == end)
            .map(|(b, _)| b as u32)
            .collect()
    }

    /// Position of bus bit `bit` within its fanout end.
    fn index_in_fanout(&self, bit: usize) -> Option<(usize, u32)> {
        let end = *self.bit_map.get(bit)? as usize;
        if end == 0 {
            return None;
        }
        let index = self.bit_map[..bit].iter().filter(|&&e| e as usize == end).count();
        Some((end, index as u32))
    }

    fn mark(&self) -> Mark {
        Mark::Instance(self.id.as_raw())
    }
}

/// Drops splitters that sit on top of another splitter with the same ends.
pub(crate) fn drop_duplicate_splitters(build: &mut SheetBuild<'_>) {
    let all = std::mem::take(&mut build.splitters);
    for (i, sp) in all.iter().enumerate() {
        let duplicate = all[i + 1..]
            .iter()
            .any(|o| o.location == sp.location && o.ends == sp.ends);
        if duplicate {
            build
                .sink
                .emit(errors::warn_duplicate_splitter(build.name, sp.id.as_raw()));
        } else {
            build.splitters.push(sp.clone());
        }
    }
}

/// Merges the two nets of every one-to-one splitter and removes the splitter.
pub(crate) fn merge_degenerate_splitters(build: &mut SheetBuild<'_>) -> Stage<()> {
    let all = std::mem::take(&mut build.splitters);
    for sp in all {
        let mut widest = None;
        for (e, &w) in sp.widths.iter().enumerate().skip(1) {
            if widest.map_or(true, |(_, best)| w > best) {
                widest = Some((e, w));
            }
        }
        let Some((end, width)) = widest else {
            build.splitters.push(sp);
            continue;
        };
        if width != sp.widths[0] {
            build.splitters.push(sp);
            continue;
        }
        let bus = find_net(&build.nets, sp.ends[0]);
        let relay = find_net(&build.nets, sp.ends[end]);
        match (bus, relay) {
            (Some(a), Some(b)) if a != b => {
                let absorbed = build.nets.remove(b);
                let a = if b < a { a - 1 } else { a };
                if !build.nets[a].merge(absorbed) {
                    build.sink.emit(
                        errors::error_internal(build.name, "one-to-one splitter joins nets of different widths")
                            .with_marks([sp.mark()]),
                    );
                    return Err(Aborted);
                }
            }
            (Some(_), Some(_)) => {}
            _ => build
                .sink
                .emit(errors::warn_degenerate_splitter(build.name, sp.id.as_raw())),
        }
    }
    Ok(())
}

/// Returns `true` if `ancestor` is `net` or lies on its parent chain.
fn is_ancestor(nets: &[Net], ancestor: usize, mut net: usize) -> bool {
    let mut steps = 0;
    loop {
        if net == ancestor {
            return true;
        }
        match nets[net].parent() {
            Some(p) if steps <= nets.len() => {
                net = p.as_raw() as usize;
                steps += 1;
            }
            _ => return false,
        }
    }
}

/// Links fanout nets to bus nets.
///
/// A fanout net that already has a parent, is already a forced root, or
/// would become its own ancestor is forced to be a root instead.
pub(crate) fn build_bus_hierarchy(build: &mut SheetBuild<'_>) {
    let all = std::mem::take(&mut build.splitters);
    let mut complex = 0;
    for sp in all {
        let Some(root) = find_net(&build.nets, sp.ends[0]) else {
            build
                .sink
                .emit(errors::warn_splitter_bus_unconnected(build.name, sp.id.as_raw()));
            continue;
        };
        let mut unconnected = false;
        for end in 1..sp.ends.len() {
            let Some(child) = find_net(&build.nets, sp.ends[end]) else {
                unconnected |= sp.widths[end] > 0;
                continue;
            };
            if sp.widths[end] == 0 {
                build.sink.emit(errors::warn_splitter_end_without_bits(
                    build.name,
                    sp.id.as_raw(),
                    end,
                ));
                continue;
            }
            let net = &build.nets[child];
            if child == root
                || net.is_forced_root()
                || !net.is_root()
                || is_ancestor(&build.nets, child, root)
            {
                build.nets[child].force_root();
                complex += 1;
                continue;
            }
            let net = &mut build.nets[child];
            net.set_parent(NetId::from_raw(root as u32));
            for bit in sp.fanout_bits(end) {
                net.push_parent_bit(bit);
            }
        }
        if unconnected {
            build
                .sink
                .emit(errors::warn_splitter_fanout_unconnected(build.name, sp.id.as_raw()));
        }
        build.splitters.push(sp);
    }
    debug!(splitters = build.splitters.len(), forced_roots = complex, "built bus hierarchy");
}

impl Netlist {
    /// The net passing through `location`.
    pub fn net_at(&self, location: Location) -> Option<NetId> {
        self.nets
            .iter()
            .find(|(_, n)| n.contains(location))
            .map(|(id, _)| id)
    }

    /// Follows parent links from `net` to its root net.
    pub fn root_of(&self, net: NetId) -> NetId {
        let mut current = net;
        for _ in 0..=self.nets.len() {
            match self.nets.try_get(current).and_then(Net::parent) {
                Some(p) => current = p,
                None => break,
            }
        }
        current
    }

    /// Resolves bit `bit` of `net` to its root net and root bit.
    ///
    /// Returns `None` if the bit is out of range anywhere along the chain.
    pub fn root_bit(&self, net: NetId, bit: u32) -> Option<(NetId, u32)> {
        let mut current = net;
        let mut index = bit;
        for _ in 0..=self.nets.len() {
            let n = self.nets.try_get(current)?;
            if index >= n.width() {
                return None;
            }
            match n.parent() {
                None => return Some((current, index)),
                Some(p) => {
                    index = *n.parent_bits().get(index as usize)?;
                    current = p;
                }
            }
        }
        None
    }

    /// Every `(net, bit)` that resolves to root bit `(root, bit)`.
    fn views(&self, root: NetId, bit: u32) -> Vec<(NetId, u32)> {
        let mut out = vec![(root, bit)];
        for (id, net) in self.nets.iter() {
            if net.is_root() {
                continue;
            }
            for b in 0..net.width() {
                if self.root_bit(id, b) == Some((root, bit)) {
                    out.push((id, b));
                }
            }
        }
        out
    }

    /// Root bits reachable from `(net, bit)` through splitters, start first.
    ///
    /// `skip` is the splitter the walk came through; it is not crossed back.
    pub fn reachable(&self, net: NetId, bit: u32, skip: Option<ComponentId>) -> Vec<(NetId, u32)> {
        let Some(start) = self.root_bit(net, bit) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(start, skip)];
        while let Some(((root, root_bit), skip)) = stack.pop() {
            if !seen.insert((root, root_bit)) {
                continue;
            }
            order.push((root, root_bit));
            for (view, view_bit) in self.views(root, root_bit) {
                let vnet = self.nets.get(view);
                for sp in &self.splitters {
                    if Some(sp.id) == skip {
                        continue;
                    }
                    for (end, &at) in sp.ends.iter().enumerate() {
                        if !vnet.contains(at) {
                            continue;
                        }
                        let next = if end == 0 {
                            sp.index_in_fanout(view_bit as usize).and_then(|(fan, idx)| {
                                let other = self.net_at(sp.ends[fan])?;
                                self.root_bit(other, idx)
                            })
                        } else {
                            sp.fanout_bits(end)
                                .get(view_bit as usize)
                                .and_then(|&bus_bit| {
                                    let bus = self.net_at(sp.ends[0])?;
                                    self.root_bit(bus, bus_bit)
                                })
                        };
                        if let Some(next) = next {
                            stack.push((next, Some(sp.id)));
                        }
                    }
                }
            }
        }
        order
    }

    /// Returns `true` if any root bit reachable from `(net, bit)` has a driver.
    pub fn has_hidden_source(&self, net: NetId, bit: u32, skip: Option<ComponentId>) -> bool {
        self.reachable(net, bit, skip)
            .iter()
            .any(|&(n, b)| self.nets.get(n).bit(b).is_some_and(|r| !r.sources.is_empty()))
    }

    /// The unique driver reachable from `(net, bit)`, with the wires on the way.
    ///
    /// No driver or several drivers is fatal.
    pub fn hidden_source(
        &self,
        net: NetId,
        bit: u32,
        sink: &DiagnosticSink,
    ) -> Stage<(ConnectionRef, Vec<WireId>)> {
        let mut drivers: Vec<ConnectionRef> = Vec::new();
        let mut wires: Vec<WireId> = Vec::new();
        for (n, b) in self.reachable(net, bit, None) {
            for (view, _) in self.views(n, b) {
                for w in self.nets.get(view).wires() {
                    if !wires.contains(&w) {
                        wires.push(w);
                    }
                }
            }
            if let Some(roles) = self.nets.get(n).bit(b) {
                for s in &roles.sources {
                    if !drivers.contains(s) {
                        drivers.push(*s);
                    }
                }
            }
        }
        if drivers.len() == 1 {
            return Ok((drivers[0], wires));
        }
        sink.emit(
            errors::error_ambiguous_hidden_source(&self.name, bit, drivers.len())
                .with_marks(wires.iter().map(|w| Mark::Wire(w.as_raw())))
                .with_marks(drivers.iter().map(|d| Mark::Instance(d.component.as_raw()))),
        );
        Err(Aborted)
    }

    /// Readers of bits reachable from `(net, bit)`, other than its own readers.
    pub fn hidden_sinks(&self, net: NetId, bit: u32) -> Vec<ConnectionRef> {
        self.reachable(net, bit, None)
            .into_iter()
            .skip(1)
            .filter_map(|(n, b)| self.nets.get(n).bit(b))
            .flat_map(|roles| roles.sinks.iter().copied())
            .collect()
    }

    /// Root bits other than `(net, bit)`'s own that it reaches through splitters.
    pub fn hidden_sink_nets(&self, net: NetId, bit: u32) -> Vec<(NetId, u32)> {
        self.reachable(net, bit, None).into_iter().skip(1).collect()
    }

    /// Links forced-root nets to the bus bits on the far side of their splitters.
    ///
    /// A bit without its own driver that finds a driver across the splitter
    /// records the link as a source; otherwise as a sink.
    pub(crate) fn resolve_complex_splitters(&mut self, sink: &DiagnosticSink) -> Stage<()> {
        let forced: Vec<NetId> = self
            .nets
            .iter()
            .filter(|(_, n)| n.is_forced_root())
            .map(|(id, _)| id)
            .collect();
        let mut links = Vec::new();
        for &net in &forced {
            let n = self.nets.get(net);
            for bit in 0..n.width() {
                for sp in &self.splitters {
                    for end in 1..sp.ends.len() {
                        if !n.contains(sp.ends[end]) {
                            continue;
                        }
                        let Some(&bus_bit) = sp.fanout_bits(end).get(bit as usize) else {
                            sink.emit(
                                errors::error_internal(&self.name, "splitter bit index out of range")
                                    .with_marks([sp.mark()]),
                            );
                            return Err(Aborted);
                        };
                        let resolved = self
                            .net_at(sp.ends[0])
                            .and_then(|bus| self.root_bit(bus, bus_bit));
                        let Some((root, root_bit)) = resolved else {
                            sink.emit(
                                errors::error_internal(&self.name, "splitter bus bit has no root net")
                                    .with_marks([sp.mark()]),
                            );
                            return Err(Aborted);
                        };
                        if root == net {
                            continue;
                        }
                        let link = SplitterLink {
                            splitter: sp.id,
                            net: root,
                            bit: root_bit,
                        };
                        let driven_here = n.bit(bit).is_some_and(|r| !r.sources.is_empty());
                        let is_source =
                            !driven_here && self.has_hidden_source(root, root_bit, Some(sp.id));
                        links.push((net, bit, link, is_source));
                    }
                }
            }
        }
        debug!(links = links.len(), "resolved complex splitters");
        for (net, bit, link, is_source) in links {
            if let Some(roles) = self.nets.get_mut(net).bit_mut(bit) {
                if is_source {
                    roles.source_nets.push(link);
                } else {
                    roles.sink_nets.push(link);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    fn info(bit_map: Vec<u32>) -> SplitterInfo {
        let c = Component::splitter(loc(0, 0), &[loc(10, 0), loc(10, 10)], bit_map);
        SplitterInfo::from_component(ComponentId::from_raw(0), &c).unwrap()
    }

    #[test]
    fn fanout_bits_in_bus_order() {
        let sp = info(vec![1, 2, 1, 2]);
        assert_eq!(sp.fanout_bits(1), vec![0, 2]);
        assert_eq!(sp.fanout_bits(2), vec![1, 3]);
        assert!(sp.fanout_bits(3).is_empty());
    }

    #[test]
    fn index_in_fanout_counts_earlier_bits() {
        let sp = info(vec![1, 2, 1, 0]);
        assert_eq!(sp.index_in_fanout(0), Some((1, 0)));
        assert_eq!(sp.index_in_fanout(2), Some((1, 1)));
        assert_eq!(sp.index_in_fanout(3), None);
        assert_eq!(sp.index_in_fanout(9), None);
    }

    #[test]
    fn widths_follow_bit_map() {
        let sp = info(vec![1, 1, 1, 2]);
        assert_eq!(sp.widths, vec![4, 3, 1]);
    }

    #[test]
    fn non_splitters_are_rejected() {
        let c = Component::clock(loc(0, 0));
        assert!(SplitterInfo::from_component(ComponentId::from_raw(0), &c).is_none());
    }

    #[test]
    fn ancestor_walk() {
        let mut nets = vec![Net::new(), Net::new(), Net::new()];
        nets[1].set_parent(NetId::from_raw(0));
        nets[2].set_parent(NetId::from_raw(1));
        assert!(is_ancestor(&nets, 0, 2));
        assert!(is_ancestor(&nets, 2, 2));
        assert!(!is_ancestor(&nets, 2, 0));
    }
}
