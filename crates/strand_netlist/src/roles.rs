//! Role assignment: binding component ends to root-net bits.
//!
//! Output ends drive their bits, every other end reads them. Once all
//! components are bound the netlist is checked for short circuits, undriven
//! readers and unconnected inputs.

use std::collections::{HashMap, HashSet};

use strand_diagnostics::{DiagnosticSink, Mark};
use strand_schematic::{Circuit, CircuitId, Component, ComponentId, ComponentKind, Direction};
use tracing::debug;

use crate::component::{NetlistComponent, PortRef};
use crate::errors::{self, Aborted, Stage};
use crate::net::{ConnectionRef, NetId};
use crate::netlist::Netlist;

/// Human-readable name of a component for messages.
pub(crate) fn describe(component: &NetlistComponent) -> String {
    component.describe()
}

/// Binds every end of every netlisted component and classifies the components.
pub(crate) fn assign_roles(
    netlist: &mut Netlist,
    circuit: &Circuit,
    children: &HashMap<CircuitId, Netlist>,
    sink: &DiagnosticSink,
) -> Stage<()> {
    for (id, comp) in circuit.components() {
        let nc = match &comp.kind {
            ComponentKind::Probe | ComponentKind::Splitter { .. } | ComponentKind::Tunnel => continue,
            ComponentKind::Subcircuit { .. } => process_subcircuit(netlist, id, comp, children, sink)?,
            _ => process_component(netlist, id, comp, &[], sink)?,
        };
        netlist.push_component(nc);
    }
    debug!(
        components = netlist.components.len(),
        subcircuits = netlist.subcircuits.len(),
        "assigned roles"
    );
    Ok(())
}

/// Binds the ends of an ordinary component.
///
/// `ports`, when non-empty, gives the sheet port behind each end.
pub(crate) fn process_component(
    netlist: &mut Netlist,
    id: ComponentId,
    comp: &Component,
    ports: &[PortRef],
    sink: &DiagnosticSink,
) -> Stage<NetlistComponent> {
    let mut nc = NetlistComponent::new(id, comp);
    for (e, end) in comp.ends.iter().enumerate() {
        let port = ports.get(e).copied();
        let net = netlist.net_at(end.location);
        for bit in 0..end.width {
            let mut bound = None;
            if let Some(net) = net {
                let Some((root, root_bit)) = netlist.root_bit(net, bit) else {
                    sink.emit(
                        errors::error_internal(&netlist.name, "component bit has no root net")
                            .with_marks([Mark::Instance(id.as_raw())]),
                    );
                    return Err(Aborted);
                };
                let conn = ConnectionRef::new(id, e as u32, bit);
                let Some(roles) = netlist.nets.get_mut(root).bit_mut(root_bit) else {
                    sink.emit(errors::error_internal(&netlist.name, "root bit out of range"));
                    return Err(Aborted);
                };
                if end.direction.is_output_only() {
                    roles.sources.push(conn);
                } else {
                    roles.sinks.push(conn);
                }
                bound = Some((root, root_bit));
            }
            if let Some(point) = nc.end_mut(e).and_then(|x| x.point_mut(bit)) {
                if let Some((root, root_bit)) = bound {
                    point.net = Some(root);
                    point.bit = root_bit;
                }
                point.child_port = port;
            }
        }
    }
    Ok(nc)
}

/// Binds the ends of a sub-circuit instance and correlates them with the
/// pins of the instantiated sheet.
pub(crate) fn process_subcircuit(
    netlist: &mut Netlist,
    id: ComponentId,
    comp: &Component,
    children: &HashMap<CircuitId, Netlist>,
    sink: &DiagnosticSink,
) -> Stage<NetlistComponent> {
    let ComponentKind::Subcircuit { circuit, ports } = &comp.kind else {
        return process_component(netlist, id, comp, &[], sink);
    };
    let Some(child) = children.get(circuit) else {
        sink.emit(
            errors::error_internal(&netlist.name, "sub-circuit has no netlist")
                .with_marks([Mark::Instance(id.as_raw())]),
        );
        return Err(Aborted);
    };
    let mut refs = Vec::with_capacity(comp.ends.len());
    for e in 0..comp.ends.len() {
        let label = ports.get(e).map(String::as_str).unwrap_or_default();
        let Some(port) = child.port_info(label) else {
            sink.emit(errors::error_port_not_found(
                &netlist.name,
                label,
                child.name(),
                id.as_raw(),
            ));
            return Err(Aborted);
        };
        refs.push(port);
    }
    process_component(netlist, id, comp, &refs, sink)
}

/// Reports every root-net bit with more than one driver.
///
/// Returns `true` if a short circuit was found.
pub(crate) fn check_short_circuits(netlist: &Netlist, sink: &DiagnosticSink) -> bool {
    let mut found = false;
    for (_, net) in netlist.nets.iter().filter(|(_, n)| n.is_root()) {
        for (bit, roles) in net.bits().iter().enumerate() {
            if roles.driver_count() <= 1 {
                continue;
            }
            found = true;
            sink.emit(
                errors::error_short_circuit(&netlist.name, bit as u32)
                    .with_marks(net.wire_marks())
                    .with_marks(roles.sources.iter().map(|s| Mark::Instance(s.component.as_raw()))),
            );
        }
    }
    found
}

/// Warns about driven bits nobody reads and about readers without a driver.
pub(crate) fn check_sinks_without_source(netlist: &Netlist, sink: &DiagnosticSink) {
    let mut readers: Vec<(ConnectionRef, NetId, u32)> = Vec::new();
    let mut served: HashSet<ConnectionRef> = HashSet::new();
    for (id, net) in netlist.nets.iter().filter(|(_, n)| n.is_root()) {
        let mut unread = Vec::new();
        for (bit, roles) in net.bits().iter().enumerate() {
            let bit = bit as u32;
            readers.extend(roles.sinks.iter().map(|s| (*s, id, bit)));
            if roles.driver_count() == 0 {
                continue;
            }
            let hidden = netlist.hidden_sinks(id, bit);
            if roles.sinks.is_empty() && roles.sink_nets.is_empty() && hidden.is_empty() {
                unread.push(bit);
            }
            served.extend(roles.sinks.iter().copied());
            served.extend(hidden);
        }
        if !unread.is_empty() {
            sink.emit(
                errors::warn_source_without_sink(&netlist.name, &unread).with_marks(net.wire_marks()),
            );
        }
    }
    for (reader, net, bit) in readers {
        if served.contains(&reader) || netlist.has_hidden_source(net, bit, None) {
            continue;
        }
        let what = netlist
            .component(reader.component)
            .map(describe)
            .unwrap_or_else(|| reader.component.to_string());
        sink.emit(
            errors::warn_sink_without_source(&netlist.name, &what, reader.bit)
                .with_marks([Mark::Instance(reader.component.as_raw())])
                .with_marks(netlist.nets.get(net).wire_marks()),
        );
    }
}

/// Warns about input ends with no connected bit.
pub(crate) fn check_unconnected_inputs(netlist: &Netlist, sink: &DiagnosticSink) {
    let ordinary = netlist.ordinary.iter().map(|&s| (s, false));
    let subs = netlist.subcircuits.iter().map(|&s| (s, true));
    for (slot, severe) in ordinary.chain(subs) {
        let comp = &netlist.components[slot];
        for (e, end) in comp.ends().iter().enumerate() {
            if end.direction() != Direction::Input || end.is_connected() {
                continue;
            }
            sink.emit(
                errors::warn_unconnected_input(&netlist.name, &describe(comp), e, severe)
                    .with_marks([Mark::Instance(comp.id().as_raw())]),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_schematic::{Component, GateKind, Location};

    #[test]
    fn describe_uses_label() {
        let pin = Component::input_pin("a", Location::new(0, 0), 1);
        let nc = NetlistComponent::new(ComponentId::from_raw(0), &pin);
        assert_eq!(describe(&nc), "pin `a`");

        let gate = Component::gate(GateKind::Or, &[Location::new(0, 0)], Location::new(10, 0), 1);
        let nc = NetlistComponent::new(ComponentId::from_raw(1), &gate);
        assert_eq!(describe(&nc), "or gate");
    }
}
