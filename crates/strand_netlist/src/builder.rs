//! Per-sheet netlist construction.
//!
//! Stages run in a fixed order; each one either refines the working set of
//! nets or aborts after reporting to the sink:
//!
//! 1. group wires into nets and assign widths from touching ends
//! 2. create wireless nets where ends touch directly
//! 3. merge same-labelled tunnels
//! 4. drop duplicate splitters and nets no end touches
//! 5. collapse one-to-one splitters, link fanout nets to their bus
//! 6. bind component ends to root-net bits
//! 7. link forced-root nets through their splitters

use std::collections::HashMap;

use strand_diagnostics::DiagnosticSink;
use strand_schematic::{Circuit, CircuitId, Component, ComponentId, ComponentKind};
use tracing::debug;

use crate::errors::{self, Aborted, Stage};
use crate::net::{aggregate_wires, assign_widths, detect_hidden_nets, drop_empty_nets, Net};
use crate::netlist::Netlist;
use crate::options::{AnalysisOptions, Milestone};
use crate::roles::assign_roles;
use crate::splitter::{
    build_bus_hierarchy, drop_duplicate_splitters, merge_degenerate_splitters, SplitterInfo,
};
use crate::tunnel::{attach_tunnel_labels, merge_tunnels};

/// Working state of one sheet before its nets are installed in the netlist.
pub(crate) struct SheetBuild<'a> {
    pub(crate) circuit: &'a Circuit,
    pub(crate) name: &'a str,
    pub(crate) sink: &'a DiagnosticSink,
    pub(crate) nets: Vec<Net>,
    pub(crate) splitters: Vec<SplitterInfo>,
}

impl<'a> SheetBuild<'a> {
    pub(crate) fn new(circuit: &'a Circuit, sink: &'a DiagnosticSink) -> Self {
        Self {
            circuit,
            name: circuit.name(),
            sink,
            nets: Vec::new(),
            splitters: Vec::new(),
        }
    }

    /// Components taking part in netlisting; probes are transparent.
    pub(crate) fn components(&self) -> impl Iterator<Item = (ComponentId, &'a Component)> + 'a {
        let circuit: &'a Circuit = self.circuit;
        circuit
            .components()
            .filter(|(_, c)| !matches!(c.kind, ComponentKind::Probe))
    }
}

/// Builds `netlist` from `circuit`. Sub-circuit netlists must already be
/// present in `children`.
pub(crate) fn build_netlist(
    netlist: &mut Netlist,
    circuit: &Circuit,
    children: &HashMap<CircuitId, Netlist>,
    sink: &DiagnosticSink,
    options: &mut AnalysisOptions<'_>,
) -> Stage<()> {
    let name = circuit.name();
    sink.emit(errors::info_building(name));

    let mut build = SheetBuild::new(circuit, sink);
    build.nets = aggregate_wires(circuit);
    assign_widths(&mut build)?;
    options.report(name, Milestone::NetsAggregated);

    detect_hidden_nets(&mut build)?;
    options.report(name, Milestone::HiddenNetsDetected);

    attach_tunnel_labels(&mut build);
    merge_tunnels(&mut build)?;
    options.report(name, Milestone::TunnelsMerged);

    build.splitters = build
        .components()
        .filter_map(|(id, c)| SplitterInfo::from_component(id, c))
        .collect();
    drop_duplicate_splitters(&mut build);
    drop_empty_nets(&mut build);
    merge_degenerate_splitters(&mut build)?;
    build_bus_hierarchy(&mut build);
    options.report(name, Milestone::SplittersResolved);

    let SheetBuild {
        nets, splitters, ..
    } = build;
    netlist.install_nets(nets, splitters);
    verify_root_resolution(netlist, sink)?;

    assign_roles(netlist, circuit, children, sink)?;
    options.report(name, Milestone::RolesAssigned);

    netlist.resolve_complex_splitters(sink)?;
    options.report(name, Milestone::ComplexSplittersResolved);

    sink.emit(errors::info_net_summary(
        name,
        netlist.number_of_nets(),
        netlist.number_of_busses(),
    ));
    debug!(
        sheet = name,
        nets = netlist.nets.len(),
        components = netlist.components.len(),
        "built netlist"
    );
    Ok(())
}

/// Every bit of every net must resolve to a bit of a root net.
fn verify_root_resolution(netlist: &Netlist, sink: &DiagnosticSink) -> Stage<()> {
    for (id, net) in netlist.nets() {
        for bit in 0..net.width() {
            if netlist.root_bit(id, bit).is_none() {
                sink.emit(
                    errors::error_internal(netlist.name(), &format!("bit {bit} of {id} has no root"))
                        .with_marks(net.wire_marks()),
                );
                return Err(Aborted);
            }
        }
    }
    Ok(())
}
