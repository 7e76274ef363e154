//! Hierarchical netlist construction and clock-domain analysis.
//!
//! Turns the sheets of a [`strand_schematic::Schematic`] into validated,
//! bit-exact netlists: wires and touching ends become nets, tunnels merge nets
//! by label, splitters relate fanout nets to the bits of their bus, and every
//! component end is bound to the root-net bits it drives or reads.
//!
//! # Stages
//!
//! - **Design rules** (`E101`-`E110`) run on each sheet before any net is built.
//! - **Netlist construction** (`E201`-`E207`, `W201`-`W209`) runs per sheet,
//!   children before parents, once per sheet however often it is instantiated.
//! - **Top-level analysis** (`E208`-`E210`, `W301`-`W303`) traces clock trees,
//!   numbers board I/O bubbles and detects gated clocks on the whole hierarchy.
//!
//! [`NetlistStore::validate`] runs all three and caches the result.

#![warn(missing_docs)]

mod builder;
mod clock;
mod component;
pub mod drc;
pub mod errors;
mod gated;
mod hierarchy;
mod label;
mod net;
mod netlist;
mod options;
mod path;
mod roles;
mod splitter;
mod status;
mod tunnel;

pub use clock::{ClockId, ClockSources, ClockTree};
pub use component::{
    BubbleCounts, BubbleSpan, ConnectionEnd, ConnectionPoint, NetlistComponent, PortKind, PortRef,
};
pub use drc::{DrcContext, DrcEngine, DrcRule};
pub use hierarchy::NetlistStore;
pub use label::{correct_label, is_reserved, is_valid_identifier, is_valid_label, label_key};
pub use net::{BitRoles, ConnectionRef, Net, NetId, SplitterLink};
pub use netlist::Netlist;
pub use options::{AnalysisOptions, Milestone};
pub use path::HierarchyPath;
pub use splitter::SplitterInfo;
pub use status::DrcStatus;
