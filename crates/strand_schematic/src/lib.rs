//! The circuit model consumed by the netlist builder.
//!
//! A [`Schematic`] is a set of [`Circuit`] sheets. Each sheet holds placed
//! [`Component`]s (with their connection [`End`]s) and drawn [`Wire`]
//! segments. Sub-circuit components reference another sheet of the same
//! schematic by [`CircuitId`]. Every structural edit bumps the sheet's
//! revision stamp so that cached netlists can tell when they are stale.

#![warn(missing_docs)]

pub mod arena;
pub mod circuit;
pub mod component;
pub mod geometry;
pub mod ids;
pub mod schematic;

pub use arena::{Arena, ArenaId};
pub use circuit::Circuit;
pub use component::{Component, ComponentKind, GateKind, IoKind, SequentialKind, Trigger};
pub use geometry::{Direction, End, Location, Wire};
pub use ids::{CircuitId, ComponentId, WireId};
pub use schematic::{Schematic, SchematicError};
