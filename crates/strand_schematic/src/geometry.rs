//! Grid locations, component ends and wire segments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the drawing grid.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Location {
    /// Creates a location.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The electrical direction of a component end, seen from the component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The component reads the connected signal.
    Input,
    /// The component drives the connected signal.
    Output,
    /// Both, e.g. a bidirectional port or a splitter end.
    InOut,
}

impl Direction {
    /// Returns `true` for `Input` and `InOut`.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input | Direction::InOut)
    }

    /// Returns `true` for `Output` and `InOut`.
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::InOut)
    }

    /// Returns `true` only for a pure output end.
    ///
    /// Connection roles use this: an output end drives its net, anything else
    /// (including bidirectional ends) is registered as a sink.
    pub fn is_output_only(self) -> bool {
        self == Direction::Output
    }
}

/// A connection point of a component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct End {
    /// Where the end sits on the grid.
    pub location: Location,
    /// Input, output or bidirectional.
    pub direction: Direction,
    /// Bit width of the end.
    pub width: u32,
}

impl End {
    /// Creates an input end.
    pub fn input(location: Location, width: u32) -> Self {
        Self {
            location,
            direction: Direction::Input,
            width,
        }
    }

    /// Creates an output end.
    pub fn output(location: Location, width: u32) -> Self {
        Self {
            location,
            direction: Direction::Output,
            width,
        }
    }

    /// Creates a bidirectional end.
    pub fn inout(location: Location, width: u32) -> Self {
        Self {
            location,
            direction: Direction::InOut,
            width,
        }
    }
}

/// An undirected wire segment between two grid points.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Wire {
    /// One endpoint.
    pub from: Location,
    /// The other endpoint.
    pub to: Location,
}

impl Wire {
    /// Creates a wire segment.
    pub fn new(from: Location, to: Location) -> Self {
        Self { from, to }
    }

    /// Returns both endpoints.
    pub fn endpoints(&self) -> [Location; 2] {
        [self.from, self.to]
    }

    /// Returns `true` if either endpoint of `self` equals either endpoint of `other`.
    pub fn shares_end(&self, other: &Wire) -> bool {
        self.endpoints()
            .iter()
            .any(|p| other.endpoints().contains(p))
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_predicates() {
        assert!(Direction::InOut.is_input());
        assert!(Direction::InOut.is_output());
        assert!(!Direction::InOut.is_output_only());
        assert!(Direction::Output.is_output_only());
        assert!(!Direction::Input.is_output());
    }

    #[test]
    fn shared_endpoints() {
        let a = Wire::new(Location::new(0, 0), Location::new(10, 0));
        let b = Wire::new(Location::new(10, 0), Location::new(10, 10));
        let c = Wire::new(Location::new(20, 0), Location::new(30, 0));
        assert!(a.shares_end(&b));
        assert!(b.shares_end(&a));
        assert!(!a.shares_end(&c));
    }

    #[test]
    fn display_formats() {
        let w = Wire::new(Location::new(1, 2), Location::new(3, 4));
        assert_eq!(w.to_string(), "(1, 2) to (3, 4)");
    }

    #[test]
    fn direction_serde_lowercase() {
        let json = serde_json::to_string(&Direction::InOut).unwrap();
        assert_eq!(json, "\"inout\"");
    }
}
