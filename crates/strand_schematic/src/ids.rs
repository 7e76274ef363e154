//! Opaque ID newtypes for schematic entities.
//!
//! Circuit IDs index the schematic's sheet arena. Component and wire IDs are
//! handed out by their circuit from a monotonic counter and are never reused,
//! so they stay stable when other elements are removed.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a circuit sheet in the schematic.
    CircuitId, "circuit#"
);

define_id!(
    /// Opaque, copyable ID for a component placed on a sheet.
    ComponentId, "component#"
);

define_id!(
    /// Opaque, copyable ID for a wire segment drawn on a sheet.
    WireId, "wire#"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = ComponentId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.to_string(), "component#42");
    }

    #[test]
    fn ids_hash_and_order() {
        let mut set = HashSet::new();
        set.insert(WireId::from_raw(1));
        set.insert(WireId::from_raw(1));
        set.insert(WireId::from_raw(2));
        assert_eq!(set.len(), 2);
        assert!(CircuitId::from_raw(1) < CircuitId::from_raw(2));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&CircuitId::from_raw(7)).unwrap();
        assert_eq!(json, "7");
    }
}
