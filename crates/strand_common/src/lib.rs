//! Shared foundational types used across the strand netlist toolchain.
//!
//! Interned names for labels and hierarchy paths, content hashing for netlist
//! fingerprints, and the common internal result type.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, StrandResult};
