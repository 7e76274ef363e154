//! DRC status flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Outcome of validating a sheet, as OR-combinable flag bits.
///
/// `PASSED` is the empty set. A parent's status is the OR of its own result
/// and the results of every sheet it instantiates, so a failure anywhere in
/// the hierarchy shows up at the top.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrcStatus(u8);

impl DrcStatus {
    /// All checks passed.
    pub const PASSED: DrcStatus = DrcStatus(0);
    /// Labels are missing; annotating the sheet may fix it.
    pub const ANNOTATE_REQUIRED: DrcStatus = DrcStatus(1);
    /// At least one error was reported.
    pub const ERROR: DrcStatus = DrcStatus(2);
    /// The netlist is stale and must be rebuilt.
    pub const REQUIRED: DrcStatus = DrcStatus(4);

    /// Returns the raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if no flag is set.
    pub fn is_passed(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every flag of `other` is set in `self`.
    pub fn contains(self, other: DrcStatus) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for DrcStatus {
    type Output = DrcStatus;

    fn bitor(self, rhs: DrcStatus) -> DrcStatus {
        DrcStatus(self.0 | rhs.0)
    }
}

impl BitOrAssign for DrcStatus {
    fn bitor_assign(&mut self, rhs: DrcStatus) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DrcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_passed() {
            return write!(f, "passed");
        }
        let mut parts = Vec::new();
        if self.contains(DrcStatus::ERROR) {
            parts.push("error");
        }
        if self.contains(DrcStatus::ANNOTATE_REQUIRED) {
            parts.push("annotate required");
        }
        if self.contains(DrcStatus::REQUIRED) {
            parts.push("required");
        }
        write!(f, "{}", parts.join(", "))
    }
}

impl fmt::Debug for DrcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrcStatus({self})")
    }
}
