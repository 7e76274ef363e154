//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message.
///
/// Ordered by declaration: `Info < Warning < SevereWarning < Error < Fatal`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Progress or summary information.
    Info,
    /// A questionable construct; the netlist is still usable.
    Warning,
    /// A construct that most likely does not behave as drawn.
    SevereWarning,
    /// A design rule violation; the circuit fails validation.
    Error,
    /// An aborted analysis stage; the netlist is cleared.
    Fatal,
}

impl Severity {
    /// Returns `true` for [`Error`](Severity::Error) and [`Fatal`](Severity::Fatal).
    pub fn is_error(self) -> bool {
        self >= Severity::Error
    }

    /// Returns `true` for both warning levels.
    pub fn is_warning(self) -> bool {
        matches!(self, Severity::Warning | Severity::SevereWarning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::SevereWarning => write!(f, "severe warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::SevereWarning);
        assert!(Severity::SevereWarning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn error_and_warning_classes() {
        assert!(Severity::Fatal.is_error());
        assert!(Severity::Error.is_error());
        assert!(!Severity::SevereWarning.is_error());
        assert!(Severity::SevereWarning.is_warning());
        assert!(!Severity::Info.is_warning());
    }

    #[test]
    fn display() {
        assert_eq!(Severity::SevereWarning.to_string(), "severe warning");
        assert_eq!(Severity::Fatal.to_string(), "fatal error");
    }
}
