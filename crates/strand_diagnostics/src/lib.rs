//! Diagnostic creation, severity management, and rendering for netlist analysis.
//!
//! Every problem the netlist builder finds in a schematic becomes a structured
//! [`Diagnostic`] carrying a severity, a code, the circuit it belongs to and
//! [`Label`]s marking the offending components or wires. A [`DiagnosticSink`]
//! collects them during a validation run and a [`DiagnosticRenderer`] turns
//! them into text for the terminal.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle, Mark};
pub use renderer::{DiagnosticRenderer, MarkResolver, NoMarks, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
