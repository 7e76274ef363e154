//! Structured diagnostic messages with severity, code, marks and notes.

use crate::code::DiagnosticCode;
use crate::label::{Label, Mark};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic produced while validating a schematic.
///
/// Each diagnostic includes:
/// - A severity level and unique code
/// - A primary message and, when known, the circuit (sheet) it concerns
/// - Labels marking components or wires for highlighting
/// - Notes (instance traces) and help lines
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Name of the circuit the marks refer to.
    pub circuit: Option<String>,
    /// Marked schematic elements.
    pub labels: Vec<Label>,
    /// Explanatory footnotes (e.g. "note: gated in instance `u1`").
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic with an explicit severity.
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            circuit: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an informational diagnostic.
    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    /// Creates a normal warning.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a severe warning.
    pub fn severe(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::SevereWarning, code, message)
    }

    /// Creates an error.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a fatal error.
    pub fn fatal(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, code, message)
    }

    /// Sets the circuit this diagnostic refers to.
    pub fn in_circuit(mut self, name: impl Into<String>) -> Self {
        self.circuit = Some(name.into());
        self
    }

    /// Adds a label to this diagnostic.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds an unlabelled primary mark for each element.
    pub fn with_marks(mut self, marks: impl IntoIterator<Item = Mark>) -> Self {
        self.labels
            .extend(marks.into_iter().map(|m| Label::primary(m, "")));
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Returns the marked elements in label order.
    pub fn marks(&self) -> impl Iterator<Item = Mark> + '_ {
        self.labels.iter().map(|l| l.mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_fatal() {
        let code = DiagnosticCode::new(Category::Error, 204);
        let diag = Diagnostic::fatal(code, "short circuit").in_circuit("main");
        assert_eq!(diag.severity, Severity::Fatal);
        assert_eq!(diag.circuit.as_deref(), Some("main"));
        assert_eq!(diag.code.to_string(), "E204");
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Warning, 208);
        let diag = Diagnostic::severe(code, "sink without source")
            .with_label(Label::primary(Mark::Instance(2), "input `a`"))
            .with_marks([Mark::Wire(0), Mark::Wire(1)])
            .with_note("net has no driver")
            .with_help("connect a pin or a constant");
        assert_eq!(diag.labels.len(), 3);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
        let marks: Vec<_> = diag.marks().collect();
        assert_eq!(marks[1], Mark::Wire(0));
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Info, 3);
        let diag = Diagnostic::info(code, "passed").in_circuit("top");
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, "passed");
        assert_eq!(back.severity, Severity::Info);
    }
}
