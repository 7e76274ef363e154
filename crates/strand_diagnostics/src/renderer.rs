//! Diagnostic rendering for human-readable output.

use crate::diagnostic::Diagnostic;
use crate::label::{LabelStyle, Mark};
use crate::severity::Severity;

/// Resolves marks to human-readable descriptions (e.g. "AND gate `g1` at (40, 60)").
///
/// Implemented by the schematic model so that rendering does not depend on it.
pub trait MarkResolver {
    /// Describes `mark` inside the named circuit, or `None` if it is unknown.
    fn describe(&self, circuit: &str, mark: Mark) -> Option<String>;
}

/// A resolver that knows nothing; marks render as raw ids.
pub struct NoMarks;

impl MarkResolver for NoMarks {
    fn describe(&self, _circuit: &str, _mark: Mark) -> Option<String> {
        None
    }
}

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, marks: &dyn MarkResolver) -> String;
}

/// Renders diagnostics in a compiler-style terminal format.
///
/// ```text
/// fatal error[E204]: short circuit on a net with 2 drivers
///   --> circuit `main`
///    | wire #3
///    | pin `a` at (20, 40): driver
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match severity {
            Severity::Info => "36",
            Severity::Warning => "33",
            Severity::SevereWarning => "35",
            Severity::Error | Severity::Fatal => "31",
        };
        format!("\x1b[1;{code}m{text}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, marks: &dyn MarkResolver) -> String {
        let mut out = String::new();

        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(diag.severity, &header),
            diag.message
        ));

        if let Some(circuit) = &diag.circuit {
            out.push_str(&format!("  --> circuit `{circuit}`\n"));
            for label in &diag.labels {
                let what = marks
                    .describe(circuit, label.mark)
                    .unwrap_or_else(|| raw_mark(label.mark));
                let bullet = match label.style {
                    LabelStyle::Primary => '|',
                    LabelStyle::Secondary => ':',
                };
                if label.message.is_empty() {
                    out.push_str(&format!("   {bullet} {what}\n"));
                } else {
                    out.push_str(&format!("   {bullet} {what}: {}\n", label.message));
                }
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

fn raw_mark(mark: Mark) -> String {
    match mark {
        Mark::Instance(id) => format!("component #{id}"),
        Mark::InstanceLabel(id) => format!("label of component #{id}"),
        Mark::Wire(id) => format!("wire #{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::label::Label;

    struct Names;

    impl MarkResolver for Names {
        fn describe(&self, circuit: &str, mark: Mark) -> Option<String> {
            match mark {
                Mark::Instance(0) => Some(format!("pin `a` in {circuit}")),
                _ => None,
            }
        }
    }

    #[test]
    fn render_with_marks() {
        let diag = Diagnostic::fatal(DiagnosticCode::new(Category::Error, 204), "short circuit")
            .in_circuit("main")
            .with_label(Label::primary(Mark::Instance(0), "driver"))
            .with_label(Label::secondary(Mark::Wire(5), ""));
        let out = TerminalRenderer::new(false).render(&diag, &Names);
        assert!(out.contains("fatal error[E204]: short circuit"));
        assert!(out.contains("--> circuit `main`"));
        assert!(out.contains("| pin `a` in main: driver"));
        assert!(out.contains(": wire #5"));
    }

    #[test]
    fn render_notes_without_circuit() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 201), "empty net")
            .with_note("the net has no connected ends")
            .with_help("delete the stray wire");
        let out = TerminalRenderer::new(false).render(&diag, &NoMarks);
        assert!(out.contains("warning[W201]: empty net"));
        assert!(!out.contains("-->"));
        assert!(out.contains("= note: the net has no connected ends"));
        assert!(out.contains("= help: delete the stray wire"));
    }

    #[test]
    fn color_wraps_header() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 105), "duplicate label");
        let out = TerminalRenderer::new(true).render(&diag, &NoMarks);
        assert!(out.starts_with("\x1b[1;31merror[E105]\x1b[0m"));
    }
}
