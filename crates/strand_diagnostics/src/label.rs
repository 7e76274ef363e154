//! Labels that mark schematic elements within a diagnostic.

use serde::{Deserialize, Serialize};

/// The schematic element a label points at, by raw id within its circuit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Mark {
    /// A component instance.
    Instance(u32),
    /// The label text of a component instance.
    InstanceLabel(u32),
    /// A wire segment.
    Wire(u32),
}

/// The visual style of a diagnostic label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The element the diagnostic is about.
    Primary,
    /// An element providing context (e.g. the other half of a duplicate).
    Secondary,
}

/// A marked schematic element with an explanatory message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The marked element.
    pub mark: Mark,
    /// The message displayed next to the element; may be empty.
    pub message: String,
    /// Whether this is a primary or secondary label.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(mark: Mark, message: impl Into<String>) -> Self {
        Self {
            mark,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(mark: Mark, message: impl Into<String>) -> Self {
        Self {
            mark,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_label() {
        let label = Label::primary(Mark::Instance(3), "drives a tri-state bus");
        assert_eq!(label.style, LabelStyle::Primary);
        assert_eq!(label.mark, Mark::Instance(3));
    }

    #[test]
    fn secondary_label() {
        let label = Label::secondary(Mark::Wire(9), "");
        assert_eq!(label.style, LabelStyle::Secondary);
        assert!(label.message.is_empty());
    }
}
