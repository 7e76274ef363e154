//! Hierarchy paths.

use serde::Serialize;
use strand_common::{Ident, Interner};

/// The chain of instance labels from the top sheet down to a sheet instance.
///
/// The top sheet itself has the empty path.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
pub struct HierarchyPath(Vec<Ident>);

impl HierarchyPath {
    /// The path of the top sheet.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from label strings, interning them.
    pub fn from_labels<'s>(interner: &Interner, labels: impl IntoIterator<Item = &'s str>) -> Self {
        Self(labels.into_iter().map(|l| interner.get_or_intern(l)).collect())
    }

    /// Returns this path extended by one instance label.
    pub fn child(&self, label: Ident) -> Self {
        let mut segments = self.0.clone();
        segments.push(label);
        Self(segments)
    }

    /// Returns the path of the enclosing sheet, or `None` at the top.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// The innermost instance label.
    pub fn last(&self) -> Option<Ident> {
        self.0.last().copied()
    }

    /// Number of instance labels.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the top sheet.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The instance labels, outermost first.
    pub fn segments(&self) -> &[Ident] {
        &self.0
    }

    /// Renders the path as `a/b/c`, or `/` for the top sheet.
    pub fn display(&self, interner: &Interner) -> String {
        if self.0.is_empty() {
            return "/".to_string();
        }
        let names: Vec<&str> = self.0.iter().map(|i| interner.resolve(*i)).collect();
        names.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_and_parent() {
        let interner = Interner::new();
        let u1 = interner.get_or_intern("u1");
        let root = HierarchyPath::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());
        let p = root.child(u1);
        assert_eq!(p.depth(), 1);
        assert_eq!(p.last(), Some(u1));
        assert_eq!(p.parent(), Some(root));
    }

    #[test]
    fn display_joins_labels() {
        let interner = Interner::new();
        let p = HierarchyPath::from_labels(&interner, ["cpu", "alu"]);
        assert_eq!(p.display(&interner), "cpu/alu");
        assert_eq!(HierarchyPath::root().display(&interner), "/");
    }
}
