//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Errors that invalidate the analysis, prefixed with `E`.
    Error,
    /// Warnings that leave the netlist usable, prefixed with `W`.
    Warning,
    /// Progress and summary messages, prefixed with `I`.
    Info,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Info => 'I',
        }
    }

    /// Returns the category for a prefix character, if any.
    pub fn from_prefix(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(Category::Error),
            'W' => Some(Category::Warning),
            'I' => Some(Category::Info),
            _ => None,
        }
    }
}

/// A diagnostic code such as `E204` (short circuit) or `W208` (unsourced sink).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Error returned when a string is not a diagnostic code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCodeError(pub String);

impl fmt::Display for ParseCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a diagnostic code", self.0)
    }
}

impl std::error::Error for ParseCodeError {}

impl FromStr for DiagnosticCode {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| ParseCodeError(s.to_string()))?;
        let digits = chars.as_str();
        if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseCodeError(s.to_string()));
        }
        let number = digits
            .parse::<u16>()
            .map_err(|_| ParseCodeError(s.to_string()))?;
        Ok(Self { category, number })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::new(Category::Error, 204).to_string(), "E204");
        assert_eq!(DiagnosticCode::new(Category::Warning, 7).to_string(), "W007");
        assert_eq!(DiagnosticCode::new(Category::Info, 2).to_string(), "I002");
    }

    #[test]
    fn parse_roundtrip() {
        let code: DiagnosticCode = "w208".parse().unwrap();
        assert_eq!(code, DiagnosticCode::new(Category::Warning, 208));
        assert_eq!(code.to_string(), "W208");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("X100".parse::<DiagnosticCode>().is_err());
        assert!("E10".parse::<DiagnosticCode>().is_err());
        assert!("E1000".parse::<DiagnosticCode>().is_err());
        assert!("".parse::<DiagnosticCode>().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 101);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
