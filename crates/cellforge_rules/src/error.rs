//! Error types for rule compilation and table/tree decoding.
//!
//! Every failure is a value carrying a human-readable reason; nothing in the
//! compiler aborts the process. A failed compilation leaves the caller's rule
//! in its non-executable state.

use thiserror::Error;

/// Main error type for rule compilation and interpretation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The text matched no known rule grammar.
    #[error("Unsupported rule: {0}")]
    Unsupported(String),

    /// Malformed number or numeric range in the rule text.
    #[error("Invalid number in rule: {0}")]
    InvalidNumber(String),

    /// A birth/survival count exceeds the neighbourhood maximum.
    #[error("Count {count} exceeds neighbourhood maximum {max}")]
    CountOutOfRange { count: u32, max: u32 },

    /// Range outside the supported `1..=500` window.
    #[error("Range {0} out of range (1..=500)")]
    RangeOutOfRange(u32),

    /// State count outside `2..=256`.
    #[error("State count {0} out of range (2..=256)")]
    StatesOutOfRange(u32),

    /// Duplicate or contradictory specification for a single count.
    #[error("Duplicate specification: {0}")]
    Duplicate(String),

    /// Unknown token inside an otherwise recognized grammar.
    #[error("Unknown token in rule: {0}")]
    UnknownToken(String),

    /// The two halves of an alternating rule disagree.
    #[error("Incompatible alternate rules: {0}")]
    AlternateMismatch(String),

    /// Malformed bounded-grid descriptor.
    #[error("Invalid grid descriptor: {0}")]
    Grid(String),

    /// Bounded grid too small for the rule's range.
    #[error("Grid dimension {dimension} too small for range {range}")]
    GridTooSmall { dimension: u32, range: u32 },

    /// Failure while decoding a `@TABLE` body.
    #[error("Table error: {0}")]
    Table(String),

    /// Failure while decoding a `@TREE` body.
    #[error("Tree error: {0}")]
    Tree(String),
}

/// Result type alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// Creates an unsupported-rule error.
    #[must_use]
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates a table-decoding error.
    #[must_use]
    pub fn table<S: Into<String>>(msg: S) -> Self {
        Self::Table(msg.into())
    }

    /// Creates a tree-decoding error.
    #[must_use]
    pub fn tree<S: Into<String>>(msg: S) -> Self {
        Self::Tree(msg.into())
    }
}
