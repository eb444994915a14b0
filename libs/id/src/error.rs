//! Error types for name and ID parsing.

use thiserror::Error;

/// Errors that can occur when parsing or validating names and IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// A name starts or ends with whitespace.
    #[error("{kind} '{value}' has leading or trailing whitespace")]
    SurroundingWhitespace { kind: &'static str, value: String },

    /// A name contains a character that is never valid in a name.
    #[error("{kind} '{value}' contains invalid character {ch:?}")]
    InvalidCharacter {
        kind: &'static str,
        value: String,
        ch: char,
    },

    /// The ID has an invalid prefix.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ID is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }

    /// Returns true if this error indicates a prefix mismatch.
    pub fn is_prefix_error(&self) -> bool {
        matches!(self, IdError::InvalidPrefix { .. } | IdError::MissingSeparator)
    }
}
