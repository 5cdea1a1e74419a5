//! Error types for the `reportlink-models` crate.
//!
//! All fallible constructors in this crate return variants of [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An identifier was empty or made only of whitespace.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Which identifier was rejected (e.g. `"reportId"`).
        kind: String,
    },

    /// A required field was missing during request construction.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// An access level string did not name a known level.
    #[error("invalid access level \"{value}\": expected View, Edit or Create")]
    InvalidAccessLevel {
        /// The value that failed validation.
        value: String,
    },
}
