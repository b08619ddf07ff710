//! Error types for the rules DSL resolver and requirements analyzer.

use thiserror::Error;

/// Result type alias for `policy-core`.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors produced while resolving variables, evaluating conditions,
/// expanding policy templates, or loading a rules document.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A variable path could not be drilled into a value: a type mismatch
    /// between path segments, a malformed JSON blob, or a segment whose
    /// predecessor did not contribute a value to any sibling.
    #[error("could not resolve variable part {segment}: {reason}")]
    Resolution {
        /// The dotted segment name that failed to resolve.
        segment: String,
        /// Human-readable cause.
        reason: String,
    },

    /// A condition referenced an unknown operator, had an operand shape
    /// mismatch, or a binary predicate side resolved to more than one value.
    #[error("condition error: {0}")]
    Condition(String),

    /// A policy rule's `id` is a variable that failed to resolve.
    #[error("could not resolve policy id: {0}")]
    Expansion(String),

    /// The Fetcher collaborator failed, or a base-URI rewrite failed.
    #[error("external collaborator error: {0}")]
    External(String),

    /// The rules document failed JSON Schema validation or carries unknown
    /// top-level fields.
    #[error("rules document error: {0}")]
    Document(String),
}

impl PolicyError {
    /// Build a [`PolicyError::Resolution`] for the given segment.
    pub fn resolution(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            segment: segment.into(),
            reason: reason.into(),
        }
    }
}
