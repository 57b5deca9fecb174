//! Error types for the resolver and its value objects.
//!
//! A description that cannot be found is not an error: it resolves to `None`.
//! The types here cover invalid input and failures of the backing lookup.

use thiserror::Error;

/// Rejected input when constructing a domain value object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Error codes must contain at least one non-whitespace character.
    #[error("error code must not be blank")]
    BlankErrorCode,

    /// Release version string is not `major.minor.patch`.
    #[error("invalid release version '{value}': {reason}")]
    InvalidReleaseVersion { value: String, reason: String },

    /// Platform edition string names no known edition.
    #[error("unknown platform edition '{value}' (expected OS or ENT)")]
    UnknownPlatformEdition { value: String },

    /// Description location is not an absolute URI.
    #[error("invalid description location '{value}': {reason}")]
    InvalidLocation { value: String, reason: String },
}

/// Failure signalled by the backing description lookup.
///
/// The resolver hands these back to its caller unchanged. Cloneable so a
/// single upstream failure can be shared by tests and fan-out callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The backing store could not be reached.
    #[error("description lookup unavailable: {reason}")]
    Unavailable { reason: String },

    /// The backing store answered with data that could not be interpreted.
    #[error("malformed description data: {reason}")]
    Malformed { reason: String },
}

impl LookupError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}
