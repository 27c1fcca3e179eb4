//! Error module for the Reef library.
//!
//! Errors are layered the same way the containers are: a small
//! [`ContainerError`] enum shared by every in-memory structure, and the
//! [`ReefError`] umbrella that the configuration, logging, and boundary
//! modules fold into. The core containers never abort the process; every
//! fallible operation reports through `Result`, `Option`, or a plain `bool`
//! depending on how much the caller can do with the reason.

use thiserror::Error;

/// Result type alias used throughout the Reef library.
pub type ReefResult<T> = Result<T, ReefError>;

/// Errors surfaced by the in-memory containers.
///
/// These are deliberately reason-only: a container reports *why* an
/// operation could not proceed and leaves recovery to the caller. `Full`
/// in particular is informational; the insertion that produced it did not
/// mutate the container.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// Key or entry absent. Distinct from an empty container.
    #[error("entry not found")]
    NotFound,

    /// Read from an empty stack, heap, or queue.
    #[error("container is empty")]
    Empty,

    /// Heap at capacity; the insertion was a no-op.
    #[error("container is at capacity")]
    Full,

    /// A list operation received a node owned by a different list or one
    /// that was already unlinked.
    #[error("node does not belong to this list")]
    ForeignNode,

    /// Rank or index outside `[0, len)`.
    #[error("index out of range")]
    OutOfRange,
}

/// Core error enum for the Reef library.
#[derive(Error, Debug)]
pub enum ReefError {
    /// Errors reported by the in-memory containers.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// Errors occurring during configuration loading or validation.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Errors from signing or verifying identity tokens.
    #[error("token error: {0}")]
    Token(#[from] crate::utils::token::TokenError),

    /// IO errors from boundary collaborators.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases where specific error types are
    /// not defined.
    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_error_display() {
        assert_eq!(ContainerError::Empty.to_string(), "container is empty");
        assert_eq!(
            ContainerError::ForeignNode.to_string(),
            "node does not belong to this list"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: ReefError = ContainerError::NotFound.into();
        assert!(matches!(err, ReefError::Container(ContainerError::NotFound)));
        assert_eq!(err.to_string(), "container error: entry not found");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReefError = io.into();
        assert!(matches!(err, ReefError::Io(_)));
    }
}
