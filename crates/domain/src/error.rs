//! Unified error types for the domain layer
//!
//! Provides a common error type for snapshot parsing and patch application,
//! so adapters do not have to fall back to String or anyhow.

use thiserror::Error;

use crate::value_objects::VersionParseError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A document snapshot could not be read
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A patch could not be applied to a snapshot
    #[error("Patch conflict at '{path}': {reason}")]
    PatchConflict { path: String, reason: String },

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates an invalid snapshot error.
    ///
    /// Use this when a host snapshot is not an object or lacks its `_id`.
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    /// Create a patch conflict error
    pub fn patch_conflict(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PatchConflict {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<VersionParseError> for DomainError {
    fn from(err: VersionParseError) -> Self {
        DomainError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity() {
        let err = DomainError::not_found("Item", "abc123");
        assert_eq!(err.to_string(), "Entity not found: Item with id abc123");
    }

    #[test]
    fn test_patch_conflict_message() {
        let err = DomainError::patch_conflict("data.items.3.img", "index out of bounds");
        assert!(err.to_string().contains("data.items.3.img"));
    }

    #[test]
    fn test_version_error_converts_to_parse() {
        let err: DomainError = VersionParseError::Empty.into();
        assert!(matches!(err, DomainError::Parse(_)));
    }
}
