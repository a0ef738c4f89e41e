//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Filesystem operation failed - includes operation name for tracing.
    #[error("IO error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The host refused the write (schema validation, permissions, ...).
    #[error("Update rejected: {0}")]
    Rejected(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Create a Rejected error.
    pub fn rejected(message: impl ToString) -> Self {
        Self::Rejected(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<coc7_domain::DomainError> for RepoError {
    fn from(err: coc7_domain::DomainError) -> Self {
        match err {
            coc7_domain::DomainError::NotFound { entity_type, id } => {
                RepoError::NotFound { entity_type, id }
            }
            other => RepoError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coc7_domain::DomainError;

    #[test]
    fn test_not_found_message() {
        let err = RepoError::not_found("Actor", "abc123");
        assert_eq!(err.to_string(), "Actor not found: abc123");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_domain_patch_conflict_becomes_rejected() {
        let err: RepoError = DomainError::patch_conflict("results.4.img", "out of bounds").into();
        assert!(matches!(err, RepoError::Rejected(_)));
    }

    #[test]
    fn test_domain_not_found_is_preserved() {
        let err: RepoError = DomainError::not_found("EmbeddedItem", "i9").into();
        assert!(err.is_not_found());
    }
}
