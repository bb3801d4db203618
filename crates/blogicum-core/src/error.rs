//! Domain-level error types.

use thiserror::Error;

use crate::input::ValidationError;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Permission denied")]
    Forbidden,

    #[error("Repository failure: {0}")]
    Repository(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<crate::ports::AuthError> for DomainError {
    fn from(err: crate::ports::AuthError) -> Self {
        use crate::ports::AuthError;
        match err {
            AuthError::InvalidCredentials => DomainError::InvalidCredentials,
            AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::InvalidToken(_)
            | AuthError::MissingAuth => DomainError::Unauthenticated,
            AuthError::HashingError(msg) | AuthError::Store(msg) => DomainError::Internal(msg),
        }
    }
}
