//! Authentication ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Claims stored in session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub username: String,
    /// Unique token id, used to revoke the token on logout.
    pub jti: Uuid,
    pub exp: i64,
}

/// Token service trait for JWT operations.
pub trait TokenService: Send + Sync {
    /// Issue a session token for a user.
    fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Server-side record of logged-out tokens.
#[async_trait]
pub trait TokenRevocationStore: Send + Sync {
    /// Revoke a token id until the given instant (the token's own expiry).
    async fn revoke(&self, jti: Uuid, until: DateTime<Utc>) -> Result<(), AuthError>;

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Session store error: {0}")]
    Store(String),
}
