use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::User;
use crate::error::DomainError;
use crate::input::RegistrationInput;
use crate::ports::{
    AuthError, Clock, PasswordService, TokenClaims, TokenRevocationStore, TokenService,
    UserRepository,
};

/// An issued session token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
}

/// Registration, login, logout and token authentication.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    revocations: Arc<dyn TokenRevocationStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        revocations: Arc<dyn TokenRevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            revocations,
            clock,
        }
    }

    fn open_session(&self, user: User) -> Result<Session, DomainError> {
        let token = self.tokens.generate_token(user.id, &user.username)?;
        Ok(Session {
            user,
            token,
            expires_in: self.tokens.expiration_seconds(),
        })
    }

    /// Create an account and log it in.
    pub async fn register(&self, input: RegistrationInput) -> Result<Session, DomainError> {
        let valid = input.validate()?;

        if self.users.find_by_username(&valid.username).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "username '{}' is taken",
                valid.username
            )));
        }

        let password_hash = self.passwords.hash(&valid.password)?;
        let mut user = User::new(valid.username, password_hash);
        user.email = valid.email;
        let now = self.clock.now();
        user.created_at = now;
        user.updated_at = now;

        let user = self.users.save(user).await?;
        tracing::info!(user_id = %user.id, "User registered");
        self.open_session(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        self.open_session(user)
    }

    /// Revoke the token described by `claims` for the rest of its lifetime.
    pub async fn logout(&self, claims: &TokenClaims) -> Result<(), DomainError> {
        let until = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(|| self.clock.now());
        self.revocations.revoke(claims.jti, until).await?;
        tracing::info!(user_id = %claims.user_id, "User logged out");
        Ok(())
    }

    /// Decode a bearer token, rejecting logged-out ones.
    pub async fn authenticate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.tokens.validate_token(token)?;
        if self.revocations.is_revoked(claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }
        Ok(claims)
    }

    pub async fn current_user(&self, claims: &TokenClaims) -> Result<User, DomainError> {
        self.users
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", claims.user_id))
    }
}
