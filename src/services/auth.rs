//! Domain service for authentication.
//!
//! Handles account creation, credential verification, and the bearer-token
//! lifecycle. Tokens are stateless HS256 JWTs binding a user id with an
//! expiry; nothing about a session is kept between requests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::Store;
use crate::models::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    AlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Bearer token claims: subject is the user id, expiry is seconds since epoch.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Outcome of a successful register/login: the account plus a fresh token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and issues its first token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyExists`] when the username or email is taken.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError>;

    /// Verifies credentials and issues a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the pair does not match.
    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Resolves a bearer token to the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for malformed, expired, or orphaned
    /// tokens.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;
}

pub struct JwtAuthService {
    store: Store,
    security: SecurityConfig,
    secret: String,
    token_ttl_days: i64,
}

impl JwtAuthService {
    #[must_use]
    pub fn new(store: Store, auth: &AuthConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            secret: auth.token_secret.clone(),
            token_ttl_days: auth.token_ttl_days,
        }
    }

    fn issue_token(&self, user_id: i32) -> Result<String, AuthError> {
        let expires_at = Utc::now() + Duration::days(self.token_ttl_days);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: usize::try_from(expires_at.timestamp()).unwrap_or(usize::MAX),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if self
            .store
            .find_user_by_username_or_email(username, email)
            .await?
            .is_some()
        {
            return Err(AuthError::AlreadyExists);
        }

        let user = self
            .store
            .create_user(username, email, password, &self.security)
            .await?;
        let token = self.issue_token(user.id)?;

        Ok(AuthenticatedUser { user, token })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let user = self
            .store
            .verify_credentials(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.issue_token(user.id)?;

        Ok(AuthenticatedUser { user, token })
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        let user_id: i32 = data.claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        // A token for a since-deleted account is as good as no token.
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

/// Generate a random token secret (64 character hex string)
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
