use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Token flavor carried inside the claims. A refresh token is only good for
/// minting new access tokens; an access token is only good for protected
/// requests. Neither is accepted in the other's place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Expected a {expected} token")]
    WrongTokenType { expected: TokenType },
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Signs and verifies the self-contained bearer tokens. Tokens are never
/// persisted; expiry is the only invalidation mechanism.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenKeys {
    pub fn new(security: &SecurityConfig) -> Result<Self, TokenError> {
        if security.jwt_secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            access_expiry: Duration::minutes(security.access_token_expiry_minutes),
            refresh_expiry: Duration::days(security.refresh_token_expiry_days),
        })
    }

    pub fn access_expiry_secs(&self) -> i64 {
        self.access_expiry.num_seconds()
    }

    /// Mint a signed token bound to the given user id
    pub fn generate(
        &self,
        user_id: Uuid,
        username: &str,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expiry = match token_type {
            TokenType::Access => self.access_expiry,
            TokenType::Refresh => self.refresh_expiry,
        };

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            exp: (now + expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::TokenGeneration(e.to_string()))
    }

    /// Validate signature and expiry, then enforce the expected token type
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| TokenError::InvalidToken)?;

        if token_data.claims.token_type != expected {
            return Err(TokenError::WrongTokenType { expected });
        }

        Ok(token_data.claims)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Password hashing error: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Verify a password against a stored hash. A malformed hash counts as a
/// mismatch rather than an error the caller has to distinguish.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
