use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

// Ten years.
const MAX_EXPIRY_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Token payload. Mirrors the wire shape `{ user: { id }, iat, exp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: Uuid,
}

/// Verified caller principal. Carries nothing beyond the user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user.id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No Token, Authorization Failed")]
    MissingToken,

    #[error("Token is not valid: {0}")]
    InvalidToken(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Verifies and issues HS256 bearer tokens with a key fixed at construction.
#[derive(Clone)]
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    pub fn new(security: &SecurityConfig) -> Self {
        Self::from_secret(security.jwt_secret.as_bytes(), security.jwt_expiry_secs)
    }

    pub fn from_secret(secret: &[u8], expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry: Duration::seconds(
                i64::try_from(expiry_secs).unwrap_or(i64::MAX).min(MAX_EXPIRY_SECS),
            ),
        }
    }

    /// Recover the caller identity from a raw token. Blank tokens count as absent.
    pub fn authenticate(&self, raw_token: Option<&str>) -> Result<Identity, AuthError> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(Identity::from(data.claims))
    }

    /// Sign a token for `user_id`, valid from now for the configured expiry.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            user: ClaimsUser { id: user_id },
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn expiry_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }
}
