//! JWT session tokens.
//!
//! ARCHITECTURE
//! ============
//! Sessions are stateless: the signed token in the session cookie is the
//! whole session. On sign-in the authorized user's `id` and `type` are copied
//! into the claims; on every request the claims are copied back out into the
//! session user. Tokens are HS256 with the configured secret.
//!
//! TRADE-OFFS
//! ==========
//! Nothing is stored server-side, so sign-out only clears the cookie. A
//! leaked token stays valid until `exp`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::auth::{AuthorizedUser, UserType};
use crate::config::AuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("token signing failed: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
    #[error("expiry out of range: {0}")]
    Expiry(String),
}

/// Claims carried in the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Session callback: copy `id` and `type` (and email) onto the user.
    #[must_use]
    pub fn user(&self) -> SessionUser {
        SessionUser { id: self.id.clone(), user_type: self.user_type, email: self.email.clone() }
    }
}

/// User as seen by handlers and the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: SessionUser,
    /// RFC 3339 expiry.
    pub expires: String,
}

/// Claims for a freshly signed-in user.
#[must_use]
pub fn claims_for(user: &AuthorizedUser, now: OffsetDateTime, config: &AuthConfig) -> SessionClaims {
    let iat = now.unix_timestamp();
    let max_age = i64::try_from(config.session_max_age.as_secs()).unwrap_or(i64::MAX);
    SessionClaims {
        id: user.id.clone(),
        user_type: user.user_type,
        email: user.email.clone(),
        iat,
        exp: iat.saturating_add(max_age),
    }
}

/// Sign claims into a compact token.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode(claims: &SessionClaims, secret: &str) -> Result<String, SessionError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)?)
}

/// Verify a token. Bad signatures, malformed tokens and expired tokens all
/// yield `None`.
#[must_use]
pub fn decode(token: &str, secret: &str) -> Option<SessionClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Sign in `user` now, returning the cookie value.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn issue(user: &AuthorizedUser, config: &AuthConfig) -> Result<String, SessionError> {
    encode(&claims_for(user, OffsetDateTime::now_utc(), config), &config.secret)
}

/// Project verified claims onto the session shape returned to clients.
///
/// # Errors
///
/// Returns an error if `exp` cannot be represented as a timestamp.
pub fn session_from_claims(claims: &SessionClaims) -> Result<Session, SessionError> {
    let expires = OffsetDateTime::from_unix_timestamp(claims.exp)
        .map_err(|e| SessionError::Expiry(e.to_string()))?
        .format(&Rfc3339)
        .map_err(|e| SessionError::Expiry(e.to_string()))?;

    Ok(Session { user: claims.user(), expires })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
