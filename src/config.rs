//! Runtime configuration read from the environment.
//!
//! `.env` is loaded by `main` before anything here runs, so every value can
//! come from either the process environment or that file.

use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
/// Session lifetime when `SESSION_MAX_AGE_SECS` is unset (30 days).
const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_GUEST_MESSAGE_LIMIT: usize = 20;
const DEFAULT_REGULAR_MESSAGE_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUTH_SECRET (or NEXTAUTH_SECRET) must be set")]
    MissingSecret,
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Session and cookie settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for session tokens.
    pub secret: String,
    pub session_max_age: Duration,
    /// Set the `Secure` flag and the `__Secure-` cookie prefix.
    pub cookie_secure: bool,
    /// Message allowance per user type.
    pub guest_message_limit: usize,
    pub regular_message_limit: usize,
}

impl AuthConfig {
    /// Load from `AUTH_SECRET`/`NEXTAUTH_SECRET`, `SESSION_MAX_AGE_SECS`,
    /// `COOKIE_SECURE`, `GUEST_MESSAGE_LIMIT`, `REGULAR_MESSAGE_LIMIT`.
    ///
    /// # Errors
    ///
    /// Fails when no secret is configured or a numeric value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("AUTH_SECRET")
            .or_else(|_| std::env::var("NEXTAUTH_SECRET"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        Ok(Self {
            secret,
            session_max_age: Duration::from_secs(env_parse("SESSION_MAX_AGE_SECS", DEFAULT_SESSION_MAX_AGE_SECS)?),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
            guest_message_limit: env_parse("GUEST_MESSAGE_LIMIT", DEFAULT_GUEST_MESSAGE_LIMIT)?,
            regular_message_limit: env_parse("REGULAR_MESSAGE_LIMIT", DEFAULT_REGULAR_MESSAGE_LIMIT)?,
        })
    }

    /// Config with the given secret and defaults for everything else.
    #[must_use]
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
            cookie_secure: false,
            guest_message_limit: DEFAULT_GUEST_MESSAGE_LIMIT,
            regular_message_limit: DEFAULT_REGULAR_MESSAGE_LIMIT,
        }
    }
}

/// Listen port from `PORT`.
///
/// # Errors
///
/// Fails when `PORT` is set but not a valid port number.
pub fn port_from_env() -> Result<u16, ConfigError> {
    env_parse("PORT", DEFAULT_PORT)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
