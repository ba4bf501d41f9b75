//! Sign-in providers.
//!
//! Two credential providers are configured: `credentials` for regular
//! email/password accounts, currently disabled because there is no user
//! table, and `guest`, which mints a throwaway identity on every sign-in.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info};

use crate::config::AuthConfig;
use crate::db::queries::Queries;

const GUEST_ID_PREFIX: &str = "guest_user_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Guest,
    Regular,
}

impl UserType {
    /// How many stored messages a user of this type may accumulate.
    #[must_use]
    pub fn message_limit(self, config: &AuthConfig) -> usize {
        match self {
            Self::Guest => config.guest_message_limit,
            Self::Regular => config.regular_message_limit,
        }
    }
}

/// User returned by a provider's `authorize` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizedUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// Submitted email/password pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Credentials,
    Guest,
}

impl Provider {
    pub const ALL: [Self; 2] = [Self::Credentials, Self::Guest];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Guest => "guest",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Credentials => "Credentials",
            Self::Guest => "Guest",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

/// Lowercase and sanity-check an email address.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Build a fresh guest identity from the current wall clock.
#[must_use]
pub fn guest_user(now: OffsetDateTime) -> AuthorizedUser {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    AuthorizedUser { id: format!("{GUEST_ID_PREFIX}{millis}"), email: None, user_type: UserType::Guest }
}

async fn authorize_guest(queries: &Queries) -> Option<AuthorizedUser> {
    // Guests are not persisted; this only surfaces a broken store.
    queries.create_guest_user().await?;
    let user = guest_user(OffsetDateTime::now_utc());
    info!(user_id = %user.id, "guest user created");
    Some(user)
}

fn authorize_credentials(credentials: &Credentials) -> Option<AuthorizedUser> {
    let email = normalize_email(&credentials.email);
    error!(email = ?email, "regular login is disabled (no user store)");
    None
}

/// Run the named provider's authorize step. Unknown providers never sign in.
pub async fn sign_in(provider_id: &str, queries: &Queries, credentials: &Credentials) -> Option<AuthorizedUser> {
    match Provider::from_id(provider_id)? {
        Provider::Credentials => authorize_credentials(credentials),
        Provider::Guest => authorize_guest(queries).await,
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
