//! Auth routes: guest sign-in, session lookup, sign-out.

use std::convert::Infallible;

use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::error;

use crate::config::AuthConfig;
use crate::errors::{ChatError, ErrorKind, Surface};
use crate::services::auth::{self as auth_svc, Credentials, Provider};
use crate::services::session::{self, SessionClaims, SessionUser};
use crate::state::AppState;

const COOKIE_NAME: &str = "authjs.session-token";
const SECURE_COOKIE_NAME: &str = "__Secure-authjs.session-token";
const DEFAULT_REDIRECT: &str = "/";

pub(crate) fn cookie_name(config: &AuthConfig) -> &'static str {
    if config.cookie_secure { SECURE_COOKIE_NAME } else { COOKIE_NAME }
}

fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    let max_age = i64::try_from(config.session_max_age.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((cookie_name(config), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(max_age))
        .build()
}

fn cleared_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((cookie_name(config), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Only same-site absolute paths are followed; anything else goes home.
/// Browsers drop tab and newline from URLs, so control characters could
/// turn `/\t/host` into `//host`; they are never allowed.
pub(crate) fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_control()) =>
        {
            path
        }
        _ => DEFAULT_REDIRECT,
    }
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Verified session claims from the cookie, if any. Never rejects; handlers
/// call `require` with the surface their errors should report.
pub struct CurrentSession(pub Option<SessionClaims>);

impl CurrentSession {
    /// The signed-in user, or `unauthorized:<surface>`.
    pub fn require(self, surface: Surface) -> Result<SessionUser, ChatError> {
        self.0
            .map(|claims| claims.user())
            .ok_or_else(|| ChatError::new(ErrorKind::Unauthorized, surface))
    }
}

impl<S> axum::extract::FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let claims = jar
            .get(cookie_name(&app_state.auth))
            .map(Cookie::value)
            .filter(|token| !token.is_empty())
            .and_then(|token| session::decode(token, &app_state.auth.secret));
        Ok(Self(claims))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestQuery {
    redirect_url: Option<String>,
}

/// `GET /api/auth/guest`: sign in as a fresh guest, set the cookie, redirect.
pub async fn guest(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<GuestQuery>,
) -> Result<Response, ChatError> {
    let target = safe_redirect(params.redirect_url.as_deref());
    let user = auth_svc::sign_in(Provider::Guest.id(), &state.queries, &Credentials::default())
        .await
        .ok_or_else(|| ChatError::new(ErrorKind::Unauthorized, Surface::Auth).with_cause("Guest sign-in failed"))?;

    let token = session::issue(&user, &state.auth).map_err(|e| {
        error!(error = %e, "session signing failed");
        ChatError::new(ErrorKind::BadRequest, Surface::Auth).with_cause("Failed to create session")
    })?;

    let jar = jar.add(session_cookie(&state.auth, token));
    Ok((jar, Redirect::temporary(target)).into_response())
}

/// `POST /api/auth/callback/credentials`: regular login, currently always refused.
pub async fn credentials_callback(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<StatusCode, ChatError> {
    match auth_svc::sign_in(Provider::Credentials.id(), &state.queries, &credentials).await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ChatError::new(ErrorKind::Unauthorized, Surface::Auth).with_cause("CredentialsSignin")),
    }
}

/// `GET /api/auth/session`: the current session, or `null`.
pub async fn session(current: CurrentSession) -> Json<Option<session::Session>> {
    let session = current.0.as_ref().and_then(|claims| match session::session_from_claims(claims) {
        Ok(session) => Some(session),
        Err(e) => {
            error!(error = %e, "session projection failed");
            None
        }
    });
    Json(session)
}

/// `GET /api/auth/providers`: configured sign-in providers keyed by id.
pub async fn providers() -> Json<serde_json::Value> {
    let map = Provider::ALL
        .into_iter()
        .map(|p| {
            (
                p.id().to_owned(),
                serde_json::json!({ "id": p.id(), "name": p.name(), "type": "credentials" }),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    Json(serde_json::Value::Object(map))
}

/// `POST /api/auth/signout`: clear the session cookie.
pub async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    let jar = CookieJar::new().add(cleared_cookie(&state.auth));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
