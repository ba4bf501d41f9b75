//! Application error carried from the query layer to HTTP responses.
//!
//! DESIGN
//! ======
//! A `ChatError` is a `kind` (what went wrong) on a `surface` (where), so the
//! code string is e.g. `"forbidden:chat"`. The kind picks the HTTP status and
//! the pair picks the user-facing message. Database errors are logged and
//! answered with a generic body so backend detail never reaches the client.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimit,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::RateLimit => "rate_limit",
        }
    }

    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Chat,
    Auth,
    Api,
    Stream,
    Database,
    History,
    Vote,
    Document,
    Suggestions,
}

impl Surface {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Stream => "stream",
            Self::Database => "database",
            Self::History => "history",
            Self::Vote => "vote",
            Self::Document => "document",
            Self::Suggestions => "suggestions",
        }
    }
}

pub(crate) const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ErrorKind,
    pub surface: Surface,
    pub cause: Option<String>,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ChatError {}

impl ChatError {
    #[must_use]
    pub fn new(kind: ErrorKind, surface: Surface) -> Self {
        Self { kind, surface, cause: None }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn code(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.surface.as_str())
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// User-facing message for this error.
    #[must_use]
    pub fn message(&self) -> &'static str {
        use ErrorKind as K;
        use Surface as S;

        if self.surface == S::Database {
            return "An error occurred while executing a database query.";
        }
        match (self.kind, self.surface) {
            (K::BadRequest, S::Api) => "The request couldn't be processed. Please check your input and try again.",
            (K::Unauthorized, S::Auth) => "You need to sign in before continuing.",
            (K::Forbidden, S::Auth) => "Your account does not have access to this feature.",
            (K::RateLimit, S::Chat) => {
                "You have exceeded your maximum number of messages for the day. Please try again later."
            }
            (K::NotFound, S::Chat) => "The requested chat was not found. Please check the chat ID and try again.",
            (K::Forbidden, S::Chat) => "This chat belongs to another user. Please check the chat ID and try again.",
            (K::Unauthorized, S::Chat) => "You need to sign in to view this chat. Please sign in and try again.",
            (K::NotFound, S::Document) => {
                "The requested document was not found. Please check the document ID and try again."
            }
            (K::Forbidden, S::Document) => {
                "This document belongs to another user. Please check the document ID and try again."
            }
            (K::Unauthorized, S::Document) => {
                "You need to sign in to view this document. Please sign in and try again."
            }
            (K::BadRequest, S::Document) => {
                "The request to create or update the document was invalid. Please check your input and try again."
            }
            _ => GENERIC_MESSAGE,
        }
    }

    /// Database failures are only logged; everything else is shown to the user.
    #[must_use]
    pub fn is_log_only(&self) -> bool {
        self.surface == Surface::Database
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_log_only() {
            tracing::error!(code = %self.code(), cause = ?self.cause, "{}", self.message());
            let body = serde_json::json!({ "code": "", "message": GENERIC_MESSAGE });
            return (status, Json(body)).into_response();
        }

        let body = serde_json::json!({
            "code": self.code(),
            "message": self.message(),
            "cause": self.cause,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod tests;
