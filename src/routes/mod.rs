//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the auth endpoints and the chat data API under a single
//! Axum router. Every route is reachable; handlers that need a user pull the
//! session through the `CurrentSession` extractor and report failures with
//! their own error surface.

pub mod auth;
pub mod chat;
pub mod document;
pub mod vote;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/guest", get(auth::guest))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/providers", get(auth::providers))
        .route("/api/auth/callback/credentials", post(auth::credentials_callback))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/history", get(chat::history))
        .route("/api/chat", post(chat::post_chat))
        .route("/api/chat/{id}", get(chat::get_chat).delete(chat::delete_chat))
        .route("/api/chat/{id}/visibility", patch(chat::update_visibility))
        .route("/api/chat/{id}/messages", delete(chat::delete_trailing_messages))
        .route("/api/chat/{id}/streams", get(chat::list_streams).post(chat::create_stream))
        .route("/api/message/{id}/trailing", delete(chat::delete_from_message))
        .route("/api/vote", get(vote::get_votes).patch(vote::vote))
        .route(
            "/api/document",
            get(document::get_document)
                .post(document::save_document)
                .delete(document::delete_document_versions),
        )
        .route(
            "/api/suggestions",
            get(document::get_suggestions).post(document::save_suggestions),
        )
        .route("/api/usage", get(chat::usage))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
