//! Message vote routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::auth::CurrentSession;
use super::chat::{bad_request, owned_chat};
use crate::db::schema::{Vote, VoteType};
use crate::errors::{ChatError, Surface};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteQuery {
    chat_id: Option<String>,
}

/// `GET /api/vote?chatId=`: votes on an owned chat.
pub async fn get_votes(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<VoteQuery>,
) -> Result<Json<Vec<Vote>>, ChatError> {
    let Some(chat_id) = params.chat_id.filter(|id| !id.is_empty()) else {
        return Err(bad_request("Parameter chatId is required."));
    };
    let user = current.require(Surface::Vote)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Vote).await?;
    Ok(Json(state.queries.get_votes_by_chat_id(&chat_id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
    chat_id: String,
    message_id: String,
    #[serde(rename = "type")]
    vote: VoteType,
}

/// `PATCH /api/vote`: up- or down-vote one message; a second vote replaces the first.
pub async fn vote(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<VoteBody>,
) -> Result<StatusCode, ChatError> {
    let user = current.require(Surface::Vote)?;
    owned_chat(&state.queries, &body.chat_id, &user.id, Surface::Vote).await?;
    state.queries.vote_message(&body.chat_id, &body.message_id, body.vote).await?;
    Ok(StatusCode::OK)
}
