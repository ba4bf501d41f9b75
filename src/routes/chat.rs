//! Chat routes: history, create/append, read, delete, visibility, streams.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use super::auth::CurrentSession;
use crate::db::queries::Queries;
use crate::db::schema::{Chat, ChatPage, DbMessage, HistoryCursor, Visibility};
use crate::errors::{ChatError, ErrorKind, Surface};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 10;
const DEFAULT_TITLE: &str = "New chat";
const MAX_TITLE_CHARS: usize = 80;

pub(crate) fn bad_request(cause: &str) -> ChatError {
    ChatError::new(ErrorKind::BadRequest, Surface::Api).with_cause(cause)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, ChatError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|_| bad_request("Timestamp must be RFC 3339."))
}

/// Load a chat the user owns. Missing chats are `not_found:chat`; someone
/// else's chat is `forbidden:<surface>`.
pub(crate) async fn owned_chat(
    queries: &Queries,
    chat_id: &str,
    user_id: &str,
    surface: Surface,
) -> Result<Chat, ChatError> {
    let chat = queries
        .get_chat_by_id(chat_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorKind::NotFound, Surface::Chat))?;
    if chat.user_id != user_id {
        return Err(ChatError::new(ErrorKind::Forbidden, surface));
    }
    Ok(chat)
}

/// First text part of the first user message, trimmed to a title.
pub(crate) fn title_from_messages(messages: &[IncomingMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == "user")
        .filter_map(|m| m.parts.as_array())
        .flatten()
        .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map_or_else(|| DEFAULT_TITLE.to_owned(), |text| text.chars().take(MAX_TITLE_CHARS).collect())
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
    starting_after: Option<String>,
    ending_before: Option<String>,
}

/// `GET /api/history`: the caller's chats, newest first.
pub async fn history(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<ChatPage>, ChatError> {
    if params.starting_after.is_some() && params.ending_before.is_some() {
        return Err(bad_request("Only one of starting_after or ending_before can be provided."));
    }
    let user = current.require(Surface::History)?;

    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let cursor = HistoryCursor::from_parts(params.starting_after, params.ending_before);
    let page = state.queries.get_chats_by_user_id(&user.id, limit, &cursor).await?;
    Ok(Json(page))
}

// =============================================================================
// CHAT CRUD
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub parts: serde_json::Value,
    #[serde(default)]
    pub attachments: serde_json::Value,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChatBody {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

#[derive(Serialize)]
pub struct ChatWithMessages {
    pub chat: Chat,
    pub messages: Vec<DbMessage>,
}

/// `POST /api/chat`: create the chat on first use, then store messages.
pub async fn post_chat(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<PostChatBody>,
) -> Result<(StatusCode, Json<ChatWithMessages>), ChatError> {
    let user = current.require(Surface::Chat)?;
    if body.id.trim().is_empty() {
        return Err(bad_request("Chat id is required."));
    }

    let existing = state.queries.get_chat_by_id(&body.id).await?;
    if existing.as_ref().is_some_and(|chat| chat.user_id != user.id) {
        return Err(ChatError::new(ErrorKind::Forbidden, Surface::Chat));
    }

    // Re-posting a stored id replaces that message, so only unseen ids count.
    let stored: HashSet<String> = match &existing {
        Some(chat) => state
            .queries
            .get_messages_by_chat_id(&chat.id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        None => HashSet::new(),
    };
    let added = body
        .messages
        .iter()
        .map(|m| m.id.as_str())
        .filter(|id| !stored.contains(*id))
        .collect::<HashSet<_>>()
        .len();
    let used = state.queries.get_message_count_by_user_id(&user.id).await?;
    if used + added > user.user_type.message_limit(&state.auth) {
        return Err(ChatError::new(ErrorKind::RateLimit, Surface::Chat));
    }

    let (chat, status) = match existing {
        Some(chat) => (chat, StatusCode::OK),
        None => {
            let title = body.title.clone().unwrap_or_else(|| title_from_messages(&body.messages));
            let chat = state.queries.save_chat(&body.id, &user.id, &title, body.visibility).await?;
            (chat, StatusCode::CREATED)
        }
    };

    let now = OffsetDateTime::now_utc();
    let messages = body
        .messages
        .into_iter()
        .map(|m| DbMessage {
            id: m.id,
            chat_id: chat.id.clone(),
            role: m.role,
            parts: m.parts,
            attachments: m.attachments,
            created_at: m.created_at.unwrap_or(now),
        })
        .collect::<Vec<_>>();
    if !messages.is_empty() {
        state.queries.save_messages(messages).await?;
    }

    let messages = state.queries.get_messages_by_chat_id(&chat.id).await?;
    Ok((status, Json(ChatWithMessages { chat, messages })))
}

/// `GET /api/chat/:id`: a chat and its messages. Public chats are readable
/// by anyone; private ones only by their owner.
pub async fn get_chat(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatWithMessages>, ChatError> {
    let chat = state
        .queries
        .get_chat_by_id(&chat_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorKind::NotFound, Surface::Chat))?;

    if chat.visibility == Visibility::Private {
        let user = current.require(Surface::Chat)?;
        if user.id != chat.user_id {
            return Err(ChatError::new(ErrorKind::Forbidden, Surface::Chat));
        }
    }

    let messages = state.queries.get_messages_by_chat_id(&chat.id).await?;
    Ok(Json(ChatWithMessages { chat, messages }))
}

/// `DELETE /api/chat/:id`: delete an owned chat with everything under it.
pub async fn delete_chat(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
) -> Result<Json<Chat>, ChatError> {
    let user = current.require(Surface::Chat)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Chat).await?;

    let deleted = state
        .queries
        .delete_chat_by_id(&chat_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorKind::NotFound, Surface::Chat))?;
    Ok(Json(deleted))
}

#[derive(Deserialize)]
pub struct VisibilityBody {
    pub visibility: Visibility,
}

/// `PATCH /api/chat/:id/visibility`
pub async fn update_visibility(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
    Json(body): Json<VisibilityBody>,
) -> Result<StatusCode, ChatError> {
    let user = current.require(Surface::Chat)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Chat).await?;
    state.queries.update_chat_visibility_by_id(&chat_id, body.visibility).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct TrailingQuery {
    after: String,
}

/// `DELETE /api/chat/:id/messages?after=`: drop messages newer than `after`.
pub async fn delete_trailing_messages(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
    Query(params): Query<TrailingQuery>,
) -> Result<StatusCode, ChatError> {
    let user = current.require(Surface::Chat)?;
    let timestamp = parse_timestamp(&params.after)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Chat).await?;
    state
        .queries
        .delete_messages_by_chat_id_after_timestamp(&chat_id, timestamp)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/message/:id/trailing`: drop a message and everything after
/// it, e.g. before regenerating from an edited prompt.
pub async fn delete_from_message(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(message_id): Path<String>,
) -> Result<StatusCode, ChatError> {
    let user = current.require(Surface::Chat)?;
    let message = state
        .queries
        .get_message_by_id(&message_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::new(ErrorKind::NotFound, Surface::Chat))?;
    owned_chat(&state.queries, &message.chat_id, &user.id, Surface::Chat).await?;

    // The store keeps `created_at <= timestamp`; step back so the message itself goes too.
    let cutoff = message.created_at - time::Duration::nanoseconds(1);
    state
        .queries
        .delete_messages_by_chat_id_after_timestamp(&message.chat_id, cutoff)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// STREAMS
// =============================================================================

/// `POST /api/chat/:id/streams`: register a new resumable stream id.
pub async fn create_stream(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), ChatError> {
    let user = current.require(Surface::Stream)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Stream).await?;

    let stream_id = Uuid::new_v4().to_string();
    state.queries.create_stream_id(&stream_id, &chat_id).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "streamId": stream_id }))))
}

/// `GET /api/chat/:id/streams`: stream ids in creation order.
pub async fn list_streams(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<String>>, ChatError> {
    let user = current.require(Surface::Stream)?;
    owned_chat(&state.queries, &chat_id, &user.id, Surface::Stream).await?;
    Ok(Json(state.queries.get_stream_ids_by_chat_id(&chat_id).await?))
}

// =============================================================================
// USAGE
// =============================================================================

/// `GET /api/usage`: stored message count against the caller's allowance.
pub async fn usage(State(state): State<AppState>, current: CurrentSession) -> Result<Json<serde_json::Value>, ChatError> {
    let user = current.require(Surface::Auth)?;
    let count = state.queries.get_message_count_by_user_id(&user.id).await?;
    Ok(Json(serde_json::json!({
        "userType": user.user_type,
        "messageCount": count,
        "messageLimit": user.user_type.message_limit(&state.auth),
    })))
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
