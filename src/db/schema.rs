//! Record types held by the chat store.
//!
//! Field names serialize as camelCase so API payloads match what the web
//! client already sends and expects.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Kind of artifact a document renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Text,
    Code,
    Image,
    Sheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    #[must_use]
    pub fn is_upvote(self) -> bool {
        matches!(self, Self::Up)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: String,
    pub title: String,
    pub visibility: Visibility,
}

/// A stored chat message. `parts` and `attachments` are opaque to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMessage {
    pub id: String,
    pub chat_id: String,
    pub role: String,
    #[serde(default)]
    pub parts: serde_json::Value,
    #[serde(default)]
    pub attachments: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub chat_id: String,
    pub message_id: String,
    pub is_upvoted: bool,
}

/// One version of a document. Versions of the same id differ by `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub title: String,
    pub content: String,
    pub kind: ArtifactKind,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub document_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub document_created_at: OffsetDateTime,
    pub original_text: String,
    pub suggested_text: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Registered account. Guests never get one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// One page of a user's chat history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    pub chats: Vec<Chat>,
    pub has_more: bool,
}

/// Cursor for paging through chat history. Both ends are exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryCursor {
    #[default]
    None,
    StartingAfter(String),
    EndingBefore(String),
}

impl HistoryCursor {
    /// `starting_after` takes precedence when both are given.
    #[must_use]
    pub fn from_parts(starting_after: Option<String>, ending_before: Option<String>) -> Self {
        match (starting_after, ending_before) {
            (Some(id), _) => Self::StartingAfter(id),
            (None, Some(id)) => Self::EndingBefore(id),
            (None, None) => Self::None,
        }
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
