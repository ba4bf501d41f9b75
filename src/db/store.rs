//! Storage backend seam.
//!
//! DESIGN
//! ======
//! `Queries` talks to a `dyn Store` so the in-memory cache can stand in for
//! a real database without touching route handlers. Implementations report
//! failures as `StoreError`; the query layer decides what the client sees.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::schema::{
    ArtifactKind, Chat, ChatPage, DbMessage, Document, HistoryCursor, Suggestion, User, Visibility, Vote, VoteType,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// A record refers to a parent that does not exist.
    #[error("{entity} {id} references missing {parent}")]
    ForeignKey { entity: &'static str, id: String, parent: &'static str },
    /// A record id is already taken by a row under a different parent.
    #[error("{entity} {id} already exists")]
    Conflict { entity: &'static str, id: String },
}

/// Parameters for saving one document version.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub title: String,
    pub kind: ArtifactKind,
    pub content: String,
    pub user_id: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn get_user(&self, email: &str) -> Result<Vec<User>, StoreError>;
    async fn create_user(&self, email: &str, password: &str) -> Result<(), StoreError>;
    async fn create_guest_user(&self) -> Result<Vec<User>, StoreError>;

    // Chats
    async fn save_chat(&self, id: &str, user_id: &str, title: &str, visibility: Visibility)
    -> Result<Chat, StoreError>;
    async fn get_chat_by_id(&self, id: &str) -> Result<Option<Chat>, StoreError>;
    async fn get_chats_by_user_id(
        &self,
        user_id: &str,
        limit: usize,
        cursor: &HistoryCursor,
    ) -> Result<ChatPage, StoreError>;
    async fn delete_chat_by_id(&self, id: &str) -> Result<Option<Chat>, StoreError>;
    async fn update_chat_visibility_by_id(&self, chat_id: &str, visibility: Visibility) -> Result<(), StoreError>;

    // Messages
    async fn save_messages(&self, messages: Vec<DbMessage>) -> Result<(), StoreError>;
    async fn get_messages_by_chat_id(&self, id: &str) -> Result<Vec<DbMessage>, StoreError>;
    async fn get_message_by_id(&self, id: &str) -> Result<Vec<DbMessage>, StoreError>;
    async fn delete_messages_by_chat_id_after_timestamp(
        &self,
        chat_id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<(), StoreError>;
    async fn get_message_count_by_user_id(&self, user_id: &str) -> Result<usize, StoreError>;

    // Votes
    async fn vote_message(&self, chat_id: &str, message_id: &str, vote: VoteType) -> Result<(), StoreError>;
    async fn get_votes_by_chat_id(&self, id: &str) -> Result<Vec<Vote>, StoreError>;

    // Documents
    async fn save_document(&self, doc: NewDocument) -> Result<Document, StoreError>;
    async fn get_documents_by_id(&self, id: &str) -> Result<Vec<Document>, StoreError>;
    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>, StoreError>;
    async fn delete_documents_by_id_after_timestamp(
        &self,
        id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Vec<Document>, StoreError>;

    // Suggestions
    async fn save_suggestions(&self, suggestions: Vec<Suggestion>) -> Result<(), StoreError>;
    async fn get_suggestions_by_document_id(&self, document_id: &str) -> Result<Vec<Suggestion>, StoreError>;

    // Streams
    async fn create_stream_id(&self, stream_id: &str, chat_id: &str) -> Result<(), StoreError>;
    async fn get_stream_ids_by_chat_id(&self, chat_id: &str) -> Result<Vec<String>, StoreError>;
}
