//! Query layer: the one place handlers go for data.
//!
//! DESIGN
//! ======
//! Each method forwards to the configured `Store` and turns any failure
//! into a `ChatError` on the `database` surface, logging the underlying
//! error first. A missing pagination cursor becomes `not_found:database`;
//! everything else is `bad_request:database` with a short description of
//! the operation that failed. No retries, no compensation.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::error;

use super::schema::{Chat, ChatPage, DbMessage, Document, HistoryCursor, Suggestion, User, Visibility, Vote, VoteType};
use super::store::{NewDocument, Store, StoreError};
use crate::errors::{ChatError, ErrorKind, Surface};

#[derive(Clone)]
pub struct Queries {
    store: Arc<dyn Store>,
}

fn db_error(err: StoreError, context: &'static str) -> ChatError {
    error!(error = %err, "{context}");
    let kind = match err {
        StoreError::NotFound { .. } => ErrorKind::NotFound,
        StoreError::ForeignKey { .. } | StoreError::Conflict { .. } => ErrorKind::BadRequest,
    };
    ChatError::new(kind, Surface::Database).with_cause(context)
}

impl Queries {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // =========================================================================
    // USERS
    // =========================================================================

    pub async fn get_user(&self, email: &str) -> Result<Vec<User>, ChatError> {
        self.store
            .get_user(email)
            .await
            .map_err(|e| db_error(e, "Failed to get user by email"))
    }

    pub async fn create_user(&self, email: &str, password: &str) -> Result<(), ChatError> {
        self.store
            .create_user(email, password)
            .await
            .map_err(|e| db_error(e, "Failed to create user"))
    }

    /// Unlike the other queries, failure here is logged and swallowed.
    pub async fn create_guest_user(&self) -> Option<Vec<User>> {
        match self.store.create_guest_user().await {
            Ok(users) => Some(users),
            Err(e) => {
                error!(error = %e, "failed to create guest user");
                None
            }
        }
    }

    // =========================================================================
    // CHATS
    // =========================================================================

    pub async fn save_chat(
        &self,
        id: &str,
        user_id: &str,
        title: &str,
        visibility: Visibility,
    ) -> Result<Chat, ChatError> {
        self.store
            .save_chat(id, user_id, title, visibility)
            .await
            .map_err(|e| db_error(e, "Failed to save chat"))
    }

    pub async fn delete_chat_by_id(&self, id: &str) -> Result<Option<Chat>, ChatError> {
        self.store
            .delete_chat_by_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to delete chat by id"))
    }

    pub async fn get_chats_by_user_id(
        &self,
        user_id: &str,
        limit: usize,
        cursor: &HistoryCursor,
    ) -> Result<ChatPage, ChatError> {
        self.store
            .get_chats_by_user_id(user_id, limit, cursor)
            .await
            .map_err(|e| db_error(e, "Failed to get chats by user id"))
    }

    pub async fn get_chat_by_id(&self, id: &str) -> Result<Option<Chat>, ChatError> {
        self.store
            .get_chat_by_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get chat by id"))
    }

    pub async fn update_chat_visibility_by_id(&self, chat_id: &str, visibility: Visibility) -> Result<(), ChatError> {
        self.store
            .update_chat_visibility_by_id(chat_id, visibility)
            .await
            .map_err(|e| db_error(e, "Failed to update chat visibility by id"))
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    pub async fn save_messages(&self, messages: Vec<DbMessage>) -> Result<(), ChatError> {
        self.store
            .save_messages(messages)
            .await
            .map_err(|e| db_error(e, "Failed to save messages"))
    }

    pub async fn get_messages_by_chat_id(&self, id: &str) -> Result<Vec<DbMessage>, ChatError> {
        self.store
            .get_messages_by_chat_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get messages by chat id"))
    }

    pub async fn get_message_by_id(&self, id: &str) -> Result<Vec<DbMessage>, ChatError> {
        self.store
            .get_message_by_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get message by id"))
    }

    pub async fn delete_messages_by_chat_id_after_timestamp(
        &self,
        chat_id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<(), ChatError> {
        self.store
            .delete_messages_by_chat_id_after_timestamp(chat_id, timestamp)
            .await
            .map_err(|e| db_error(e, "Failed to delete messages by chat id after timestamp"))
    }

    pub async fn get_message_count_by_user_id(&self, user_id: &str) -> Result<usize, ChatError> {
        self.store
            .get_message_count_by_user_id(user_id)
            .await
            .map_err(|e| db_error(e, "Failed to get message count by user id"))
    }

    // =========================================================================
    // VOTES
    // =========================================================================

    pub async fn vote_message(&self, chat_id: &str, message_id: &str, vote: VoteType) -> Result<(), ChatError> {
        self.store
            .vote_message(chat_id, message_id, vote)
            .await
            .map_err(|e| db_error(e, "Failed to vote message"))
    }

    pub async fn get_votes_by_chat_id(&self, id: &str) -> Result<Vec<Vote>, ChatError> {
        self.store
            .get_votes_by_chat_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get votes by chat id"))
    }

    // =========================================================================
    // DOCUMENTS
    // =========================================================================

    pub async fn save_document(&self, doc: NewDocument) -> Result<Document, ChatError> {
        self.store
            .save_document(doc)
            .await
            .map_err(|e| db_error(e, "Failed to save document"))
    }

    pub async fn get_documents_by_id(&self, id: &str) -> Result<Vec<Document>, ChatError> {
        self.store
            .get_documents_by_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get documents by id"))
    }

    pub async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>, ChatError> {
        self.store
            .get_document_by_id(id)
            .await
            .map_err(|e| db_error(e, "Failed to get document by id"))
    }

    pub async fn delete_documents_by_id_after_timestamp(
        &self,
        id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Vec<Document>, ChatError> {
        self.store
            .delete_documents_by_id_after_timestamp(id, timestamp)
            .await
            .map_err(|e| db_error(e, "Failed to delete documents by id after timestamp"))
    }

    // =========================================================================
    // SUGGESTIONS
    // =========================================================================

    pub async fn save_suggestions(&self, suggestions: Vec<Suggestion>) -> Result<(), ChatError> {
        self.store
            .save_suggestions(suggestions)
            .await
            .map_err(|e| db_error(e, "Failed to save suggestions"))
    }

    pub async fn get_suggestions_by_document_id(&self, document_id: &str) -> Result<Vec<Suggestion>, ChatError> {
        self.store
            .get_suggestions_by_document_id(document_id)
            .await
            .map_err(|e| db_error(e, "Failed to get suggestions by document id"))
    }

    // =========================================================================
    // STREAMS
    // =========================================================================

    pub async fn create_stream_id(&self, stream_id: &str, chat_id: &str) -> Result<(), ChatError> {
        self.store
            .create_stream_id(stream_id, chat_id)
            .await
            .map_err(|e| db_error(e, "Failed to create stream id"))
    }

    pub async fn get_stream_ids_by_chat_id(&self, chat_id: &str) -> Result<Vec<String>, ChatError> {
        self.store
            .get_stream_ids_by_chat_id(chat_id)
            .await
            .map_err(|e| db_error(e, "Failed to get stream ids by chat id"))
    }
}

#[cfg(test)]
#[path = "queries_test.rs"]
mod tests;
