//! Local in-memory cache standing in for the chat database.
//!
//! DESIGN
//! ======
//! Every table is a `HashMap` keyed by its parent id (messages, votes and
//! stream ids by chat, versions and suggestions by document), guarded by a
//! single `RwLock`. Lookups outside the key are linear scans. Nothing is
//! persisted; a restart drops all data.
//!
//! Writes check that parent rows exist, mirroring the foreign keys of the
//! relational schema, so callers see the same failures they would against
//! a real database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::db::schema::{Chat, ChatPage, DbMessage, Document, HistoryCursor, Suggestion, User, Visibility, Vote, VoteType};
use crate::db::store::{NewDocument, Store, StoreError};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) chats: HashMap<String, Chat>,
    /// `chat_id` -> messages, ascending by `created_at`.
    pub(crate) messages: HashMap<String, Vec<DbMessage>>,
    /// `chat_id` -> one vote per message.
    pub(crate) votes: HashMap<String, Vec<Vote>>,
    /// `document_id` -> versions, oldest first.
    pub(crate) documents: HashMap<String, Vec<Document>>,
    /// `document_id` -> suggestions.
    pub(crate) suggestions: HashMap<String, Vec<Suggestion>>,
    /// `chat_id` -> stream ids in creation order.
    pub(crate) streams: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalCache {
    pub(crate) tables: Arc<RwLock<Tables>>,
}

impl LocalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record. Used by tests and dev resets.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.chats.clear();
        tables.messages.clear();
        tables.votes.clear();
        tables.documents.clear();
        tables.suggestions.clear();
        tables.streams.clear();
    }
}

fn missing_chat(id: &str) -> StoreError {
    StoreError::NotFound { entity: "chat", id: id.to_owned() }
}

fn cursor_created_at(chats: &HashMap<String, Chat>, id: &str) -> Result<OffsetDateTime, StoreError> {
    chats.get(id).map(|chat| chat.created_at).ok_or_else(|| missing_chat(id))
}

#[async_trait]
impl Store for LocalCache {
    // =========================================================================
    // USERS
    // =========================================================================

    async fn get_user(&self, _email: &str) -> Result<Vec<User>, StoreError> {
        // Only guests sign in, and guests are never stored.
        Ok(Vec::new())
    }

    async fn create_user(&self, _email: &str, _password: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_guest_user(&self) -> Result<Vec<User>, StoreError> {
        Ok(Vec::new())
    }

    // =========================================================================
    // CHATS
    // =========================================================================

    async fn save_chat(
        &self,
        id: &str,
        user_id: &str,
        title: &str,
        visibility: Visibility,
    ) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: id.to_owned(),
            created_at: OffsetDateTime::now_utc(),
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            visibility,
        };
        self.tables.write().await.chats.insert(chat.id.clone(), chat.clone());
        Ok(chat)
    }

    async fn get_chat_by_id(&self, id: &str) -> Result<Option<Chat>, StoreError> {
        Ok(self.tables.read().await.chats.get(id).cloned())
    }

    async fn get_chats_by_user_id(
        &self,
        user_id: &str,
        limit: usize,
        cursor: &HistoryCursor,
    ) -> Result<ChatPage, StoreError> {
        let tables = self.tables.read().await;

        let mut owned: Vec<&Chat> = tables.chats.values().filter(|chat| chat.user_id == user_id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let filtered: Vec<&Chat> = match cursor {
            HistoryCursor::None => owned,
            HistoryCursor::StartingAfter(id) => {
                let pivot = cursor_created_at(&tables.chats, id)?;
                owned.into_iter().filter(|chat| chat.created_at < pivot).collect()
            }
            HistoryCursor::EndingBefore(id) => {
                let pivot = cursor_created_at(&tables.chats, id)?;
                owned.into_iter().filter(|chat| chat.created_at > pivot).collect()
            }
        };

        let has_more = filtered.len() > limit;
        let chats = filtered.into_iter().take(limit).cloned().collect();
        Ok(ChatPage { chats, has_more })
    }

    async fn delete_chat_by_id(&self, id: &str) -> Result<Option<Chat>, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables.chats.remove(id);
        if removed.is_some() {
            tables.messages.remove(id);
            tables.votes.remove(id);
            tables.streams.remove(id);
        }
        Ok(removed)
    }

    async fn update_chat_visibility_by_id(&self, chat_id: &str, visibility: Visibility) -> Result<(), StoreError> {
        if let Some(chat) = self.tables.write().await.chats.get_mut(chat_id) {
            chat.visibility = visibility;
        }
        Ok(())
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    async fn save_messages(&self, messages: Vec<DbMessage>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        // Validate the whole batch before touching anything.
        if let Some(orphan) = messages.iter().find(|m| !tables.chats.contains_key(&m.chat_id)) {
            return Err(StoreError::ForeignKey { entity: "message", id: orphan.id.clone(), parent: "chat" });
        }
        // Message ids are unique across chats.
        let mut batch: HashMap<&str, &str> = HashMap::new();
        for message in &messages {
            let taken_in_batch = batch
                .insert(message.id.as_str(), message.chat_id.as_str())
                .is_some_and(|chat_id| chat_id != message.chat_id);
            let taken_elsewhere = tables
                .messages
                .iter()
                .any(|(chat_id, list)| *chat_id != message.chat_id && list.iter().any(|m| m.id == message.id));
            if taken_in_batch || taken_elsewhere {
                return Err(StoreError::Conflict { entity: "message", id: message.id.clone() });
            }
        }

        for message in messages {
            let list = tables.messages.entry(message.chat_id.clone()).or_default();
            match list.iter_mut().find(|m| m.id == message.id) {
                Some(existing) => *existing = message,
                None => list.push(message),
            }
            list.sort_by_key(|m| m.created_at);
        }
        Ok(())
    }

    async fn get_messages_by_chat_id(&self, id: &str) -> Result<Vec<DbMessage>, StoreError> {
        Ok(self.tables.read().await.messages.get(id).cloned().unwrap_or_default())
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Vec<DbMessage>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .values()
            .find_map(|list| list.iter().find(|m| m.id == id))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn delete_messages_by_chat_id_after_timestamp(
        &self,
        chat_id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let Tables { messages, votes, .. } = &mut *tables;

        let Some(list) = messages.get_mut(chat_id) else {
            return Ok(());
        };
        let (kept, dropped): (Vec<DbMessage>, Vec<DbMessage>) =
            std::mem::take(list).into_iter().partition(|m| m.created_at <= timestamp);
        *list = kept;

        if dropped.is_empty() {
            return Ok(());
        }
        let dropped_ids: HashSet<String> = dropped.into_iter().map(|m| m.id).collect();
        if let Some(chat_votes) = votes.get_mut(chat_id) {
            chat_votes.retain(|vote| !dropped_ids.contains(&vote.message_id));
        }
        Ok(())
    }

    async fn get_message_count_by_user_id(&self, user_id: &str) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .filter(|(chat_id, _)| tables.chats.get(*chat_id).is_some_and(|chat| chat.user_id == user_id))
            .map(|(_, list)| list.len())
            .sum())
    }

    // =========================================================================
    // VOTES
    // =========================================================================

    async fn vote_message(&self, chat_id: &str, message_id: &str, vote: VoteType) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.chats.contains_key(chat_id) {
            return Err(StoreError::ForeignKey { entity: "vote", id: message_id.to_owned(), parent: "chat" });
        }
        let message_exists = tables
            .messages
            .get(chat_id)
            .is_some_and(|list| list.iter().any(|m| m.id == message_id));
        if !message_exists {
            return Err(StoreError::ForeignKey { entity: "vote", id: message_id.to_owned(), parent: "message" });
        }

        let record = Vote { chat_id: chat_id.to_owned(), message_id: message_id.to_owned(), is_upvoted: vote.is_upvote() };
        let chat_votes = tables.votes.entry(chat_id.to_owned()).or_default();
        match chat_votes.iter_mut().find(|v| v.message_id == message_id) {
            Some(existing) => *existing = record,
            None => chat_votes.push(record),
        }
        Ok(())
    }

    async fn get_votes_by_chat_id(&self, id: &str) -> Result<Vec<Vote>, StoreError> {
        Ok(self.tables.read().await.votes.get(id).cloned().unwrap_or_default())
    }

    // =========================================================================
    // DOCUMENTS
    // =========================================================================

    async fn save_document(&self, doc: NewDocument) -> Result<Document, StoreError> {
        let document = Document {
            id: doc.id,
            created_at: OffsetDateTime::now_utc(),
            title: doc.title,
            content: doc.content,
            kind: doc.kind,
            user_id: doc.user_id,
        };
        self.tables
            .write()
            .await
            .documents
            .entry(document.id.clone())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn get_documents_by_id(&self, id: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.tables.read().await.documents.get(id).cloned().unwrap_or_default())
    }

    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.tables.read().await.documents.get(id).and_then(|versions| versions.last().cloned()))
    }

    async fn delete_documents_by_id_after_timestamp(
        &self,
        id: &str,
        timestamp: OffsetDateTime,
    ) -> Result<Vec<Document>, StoreError> {
        let mut tables = self.tables.write().await;
        let Tables { documents, suggestions, .. } = &mut *tables;

        if let Some(doc_suggestions) = suggestions.get_mut(id) {
            doc_suggestions.retain(|s| s.document_created_at <= timestamp);
        }

        let Some(versions) = documents.get_mut(id) else {
            return Ok(Vec::new());
        };
        let (kept, dropped): (Vec<Document>, Vec<Document>) =
            std::mem::take(versions).into_iter().partition(|d| d.created_at <= timestamp);
        if kept.is_empty() {
            documents.remove(id);
        } else {
            *versions = kept;
        }
        Ok(dropped)
    }

    // =========================================================================
    // SUGGESTIONS
    // =========================================================================

    async fn save_suggestions(&self, suggestions: Vec<Suggestion>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let orphan = suggestions.iter().find(|s| {
            !tables
                .documents
                .get(&s.document_id)
                .is_some_and(|versions| versions.iter().any(|d| d.created_at == s.document_created_at))
        });
        if let Some(orphan) = orphan {
            return Err(StoreError::ForeignKey { entity: "suggestion", id: orphan.id.clone(), parent: "document" });
        }

        for suggestion in suggestions {
            let list = tables.suggestions.entry(suggestion.document_id.clone()).or_default();
            match list.iter_mut().find(|s| s.id == suggestion.id) {
                Some(existing) => *existing = suggestion,
                None => list.push(suggestion),
            }
        }
        Ok(())
    }

    async fn get_suggestions_by_document_id(&self, document_id: &str) -> Result<Vec<Suggestion>, StoreError> {
        Ok(self.tables.read().await.suggestions.get(document_id).cloned().unwrap_or_default())
    }

    // =========================================================================
    // STREAMS
    // =========================================================================

    async fn create_stream_id(&self, stream_id: &str, chat_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.chats.contains_key(chat_id) {
            return Err(StoreError::ForeignKey { entity: "stream", id: stream_id.to_owned(), parent: "chat" });
        }
        let ids = tables.streams.entry(chat_id.to_owned()).or_default();
        if !ids.iter().any(|id| id == stream_id) {
            ids.push(stream_id.to_owned());
        }
        Ok(())
    }

    async fn get_stream_ids_by_chat_id(&self, chat_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.tables.read().await.streams.get(chat_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
