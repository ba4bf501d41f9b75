use super::*;
use crate::db::schema::ArtifactKind;
use serde_json::json;
use time::Duration;

fn at(secs: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_700_000_000 + secs)
}

async fn seed_chat(cache: &LocalCache, id: &str, user_id: &str, created_at: OffsetDateTime) {
    let chat = Chat {
        id: id.into(),
        created_at,
        user_id: user_id.into(),
        title: format!("chat {id}"),
        visibility: Visibility::Private,
    };
    cache.tables.write().await.chats.insert(id.into(), chat);
}

fn message(id: &str, chat_id: &str, created_at: OffsetDateTime) -> DbMessage {
    DbMessage {
        id: id.into(),
        chat_id: chat_id.into(),
        role: "user".into(),
        parts: json!([{ "type": "text", "text": id }]),
        attachments: json!([]),
        created_at,
    }
}

fn new_doc(id: &str, content: &str) -> NewDocument {
    NewDocument {
        id: id.into(),
        title: "Doc".into(),
        kind: ArtifactKind::Text,
        content: content.into(),
        user_id: "u1".into(),
    }
}

fn suggestion(id: &str, document_id: &str, document_created_at: OffsetDateTime) -> Suggestion {
    Suggestion {
        id: id.into(),
        document_id: document_id.into(),
        document_created_at,
        original_text: "teh".into(),
        suggested_text: "the".into(),
        description: None,
        is_resolved: false,
        user_id: "u1".into(),
        created_at: document_created_at,
    }
}

fn ids(page: &ChatPage) -> Vec<&str> {
    page.chats.iter().map(|c| c.id.as_str()).collect()
}

// =============================================================================
// chats
// =============================================================================

#[tokio::test]
async fn save_chat_then_get_by_id() {
    let cache = LocalCache::new();
    let saved = cache.save_chat("c1", "u1", "Hello", Visibility::Public).await.unwrap();
    let loaded = cache.get_chat_by_id("c1").await.unwrap().unwrap();
    assert_eq!(saved, loaded);
    assert_eq!(loaded.visibility, Visibility::Public);
}

#[tokio::test]
async fn get_chat_by_id_missing_is_none() {
    let cache = LocalCache::new();
    assert!(cache.get_chat_by_id("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn chats_by_user_are_newest_first_and_scoped_to_user() {
    let cache = LocalCache::new();
    seed_chat(&cache, "a", "u1", at(1)).await;
    seed_chat(&cache, "b", "u1", at(3)).await;
    seed_chat(&cache, "c", "u1", at(2)).await;
    seed_chat(&cache, "other", "u2", at(4)).await;

    let page = cache.get_chats_by_user_id("u1", 10, &HistoryCursor::None).await.unwrap();
    assert_eq!(ids(&page), vec!["b", "c", "a"]);
    assert!(!page.has_more);
}

#[tokio::test]
async fn chats_by_user_respects_limit_and_has_more() {
    let cache = LocalCache::new();
    for i in 0..5 {
        seed_chat(&cache, &format!("c{i}"), "u1", at(i)).await;
    }
    let page = cache.get_chats_by_user_id("u1", 2, &HistoryCursor::None).await.unwrap();
    assert_eq!(ids(&page), vec!["c4", "c3"]);
    assert!(page.has_more);

    let exact = cache.get_chats_by_user_id("u1", 5, &HistoryCursor::None).await.unwrap();
    assert_eq!(exact.chats.len(), 5);
    assert!(!exact.has_more);
}

#[tokio::test]
async fn starting_after_returns_strictly_older_chats() {
    let cache = LocalCache::new();
    for i in 0..5 {
        seed_chat(&cache, &format!("c{i}"), "u1", at(i)).await;
    }
    let cursor = HistoryCursor::StartingAfter("c3".into());
    let page = cache.get_chats_by_user_id("u1", 2, &cursor).await.unwrap();
    assert_eq!(ids(&page), vec!["c2", "c1"]);
    assert!(page.has_more);
}

#[tokio::test]
async fn starting_after_oldest_chat_is_empty() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c0", "u1", at(0)).await;
    seed_chat(&cache, "c1", "u1", at(1)).await;
    let cursor = HistoryCursor::StartingAfter("c0".into());
    let page = cache.get_chats_by_user_id("u1", 10, &cursor).await.unwrap();
    assert!(page.chats.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn ending_before_returns_strictly_newer_chats() {
    let cache = LocalCache::new();
    for i in 0..5 {
        seed_chat(&cache, &format!("c{i}"), "u1", at(i)).await;
    }
    let cursor = HistoryCursor::EndingBefore("c2".into());
    let page = cache.get_chats_by_user_id("u1", 10, &cursor).await.unwrap();
    assert_eq!(ids(&page), vec!["c4", "c3"]);
}

#[tokio::test]
async fn unknown_cursor_is_not_found() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c0", "u1", at(0)).await;
    let cursor = HistoryCursor::EndingBefore("ghost".into());
    let err = cache.get_chats_by_user_id("u1", 10, &cursor).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "chat", ref id } if id == "ghost"));
}

#[tokio::test]
async fn delete_chat_removes_children() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1))]).await.unwrap();
    cache.vote_message("c1", "m1", VoteType::Up).await.unwrap();
    cache.create_stream_id("s1", "c1").await.unwrap();

    let deleted = cache.delete_chat_by_id("c1").await.unwrap();
    assert_eq!(deleted.map(|c| c.id), Some("c1".to_owned()));
    assert!(cache.get_messages_by_chat_id("c1").await.unwrap().is_empty());
    assert!(cache.get_votes_by_chat_id("c1").await.unwrap().is_empty());
    assert!(cache.get_stream_ids_by_chat_id("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_chat_returns_none() {
    let cache = LocalCache::new();
    assert!(cache.delete_chat_by_id("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn update_visibility_changes_existing_and_ignores_missing() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.update_chat_visibility_by_id("c1", Visibility::Public).await.unwrap();
    cache.update_chat_visibility_by_id("ghost", Visibility::Public).await.unwrap();
    let chat = cache.get_chat_by_id("c1").await.unwrap().unwrap();
    assert_eq!(chat.visibility, Visibility::Public);
    assert!(cache.get_chat_by_id("ghost").await.unwrap().is_none());
}

// =============================================================================
// messages
// =============================================================================

#[tokio::test]
async fn save_messages_sorts_by_created_at() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache
        .save_messages(vec![message("late", "c1", at(5)), message("early", "c1", at(1))])
        .await
        .unwrap();
    let list = cache.get_messages_by_chat_id("c1").await.unwrap();
    let order: Vec<&str> = list.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(order, vec!["early", "late"]);
}

#[tokio::test]
async fn save_messages_replaces_same_id() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1))]).await.unwrap();

    let mut edited = message("m1", "c1", at(1));
    edited.parts = json!([{ "type": "text", "text": "edited" }]);
    cache.save_messages(vec![edited]).await.unwrap();

    let list = cache.get_messages_by_chat_id("c1").await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].parts[0]["text"], "edited");
}

#[tokio::test]
async fn save_messages_for_missing_chat_rejects_whole_batch() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    let err = cache
        .save_messages(vec![message("ok", "c1", at(1)), message("orphan", "ghost", at(2))])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { parent: "chat", .. }));
    assert!(cache.get_messages_by_chat_id("c1").await.unwrap().is_empty());
}

#[tokio::test]
async fn save_messages_rejects_id_owned_by_another_chat() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    seed_chat(&cache, "c2", "u2", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1))]).await.unwrap();

    let err = cache.save_messages(vec![message("m1", "c2", at(2))]).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { entity: "message", ref id } if id == "m1"));
    assert!(cache.get_messages_by_chat_id("c2").await.unwrap().is_empty());
    assert_eq!(cache.get_message_by_id("m1").await.unwrap()[0].chat_id, "c1");
}

#[tokio::test]
async fn save_messages_rejects_batch_reusing_id_across_chats() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    seed_chat(&cache, "c2", "u1", at(0)).await;
    let err = cache
        .save_messages(vec![message("m1", "c1", at(1)), message("m1", "c2", at(2))])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    assert!(cache.get_message_by_id("m1").await.unwrap().is_empty());
}

#[tokio::test]
async fn get_message_by_id_scans_all_chats() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    seed_chat(&cache, "c2", "u1", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1)), message("m2", "c2", at(2))]).await.unwrap();

    let found = cache.get_message_by_id("m2").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].chat_id, "c2");
    assert!(cache.get_message_by_id("ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_messages_after_timestamp_keeps_boundary_and_drops_votes() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache
        .save_messages(vec![message("m1", "c1", at(1)), message("m2", "c1", at(2)), message("m3", "c1", at(3))])
        .await
        .unwrap();
    cache.vote_message("c1", "m1", VoteType::Up).await.unwrap();
    cache.vote_message("c1", "m3", VoteType::Down).await.unwrap();

    cache.delete_messages_by_chat_id_after_timestamp("c1", at(2)).await.unwrap();

    let remaining: Vec<String> = cache
        .get_messages_by_chat_id("c1")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(remaining, vec!["m1", "m2"]);

    let votes = cache.get_votes_by_chat_id("c1").await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].message_id, "m1");
}

#[tokio::test]
async fn message_count_only_counts_owned_chats() {
    let cache = LocalCache::new();
    seed_chat(&cache, "mine", "u1", at(0)).await;
    seed_chat(&cache, "theirs", "u2", at(0)).await;
    cache
        .save_messages(vec![
            message("a", "mine", at(1)),
            message("b", "mine", at(2)),
            message("c", "theirs", at(3)),
        ])
        .await
        .unwrap();
    assert_eq!(cache.get_message_count_by_user_id("u1").await.unwrap(), 2);
    assert_eq!(cache.get_message_count_by_user_id("nobody").await.unwrap(), 0);
}

// =============================================================================
// votes
// =============================================================================

#[tokio::test]
async fn vote_message_upserts_per_message() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1))]).await.unwrap();

    cache.vote_message("c1", "m1", VoteType::Up).await.unwrap();
    cache.vote_message("c1", "m1", VoteType::Down).await.unwrap();

    let votes = cache.get_votes_by_chat_id("c1").await.unwrap();
    assert_eq!(votes, vec![Vote { chat_id: "c1".into(), message_id: "m1".into(), is_upvoted: false }]);
}

#[tokio::test]
async fn vote_requires_existing_message() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    let err = cache.vote_message("c1", "ghost", VoteType::Up).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { parent: "message", .. }));

    let err = cache.vote_message("ghost", "m1", VoteType::Up).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { parent: "chat", .. }));
}

// =============================================================================
// documents and suggestions
// =============================================================================

#[tokio::test]
async fn save_document_appends_versions() {
    let cache = LocalCache::new();
    let first = cache.save_document(new_doc("d1", "v1")).await.unwrap();
    let second = cache.save_document(new_doc("d1", "v2")).await.unwrap();
    assert!(second.created_at >= first.created_at);

    let versions = cache.get_documents_by_id("d1").await.unwrap();
    let contents: Vec<&str> = versions.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["v1", "v2"]);

    let latest = cache.get_document_by_id("d1").await.unwrap().unwrap();
    assert_eq!(latest.content, "v2");
    assert!(cache.get_document_by_id("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_documents_after_timestamp_trims_versions_and_suggestions() {
    let cache = LocalCache::new();
    {
        let mut tables = cache.tables.write().await;
        let versions = (1..=3)
            .map(|i| Document {
                id: "d1".into(),
                created_at: at(i),
                title: "Doc".into(),
                content: format!("v{i}"),
                kind: ArtifactKind::Code,
                user_id: "u1".into(),
            })
            .collect();
        tables.documents.insert("d1".into(), versions);
    }
    cache
        .save_suggestions(vec![suggestion("s1", "d1", at(1)), suggestion("s3", "d1", at(3))])
        .await
        .unwrap();

    let removed = cache.delete_documents_by_id_after_timestamp("d1", at(1)).await.unwrap();
    assert_eq!(removed.len(), 2);

    let versions = cache.get_documents_by_id("d1").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].content, "v1");

    let remaining = cache.get_suggestions_by_document_id("d1").await.unwrap();
    let ids: Vec<&str> = remaining.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s1"]);
}

#[tokio::test]
async fn delete_all_document_versions_forgets_document() {
    let cache = LocalCache::new();
    cache.save_document(new_doc("d1", "v1")).await.unwrap();
    let removed = cache
        .delete_documents_by_id_after_timestamp("d1", OffsetDateTime::UNIX_EPOCH)
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert!(cache.get_document_by_id("d1").await.unwrap().is_none());
}

#[tokio::test]
async fn suggestion_for_unknown_document_version_is_rejected() {
    let cache = LocalCache::new();
    let doc = cache.save_document(new_doc("d1", "v1")).await.unwrap();
    let stale = doc.created_at - Duration::seconds(30);
    let err = cache.save_suggestions(vec![suggestion("s1", "d1", stale)]).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { parent: "document", .. }));
}

// =============================================================================
// streams, users, clear
// =============================================================================

#[tokio::test]
async fn stream_ids_are_deduplicated_in_order() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.create_stream_id("s1", "c1").await.unwrap();
    cache.create_stream_id("s2", "c1").await.unwrap();
    cache.create_stream_id("s1", "c1").await.unwrap();
    assert_eq!(cache.get_stream_ids_by_chat_id("c1").await.unwrap(), vec!["s1", "s2"]);
}

#[tokio::test]
async fn stream_for_missing_chat_is_rejected() {
    let cache = LocalCache::new();
    assert!(cache.create_stream_id("s1", "ghost").await.is_err());
}

#[tokio::test]
async fn users_are_never_stored() {
    let cache = LocalCache::new();
    cache.create_user("a@b.c", "secret").await.unwrap();
    assert!(cache.get_user("a@b.c").await.unwrap().is_empty());
    assert!(cache.create_guest_user().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_empties_every_table() {
    let cache = LocalCache::new();
    seed_chat(&cache, "c1", "u1", at(0)).await;
    cache.save_messages(vec![message("m1", "c1", at(1))]).await.unwrap();
    cache.save_document(new_doc("d1", "v1")).await.unwrap();

    cache.clear().await;

    assert!(cache.get_chat_by_id("c1").await.unwrap().is_none());
    assert!(cache.get_message_by_id("m1").await.unwrap().is_empty());
    assert!(cache.get_documents_by_id("d1").await.unwrap().is_empty());
}
