//! Document (artifact) and suggestion routes.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::auth::CurrentSession;
use super::chat::{bad_request, parse_timestamp};
use crate::db::queries::Queries;
use crate::db::schema::{ArtifactKind, Document, Suggestion};
use crate::db::store::NewDocument;
use crate::errors::{ChatError, ErrorKind, Surface};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DocumentQuery {
    id: Option<String>,
    timestamp: Option<String>,
}

fn required_id(id: Option<String>) -> Result<String, ChatError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request("Parameter id is required."))
}

/// All versions of a document the user owns.
async fn owned_versions(queries: &Queries, id: &str, user_id: &str) -> Result<Vec<Document>, ChatError> {
    let versions = queries.get_documents_by_id(id).await?;
    let Some(first) = versions.first() else {
        return Err(ChatError::new(ErrorKind::NotFound, Surface::Document));
    };
    if first.user_id != user_id {
        return Err(ChatError::new(ErrorKind::Forbidden, Surface::Document));
    }
    Ok(versions)
}

/// `GET /api/document?id=`: every version, oldest first.
pub async fn get_document(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ChatError> {
    let id = required_id(params.id)?;
    let user = current.require(Surface::Document)?;
    Ok(Json(owned_versions(&state.queries, &id, &user.id).await?))
}

#[derive(Deserialize)]
pub struct SaveDocumentBody {
    content: String,
    title: String,
    #[serde(default)]
    kind: ArtifactKind,
}

/// `POST /api/document?id=`: save a new version.
pub async fn save_document(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<DocumentQuery>,
    Json(body): Json<SaveDocumentBody>,
) -> Result<Json<Document>, ChatError> {
    let id = required_id(params.id)?;
    let user = current.require(Surface::Document)?;

    let existing = state.queries.get_documents_by_id(&id).await?;
    if existing.first().is_some_and(|doc| doc.user_id != user.id) {
        return Err(ChatError::new(ErrorKind::Forbidden, Surface::Document));
    }

    let doc = NewDocument { id, title: body.title, kind: body.kind, content: body.content, user_id: user.id };
    Ok(Json(state.queries.save_document(doc).await?))
}

/// `DELETE /api/document?id=&timestamp=`: drop versions newer than `timestamp`.
pub async fn delete_document_versions(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ChatError> {
    let id = required_id(params.id)?;
    let Some(raw) = params.timestamp else {
        return Err(bad_request("Parameter timestamp is required."));
    };
    let timestamp = parse_timestamp(&raw)?;
    let user = current.require(Surface::Document)?;

    owned_versions(&state.queries, &id, &user.id).await?;
    Ok(Json(state.queries.delete_documents_by_id_after_timestamp(&id, timestamp).await?))
}

// =============================================================================
// SUGGESTIONS
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    document_id: Option<String>,
}

fn required_document_id(id: Option<String>) -> Result<String, ChatError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request("Parameter documentId is required."))
}

/// `GET /api/suggestions?documentId=`
pub async fn get_suggestions(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<SuggestionQuery>,
) -> Result<Json<Vec<Suggestion>>, ChatError> {
    let document_id = required_document_id(params.document_id)?;
    let user = current.require(Surface::Suggestions)?;

    let suggestions = state.queries.get_suggestions_by_document_id(&document_id).await?;
    if suggestions.first().is_some_and(|s| s.user_id != user.id) {
        return Err(ChatError::new(ErrorKind::Forbidden, Surface::Api));
    }
    Ok(Json(suggestions))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSuggestion {
    original_text: String,
    suggested_text: String,
    description: Option<String>,
}

/// `POST /api/suggestions?documentId=`: attach suggestions to the latest version.
pub async fn save_suggestions(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(params): Query<SuggestionQuery>,
    Json(body): Json<Vec<NewSuggestion>>,
) -> Result<Json<Vec<Suggestion>>, ChatError> {
    let document_id = required_document_id(params.document_id)?;
    let user = current.require(Surface::Suggestions)?;

    let latest = state
        .queries
        .get_document_by_id(&document_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorKind::NotFound, Surface::Document))?;
    if latest.user_id != user.id {
        return Err(ChatError::new(ErrorKind::Forbidden, Surface::Document));
    }

    let now = OffsetDateTime::now_utc();
    let suggestions = body
        .into_iter()
        .map(|s| Suggestion {
            id: Uuid::new_v4().to_string(),
            document_id: latest.id.clone(),
            document_created_at: latest.created_at,
            original_text: s.original_text,
            suggested_text: s.suggested_text,
            description: s.description,
            is_resolved: false,
            user_id: user.id.clone(),
            created_at: now,
        })
        .collect::<Vec<_>>();
    state.queries.save_suggestions(suggestions.clone()).await?;
    Ok(Json(suggestions))
}
