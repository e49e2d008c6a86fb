//! services/api/src/web/quickref.rs
//!
//! The quick-reference list: small named snippets and links, publicly
//! readable, editable only by the signed-in owner.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::domain::{QuickRef, QuickRefPatch};
use shelf_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct QuickRefRequest {
    pub name: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub tag: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct QuickRefPayload {
    pub id: Uuid,
    pub name: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuickRef> for QuickRefPayload {
    fn from(entry: QuickRef) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            content: entry.content,
            link: entry.link,
            tag: entry.tag,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Trims the request and rejects a blank name. Optional fields collapse
/// to None when empty so the row never stores whitespace.
fn normalize(req: QuickRefRequest) -> Result<QuickRefPatch, (StatusCode, String)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".to_string()));
    }
    let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Ok(QuickRefPatch {
        name,
        content: clean(req.content),
        link: clean(req.link),
        tag: clean(req.tag),
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /quickref - Every entry, newest first
#[utoipa::path(
    get,
    path = "/quickref",
    responses(
        (status = 200, description = "All entries", body = [QuickRefPayload]),
        (status = 500, description = "Internal server error")
    ),
    tag = "quickref"
)]
pub async fn list_quick_refs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = state.db.list_quick_refs().await.map_err(|e| {
        error!("Failed to list quick refs: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list entries".to_string(),
        )
    })?;
    let payload: Vec<QuickRefPayload> = entries.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// POST /quickref - Add an entry
#[utoipa::path(
    post,
    path = "/quickref",
    request_body = QuickRefRequest,
    responses(
        (status = 201, description = "Entry created", body = QuickRefPayload),
        (status = 400, description = "Invalid entry"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "quickref"
)]
pub async fn create_quick_ref_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuickRefRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patch = normalize(req)?;
    let entry = state
        .db
        .create_quick_ref(
            &patch.name,
            patch.content.as_deref(),
            patch.link.as_deref(),
            patch.tag.as_deref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to create quick ref: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create entry".to_string(),
            )
        })?;
    Ok((StatusCode::CREATED, Json(QuickRefPayload::from(entry))))
}

/// PUT /quickref/{id} - Replace an entry's fields
#[utoipa::path(
    put,
    path = "/quickref/{id}",
    params(("id" = Uuid, Path, description = "The entry id")),
    request_body = QuickRefRequest,
    responses(
        (status = 200, description = "Entry updated", body = QuickRefPayload),
        (status = 400, description = "Invalid entry"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such entry"),
        (status = 500, description = "Internal server error")
    ),
    tag = "quickref"
)]
pub async fn update_quick_ref_handler(
    State(state): State<Arc<AppState>>,
    Path(quick_ref_id): Path<Uuid>,
    Json(req): Json<QuickRefRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patch = normalize(req)?;
    let entry = state
        .db
        .update_quick_ref(quick_ref_id, patch)
        .await
        .map_err(|e| {
            if matches!(e, PortError::NotFound(_)) {
                (StatusCode::NOT_FOUND, "Entry not found".to_string())
            } else {
                error!("Failed to update quick ref {}: {:?}", quick_ref_id, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update entry".to_string(),
                )
            }
        })?;
    Ok(Json(QuickRefPayload::from(entry)))
}

/// DELETE /quickref/{id} - Remove an entry
#[utoipa::path(
    delete,
    path = "/quickref/{id}",
    params(("id" = Uuid, Path, description = "The entry id")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such entry"),
        (status = 500, description = "Internal server error")
    ),
    tag = "quickref"
)]
pub async fn delete_quick_ref_handler(
    State(state): State<Arc<AppState>>,
    Path(quick_ref_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.db.delete_quick_ref(quick_ref_id).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "Entry not found".to_string())
        } else {
            error!("Failed to delete quick ref {}: {:?}", quick_ref_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete entry".to_string(),
            )
        }
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_empty_optionals() {
        let patch = normalize(QuickRefRequest {
            name: "  jq cheatsheet  ".to_string(),
            content: Some("   ".to_string()),
            link: Some(" https://example.com/jq ".to_string()),
            tag: None,
        })
        .unwrap();

        assert_eq!(patch.name, "jq cheatsheet");
        assert_eq!(patch.content, None);
        assert_eq!(patch.link.as_deref(), Some("https://example.com/jq"));
        assert_eq!(patch.tag, None);
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = normalize(QuickRefRequest {
            name: "   ".to_string(),
            content: None,
            link: None,
            tag: None,
        })
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
