//! services/api/src/web/notes.rs
//!
//! REST endpoints for page notes: per-page CRUD under a PDF, plus the
//! cross-document search and "documents with notes" listing that back
//! the notes browser.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::domain::{NoteWithPdf, PdfRef};
use shelf_core::notes::{NotesError, NotesService};
use shelf_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{protocol::NotePayload, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub page_number: u32,
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub content: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: u32,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub pdf_id: Option<Uuid>,
    pub q: Option<String>,
}

/// A search hit: the note plus which document it lives in.
#[derive(Serialize, ToSchema)]
pub struct NoteSearchResult {
    pub id: Uuid,
    pub pdf_id: Uuid,
    pub pdf_title: String,
    pub user_id: Uuid,
    pub page_number: u32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteWithPdf> for NoteSearchResult {
    fn from(hit: NoteWithPdf) -> Self {
        Self {
            id: hit.note.id,
            pdf_id: hit.note.pdf_id,
            pdf_title: hit.pdf_title,
            user_id: hit.note.user_id,
            page_number: hit.note.page_number,
            content: hit.note.content,
            created_at: hit.note.created_at,
            updated_at: hit.note.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PdfRefPayload {
    pub id: Uuid,
    pub title: String,
}

impl From<PdfRef> for PdfRefPayload {
    fn from(pdf: PdfRef) -> Self {
        Self {
            id: pdf.id,
            title: pdf.title,
        }
    }
}

/// Maps a notes-domain error onto the HTTP surface.
fn notes_error_response(e: NotesError) -> (StatusCode, String) {
    match e {
        NotesError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        NotesError::NotOwner => (
            StatusCode::FORBIDDEN,
            "Not allowed to modify this note".to_string(),
        ),
        NotesError::Port(PortError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "Note not found".to_string())
        }
        NotesError::Port(PortError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Not signed in".to_string())
        }
        NotesError::Port(e) => {
            error!("Notes operation failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Notes operation failed".to_string(),
            )
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /library/pdfs/{id}/notes?page=N - Notes on one page
#[utoipa::path(
    get,
    path = "/library/pdfs/{id}/notes",
    params(
        ("id" = Uuid, Path, description = "The PDF id"),
        ("page" = u32, Query, description = "The page number")
    ),
    responses(
        (status = 200, description = "Notes on the page", body = [NotePayload]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn list_page_notes_handler(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let notes = NotesService::new(state.db.clone())
        .list_for_page(pdf_id, query.page)
        .await
        .map_err(notes_error_response)?;
    let payload: Vec<NotePayload> = notes.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// POST /library/pdfs/{id}/notes - Add a note to a page
#[utoipa::path(
    post,
    path = "/library/pdfs/{id}/notes",
    params(("id" = Uuid, Path, description = "The PDF id")),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NotePayload),
        (status = 400, description = "Invalid note"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    Path(pdf_id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let note = NotesService::new(state.db.clone())
        .create(pdf_id, user_id, req.page_number, &req.content)
        .await
        .map_err(notes_error_response)?;
    Ok((StatusCode::CREATED, Json(NotePayload::from(note))))
}

/// PUT /notes/{id} - Rewrite a note's content
#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "The note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NotePayload),
        (status = 400, description = "Invalid note"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the note's author"),
        (status = 404, description = "No such note"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    Path(note_id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let note = NotesService::new(state.db.clone())
        .update(note_id, user_id, &req.content)
        .await
        .map_err(notes_error_response)?;
    Ok(Json(NotePayload::from(note)))
}

/// DELETE /notes/{id} - Remove a note
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "The note id")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the note's author"),
        (status = 404, description = "No such note"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    NotesService::new(state.db.clone())
        .delete(note_id, user_id)
        .await
        .map_err(notes_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /notes?pdf_id=&q= - Search notes across the library
#[utoipa::path(
    get,
    path = "/notes",
    params(
        ("pdf_id" = Option<Uuid>, Query, description = "Restrict hits to one PDF"),
        ("q" = Option<String>, Query, description = "Substring to match, case-insensitive")
    ),
    responses(
        (status = 200, description = "Matching notes", body = [NoteSearchResult]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn search_notes_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hits = NotesService::new(state.db.clone())
        .search(query.pdf_id, query.q.as_deref())
        .await
        .map_err(notes_error_response)?;
    let payload: Vec<NoteSearchResult> = hits.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// GET /notes/pdfs - Documents that have at least one note
#[utoipa::path(
    get,
    path = "/notes/pdfs",
    responses(
        (status = 200, description = "Documents with notes", body = [PdfRefPayload]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
pub async fn notes_pdfs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pdfs = NotesService::new(state.db.clone())
        .pdfs_with_notes()
        .await
        .map_err(notes_error_response)?;
    let payload: Vec<PdfRefPayload> = pdfs.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}
