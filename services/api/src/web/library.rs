//! services/api/src/web/library.rs
//!
//! PDF library endpoints: browsing, uploads (direct multipart and the
//! two-step ticket flow), metadata edits, deletion, reading-progress
//! listing, and ticketed file serving.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::domain::{Pdf, ReadingProgress};
use shelf_core::ports::PortError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{state::AppState, tickets::TicketKind};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct PdfPayload {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Pdf> for PdfPayload {
    fn from(pdf: Pdf) -> Self {
        Self {
            id: pdf.id,
            title: pdf.title,
            description: pdf.description,
            thumbnail_url: pdf.thumbnail_url,
            created_at: pdf.created_at,
            updated_at: pdf.updated_at,
        }
    }
}

/// A single PDF together with a short-lived link to its file.
#[derive(Serialize, ToSchema)]
pub struct PdfDetailPayload {
    #[serde(flatten)]
    pub pdf: PdfPayload,
    pub file_url: String,
}

/// A library listing entry. `progress` is present only for signed-in
/// callers who have opened the document before.
#[derive(Serialize, ToSchema)]
pub struct PdfListEntry {
    #[serde(flatten)]
    pub pdf: PdfPayload,
    pub progress: Option<ProgressPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressPayload {
    pub pdf_id: Uuid,
    pub current_page: u32,
    pub total_pages: u32,
    pub percent: f32,
    pub last_read_at: DateTime<Utc>,
}

impl From<ReadingProgress> for ProgressPayload {
    fn from(progress: ReadingProgress) -> Self {
        let percent = progress.percent();
        Self {
            pdf_id: progress.pdf_id,
            current_page: progress.current_page,
            total_pages: progress.total_pages,
            percent,
            last_read_at: progress.last_read_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UploadUrlRequest {
    pub file_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct UploadUrlResponse {
    /// PUT the file bytes here. The link works exactly once.
    pub upload_url: String,
    /// Pass this back when registering the document's metadata.
    pub file_path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterPdfRequest {
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePdfRequest {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

//=========================================================================================
// File Name Handling
//=========================================================================================

/// Flattens an uploaded file name to lowercase ASCII so it is safe inside
/// a storage path. Anything unrecognized collapses to single underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "document.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Storage paths carry a millisecond timestamp so re-uploads of the same
/// file name never collide.
fn storage_path(file_name: &str) -> String {
    format!(
        "pdfs/{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

fn validate_pdf_fields(
    title: &str,
    description: Option<&str>,
) -> Result<(), (StatusCode, String)> {
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Title must be at most {} characters", MAX_TITLE_LENGTH),
        ));
    }
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err((
                StatusCode::BAD_REQUEST,
                format!(
                    "Description must be at most {} characters",
                    MAX_DESCRIPTION_LENGTH
                ),
            ));
        }
    }
    Ok(())
}

//=========================================================================================
// Browsing Handlers
//=========================================================================================

/// GET /library - Every PDF in the library, newest first
#[utoipa::path(
    get,
    path = "/library",
    responses(
        (status = 200, description = "The library", body = [PdfListEntry]),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn list_pdfs_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<Uuid>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pdfs = state.db.list_pdfs().await.map_err(|e| {
        error!("Failed to list PDFs: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list library".to_string(),
        )
    })?;

    // Signed-in callers see where they left off in each document.
    let mut by_pdf: HashMap<Uuid, ReadingProgress> = HashMap::new();
    if let Some(Extension(user_id)) = user {
        match state.db.list_reading_progress(user_id).await {
            Ok(progress) => {
                by_pdf = progress.into_iter().map(|p| (p.pdf_id, p)).collect();
            }
            Err(e) => {
                warn!("Failed to load progress for listing: {:?}", e);
            }
        }
    }

    let payload: Vec<PdfListEntry> = pdfs
        .into_iter()
        .map(|pdf| PdfListEntry {
            progress: by_pdf.remove(&pdf.id).map(Into::into),
            pdf: pdf.into(),
        })
        .collect();
    Ok(Json(payload))
}

/// GET /library/pdfs/{id} - One PDF with a fresh file link
#[utoipa::path(
    get,
    path = "/library/pdfs/{id}",
    params(("id" = Uuid, Path, description = "The PDF id")),
    responses(
        (status = 200, description = "The PDF", body = PdfDetailPayload),
        (status = 404, description = "No such PDF"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn get_pdf_handler(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pdf = state.db.get_pdf_by_id(pdf_id).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "PDF not found".to_string())
        } else {
            error!("Failed to get PDF {}: {:?}", pdf_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load PDF".to_string(),
            )
        }
    })?;

    let token = state
        .tickets
        .issue(&pdf.file_path, TicketKind::Read, state.config.signed_url_ttl)
        .await;
    Ok(Json(PdfDetailPayload {
        pdf: pdf.into(),
        file_url: format!("/library/file/{}", token),
    }))
}

/// GET /library/progress - The caller's reading positions, most recent first
#[utoipa::path(
    get,
    path = "/library/progress",
    responses(
        (status = 200, description = "Reading progress", body = [ProgressPayload]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn progress_list_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let progress = state.db.list_reading_progress(user_id).await.map_err(|e| {
        error!("Failed to list reading progress: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load progress".to_string(),
        )
    })?;
    let payload: Vec<ProgressPayload> = progress.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

//=========================================================================================
// Upload Handlers
//=========================================================================================

/// POST /library/pdfs - Direct multipart upload
#[utoipa::path(
    post,
    path = "/library/pdfs",
    request_body(content_type = "multipart/form-data", description = "Fields: title, description (optional), file (application/pdf)."),
    responses(
        (status = 201, description = "PDF stored", body = PdfPayload),
        (status = 400, description = "Invalid upload"),
        (status = 401, description = "Not signed in"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn upload_pdf_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Collect the form fields
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        match field.name() {
            Some("title") => {
                let value = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read title field: {}", e),
                    )
                })?;
                title = Some(value);
            }
            Some("description") => {
                let value = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read description field: {}", e),
                    )
                })?;
                description = Some(value);
            }
            Some("file") => {
                if field.content_type() != Some("application/pdf") {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        "Only PDF files are accepted".to_string(),
                    ));
                }
                let name = field.file_name().unwrap_or("document.pdf").to_string();
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                file = Some((name, data));
            }
            _ => {}
        }
    }

    // 2. Validate what arrived
    let (file_name, data) = file.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        )
    })?;
    if data.len() > state.config.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            "File exceeds the upload limit".to_string(),
        ));
    }
    let title = title.map(|t| t.trim().to_string()).unwrap_or_default();
    let description = description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
    validate_pdf_fields(&title, description.as_deref())?;

    // 3. Store the file, then the row. A failed row insert must not leave
    //    an orphaned file behind.
    let path = storage_path(&file_name);
    state.storage.put_object(&path, &data).await.map_err(|e| {
        error!("Failed to store upload '{}': {:?}", path, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store file".to_string(),
        )
    })?;

    let pdf = match state
        .db
        .create_pdf(user_id, &title, description.as_deref(), &path, None)
        .await
    {
        Ok(pdf) => pdf,
        Err(e) => {
            error!("Failed to create PDF row: {:?}", e);
            if let Err(cleanup) = state.storage.delete_object(&path).await {
                warn!("Failed to clean up '{}' after DB error: {:?}", path, cleanup);
            }
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save PDF".to_string(),
            ));
        }
    };

    info!("Stored PDF {} at '{}'", pdf.id, pdf.file_path);
    Ok((StatusCode::CREATED, Json(PdfPayload::from(pdf))))
}

/// POST /library/upload-url - Mint a one-shot upload link
#[utoipa::path(
    post,
    path = "/library/upload-url",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Upload link minted", body = UploadUrlResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in")
    ),
    tag = "library"
)]
pub async fn create_upload_url_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadUrlRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.file_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "file_name is required".to_string(),
        ));
    }
    let path = storage_path(&req.file_name);
    let token = state
        .tickets
        .issue(&path, TicketKind::Upload, state.config.signed_url_ttl)
        .await;
    Ok(Json(UploadUrlResponse {
        upload_url: format!("/library/upload/{}", token),
        file_path: path,
    }))
}

/// PUT /library/upload/{token} - Redeem an upload link with the file bytes
#[utoipa::path(
    put,
    path = "/library/upload/{token}",
    params(("token" = String, Path, description = "An unredeemed upload token")),
    request_body(content_type = "application/pdf", description = "The raw file bytes."),
    responses(
        (status = 201, description = "File stored"),
        (status = 403, description = "Link expired or already used"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn upload_via_ticket_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let path = state
        .tickets
        .redeem(&token, TicketKind::Upload)
        .await
        .ok_or_else(|| {
            (
                StatusCode::FORBIDDEN,
                "Upload link expired or already used".to_string(),
            )
        })?;
    if body.len() > state.config.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            "File exceeds the upload limit".to_string(),
        ));
    }
    state.storage.put_object(&path, &body).await.map_err(|e| {
        error!("Failed to store upload '{}': {:?}", path, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store file".to_string(),
        )
    })?;
    info!("Stored ticketed upload at '{}'", path);
    Ok(StatusCode::CREATED)
}

/// POST /library/pdfs/metadata - Register a ticket-uploaded file
#[utoipa::path(
    post,
    path = "/library/pdfs/metadata",
    request_body = RegisterPdfRequest,
    responses(
        (status = 201, description = "PDF registered", body = PdfPayload),
        (status = 400, description = "Invalid request or file never uploaded"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn register_pdf_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    Json(req): Json<RegisterPdfRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the metadata
    let title = req.title.trim().to_string();
    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    validate_pdf_fields(&title, description.as_deref())?;

    // 2. The registered path must actually hold a file
    let exists = state
        .storage
        .object_exists(&req.file_path)
        .await
        .map_err(|e| {
            error!("Failed to check '{}': {:?}", req.file_path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to verify upload".to_string(),
            )
        })?;
    if !exists {
        return Err((
            StatusCode::BAD_REQUEST,
            "File has not been uploaded".to_string(),
        ));
    }

    // 3. Create the row; orphan nothing on failure
    let pdf = match state
        .db
        .create_pdf(user_id, &title, description.as_deref(), &req.file_path, None)
        .await
    {
        Ok(pdf) => pdf,
        Err(e) => {
            error!("Failed to register PDF: {:?}", e);
            if let Err(cleanup) = state.storage.delete_object(&req.file_path).await {
                warn!(
                    "Failed to clean up '{}' after DB error: {:?}",
                    req.file_path, cleanup
                );
            }
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save PDF".to_string(),
            ));
        }
    };

    Ok((StatusCode::CREATED, Json(PdfPayload::from(pdf))))
}

//=========================================================================================
// Metadata Handlers
//=========================================================================================

/// PUT /library/pdfs/{id} - Edit title and description
#[utoipa::path(
    put,
    path = "/library/pdfs/{id}",
    params(("id" = Uuid, Path, description = "The PDF id")),
    request_body = UpdatePdfRequest,
    responses(
        (status = 200, description = "Metadata updated", body = PdfPayload),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such PDF"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn update_pdf_handler(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<Uuid>,
    Json(req): Json<UpdatePdfRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let title = req.title.trim().to_string();
    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let thumbnail_url = req
        .thumbnail_url
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    validate_pdf_fields(&title, description.as_deref())?;

    state
        .db
        .update_pdf_metadata(pdf_id, &title, description.as_deref(), thumbnail_url.as_deref())
        .await
        .map_err(|e| {
            if matches!(e, PortError::NotFound(_)) {
                (StatusCode::NOT_FOUND, "PDF not found".to_string())
            } else {
                error!("Failed to update PDF {}: {:?}", pdf_id, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update PDF".to_string(),
                )
            }
        })?;

    let pdf = state.db.get_pdf_by_id(pdf_id).await.map_err(|e| {
        error!("Failed to reload PDF {}: {:?}", pdf_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load PDF".to_string(),
        )
    })?;
    Ok(Json(PdfPayload::from(pdf)))
}

/// DELETE /library/pdfs/{id} - Remove a PDF, its file, and its progress
#[utoipa::path(
    delete,
    path = "/library/pdfs/{id}",
    params(("id" = Uuid, Path, description = "The PDF id")),
    responses(
        (status = 204, description = "PDF deleted"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such PDF"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn delete_pdf_handler(
    State(state): State<Arc<AppState>>,
    Path(pdf_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Fetch first so the storage path survives the row deletion
    let pdf = state.db.get_pdf_by_id(pdf_id).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "PDF not found".to_string())
        } else {
            error!("Failed to get PDF {}: {:?}", pdf_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load PDF".to_string(),
            )
        }
    })?;

    // 2. The row goes first; progress and notes cascade with it
    state.db.delete_pdf(pdf_id).await.map_err(|e| {
        error!("Failed to delete PDF {}: {:?}", pdf_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete PDF".to_string(),
        )
    })?;

    // 3. The stored file is best-effort; a leftover blob is only litter
    if let Err(e) = state.storage.delete_object(&pdf.file_path).await {
        warn!("Failed to delete stored file '{}': {:?}", pdf.file_path, e);
    }

    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// File Serving
//=========================================================================================

/// GET /library/file/{token} - Serve a ticketed file
#[utoipa::path(
    get,
    path = "/library/file/{token}",
    params(("token" = String, Path, description = "An unexpired read token")),
    responses(
        (status = 200, description = "The file bytes", content_type = "application/pdf"),
        (status = 403, description = "Link expired"),
        (status = 404, description = "File missing from storage"),
        (status = 500, description = "Internal server error")
    ),
    tag = "library"
)]
pub async fn serve_file_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let path = state
        .tickets
        .redeem(&token, TicketKind::Read)
        .await
        .ok_or_else(|| (StatusCode::FORBIDDEN, "Link expired".to_string()))?;

    let bytes = state.storage.get_object(&path).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "File not found".to_string())
        } else {
            error!("Failed to read '{}': {:?}", path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file".to_string(),
            )
        }
    })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_collapses_odd_characters() {
        assert_eq!(sanitize_file_name("My Report (Final).PDF"), "my_report_final_.pdf");
        assert_eq!(sanitize_file_name("já-hotovo.pdf"), "j_-hotovo.pdf");
        assert_eq!(sanitize_file_name("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn sanitize_keeps_dots_and_dashes() {
        assert_eq!(sanitize_file_name("v1.2-draft.pdf"), "v1.2-draft.pdf");
    }

    #[test]
    fn unusable_names_fall_back_to_a_default() {
        assert_eq!(sanitize_file_name("???"), "document.pdf");
        assert_eq!(sanitize_file_name(""), "document.pdf");
    }
}
