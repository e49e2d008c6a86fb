//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification. The handlers
//! themselves live in the per-area modules (auth, blog, library, notes,
//! quickref); this only stitches their annotations together.

use utoipa::OpenApi;

use crate::web::{auth, blog, library, notes, protocol, quickref};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        blog::list_published_posts_handler,
        blog::get_post_handler,
        blog::manage_posts_handler,
        blog::create_post_handler,
        blog::update_post_handler,
        blog::delete_post_handler,
        library::list_pdfs_handler,
        library::get_pdf_handler,
        library::progress_list_handler,
        library::upload_pdf_handler,
        library::create_upload_url_handler,
        library::upload_via_ticket_handler,
        library::register_pdf_handler,
        library::update_pdf_handler,
        library::delete_pdf_handler,
        library::serve_file_handler,
        notes::list_page_notes_handler,
        notes::create_note_handler,
        notes::update_note_handler,
        notes::delete_note_handler,
        notes::search_notes_handler,
        notes::notes_pdfs_handler,
        quickref::list_quick_refs_handler,
        quickref::create_quick_ref_handler,
        quickref::update_quick_ref_handler,
        quickref::delete_quick_ref_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            blog::CreatePostRequest,
            blog::UpdatePostRequest,
            blog::BlogPostPayload,
            blog::BlogImagePayload,
            blog::BlogPostDetail,
            library::PdfPayload,
            library::PdfDetailPayload,
            library::PdfListEntry,
            library::ProgressPayload,
            library::UploadUrlRequest,
            library::UploadUrlResponse,
            library::RegisterPdfRequest,
            library::UpdatePdfRequest,
            notes::CreateNoteRequest,
            notes::UpdateNoteRequest,
            notes::NoteSearchResult,
            notes::PdfRefPayload,
            protocol::NotePayload,
            quickref::QuickRefRequest,
            quickref::QuickRefPayload,
        )
    ),
    tags(
        (name = "auth", description = "Email/password accounts and session cookies."),
        (name = "blog", description = "Published posts and the management surface."),
        (name = "library", description = "PDF uploads, metadata, progress, and file links."),
        (name = "notes", description = "Per-page notes and cross-document search."),
        (name = "quickref", description = "The quick-reference list.")
    )
)]
pub struct ApiDoc;
