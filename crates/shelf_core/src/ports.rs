//! crates/shelf_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! object stores.

use crate::domain::{
    BlogImage, BlogPost, BlogPostPatch, NewBlogImage, NewBlogPost, Note, NoteWithPdf, Pdf, PdfRef,
    QuickRef, QuickRefPatch, ReadingProgress, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- PDF Library ---
    async fn create_pdf(
        &self,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        file_path: &str,
        thumbnail_url: Option<&str>,
    ) -> PortResult<Pdf>;

    async fn get_pdf_by_id(&self, pdf_id: Uuid) -> PortResult<Pdf>;

    /// All PDFs in the library, newest first.
    async fn list_pdfs(&self) -> PortResult<Vec<Pdf>>;

    async fn update_pdf_metadata(
        &self,
        pdf_id: Uuid,
        title: &str,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> PortResult<()>;

    /// Deletes the library row; progress and notes cascade with it.
    async fn delete_pdf(&self, pdf_id: Uuid) -> PortResult<()>;

    // --- Reading Progress ---
    /// Inserts or updates the single progress row keyed by (user, pdf).
    /// Last writer wins; there is no conflict detection.
    async fn upsert_reading_progress(
        &self,
        user_id: Uuid,
        pdf_id: Uuid,
        current_page: u32,
        total_pages: u32,
        last_read_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn get_reading_progress(
        &self,
        user_id: Uuid,
        pdf_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>>;

    async fn list_reading_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>>;

    // --- Page Notes ---
    async fn create_note(
        &self,
        pdf_id: Uuid,
        user_id: Uuid,
        page_number: u32,
        content: &str,
    ) -> PortResult<Note>;

    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note>;

    /// Notes for one exact page, newest first.
    async fn list_notes_for_page(&self, pdf_id: Uuid, page_number: u32) -> PortResult<Vec<Note>>;

    /// Cross-document listing with an optional PDF filter and an optional
    /// case-insensitive content match, newest first.
    async fn search_notes(
        &self,
        pdf_id: Option<Uuid>,
        query: Option<&str>,
    ) -> PortResult<Vec<NoteWithPdf>>;

    /// The distinct set of PDFs that have at least one note.
    async fn list_pdfs_with_notes(&self) -> PortResult<Vec<PdfRef>>;

    async fn update_note_content(&self, note_id: Uuid, content: &str) -> PortResult<Note>;

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()>;

    // --- Blog Posts ---
    async fn create_blog_post(&self, post: NewBlogPost) -> PortResult<BlogPost>;

    async fn get_blog_post_by_slug(&self, slug: &str) -> PortResult<BlogPost>;

    async fn get_blog_post_by_id(&self, post_id: i64) -> PortResult<BlogPost>;

    /// Published posts ordered by publish date, or every post ordered by
    /// creation date when `published_only` is false.
    async fn list_blog_posts(&self, published_only: bool) -> PortResult<Vec<BlogPost>>;

    async fn update_blog_post(&self, post_id: i64, patch: BlogPostPatch) -> PortResult<BlogPost>;

    async fn delete_blog_post(&self, post_id: i64) -> PortResult<()>;

    async fn increment_view_count(&self, post_id: i64) -> PortResult<()>;

    /// Replaces the stored image references for a post with a new set.
    async fn replace_blog_images(
        &self,
        post_id: i64,
        images: Vec<NewBlogImage>,
    ) -> PortResult<()>;

    async fn list_blog_images(&self, post_id: i64) -> PortResult<Vec<BlogImage>>;

    // --- Quick Reference ---
    async fn create_quick_ref(
        &self,
        name: &str,
        content: Option<&str>,
        link: Option<&str>,
        tag: Option<&str>,
    ) -> PortResult<QuickRef>;

    async fn list_quick_refs(&self) -> PortResult<Vec<QuickRef>>;

    async fn update_quick_ref(
        &self,
        quick_ref_id: Uuid,
        patch: QuickRefPatch,
    ) -> PortResult<QuickRef>;

    async fn delete_quick_ref(&self, quick_ref_id: Uuid) -> PortResult<()>;
}

/// Byte-level access to the object store holding the PDF files.
/// Paths are store keys (forward-slash separated), never local paths.
#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    async fn put_object(&self, path: &str, bytes: &[u8]) -> PortResult<()>;

    async fn get_object(&self, path: &str) -> PortResult<Vec<u8>>;

    async fn delete_object(&self, path: &str) -> PortResult<()>;

    async fn object_exists(&self, path: &str) -> PortResult<bool>;
}
