//! crates/shelf_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// A PDF document in the library. `file_path` is the key inside the
/// object store, not a local filesystem path.
#[derive(Debug, Clone)]
pub struct Pdf {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a user last left off inside one PDF. Exactly one row exists
/// per (user, pdf) pair; writes go through an upsert.
#[derive(Debug, Clone)]
pub struct ReadingProgress {
    pub user_id: Uuid,
    pub pdf_id: Uuid,
    pub current_page: u32,
    pub total_pages: u32,
    pub last_read_at: DateTime<Utc>,
}

impl ReadingProgress {
    /// Percentage of the document read, derived from the page position.
    pub fn percent(&self) -> f32 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.current_page as f32 / self.total_pages as f32) * 100.0
    }
}

/// A note attached to a single page of a PDF.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: Uuid,
    pub pdf_id: Uuid,
    pub user_id: Uuid,
    pub page_number: u32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note joined with the title of the PDF it belongs to, for the
/// cross-document notes listing.
#[derive(Debug, Clone)]
pub struct NoteWithPdf {
    pub note: Note,
    pub pdf_title: String,
}

/// A minimal reference to a PDF (used for "documents that have notes").
#[derive(Debug, Clone)]
pub struct PdfRef {
    pub id: Uuid,
    pub title: String,
}

/// Lifecycle status of a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

/// A blog post. Post ids are sequential integers rather than uuids,
/// matching the shape of the table they live in.
#[derive(Debug, Clone)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author_id: Uuid,
    pub status: PostStatus,
    pub view_count: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fields required to create a blog post. The slug is final here;
/// derivation from the title happens before this struct is built.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author_id: Uuid,
    pub status: PostStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Full replacement of a post's editable fields.
#[derive(Debug, Clone)]
pub struct BlogPostPatch {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: PostStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// An image reference extracted from a post's content.
#[derive(Debug, Clone)]
pub struct BlogImage {
    pub id: i64,
    pub blog_post_id: i64,
    pub image_order: i32,
    pub file_path: String,
    pub alt_text: Option<String>,
    pub file_name: Option<String>,
}

/// An image reference about to be stored for a post.
#[derive(Debug, Clone)]
pub struct NewBlogImage {
    pub image_order: i32,
    pub file_path: String,
    pub alt_text: Option<String>,
    pub file_name: Option<String>,
}

/// One entry in the quick-reference list.
#[derive(Debug, Clone)]
pub struct QuickRef {
    pub id: Uuid,
    pub name: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of a quick-ref entry's editable fields.
#[derive(Debug, Clone)]
pub struct QuickRefPatch {
    pub name: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub tag: Option<String>,
}
