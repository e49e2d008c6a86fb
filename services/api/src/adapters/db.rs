//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelf_core::domain::{
    BlogImage, BlogPost, BlogPostPatch, NewBlogImage, NewBlogPost, Note, NoteWithPdf, Pdf, PdfRef,
    PostStatus, QuickRef, QuickRefPatch, ReadingProgress, User, UserCredentials,
};
use shelf_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct PdfRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    file_path: String,
    thumbnail_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl PdfRecord {
    fn to_domain(self) -> Pdf {
        Pdf {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            file_path: self.file_path,
            thumbnail_url: self.thumbnail_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    user_id: Uuid,
    pdf_id: Uuid,
    current_page: i32,
    total_pages: i32,
    last_read_at: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> ReadingProgress {
        ReadingProgress {
            user_id: self.user_id,
            pdf_id: self.pdf_id,
            current_page: self.current_page as u32,
            total_pages: self.total_pages as u32,
            last_read_at: self.last_read_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    pdf_id: Uuid,
    user_id: Uuid,
    page_number: i32,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            pdf_id: self.pdf_id,
            user_id: self.user_id,
            page_number: self.page_number as u32,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct NoteWithPdfRecord {
    id: Uuid,
    pdf_id: Uuid,
    user_id: Uuid,
    page_number: i32,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pdf_title: String,
}
impl NoteWithPdfRecord {
    fn to_domain(self) -> NoteWithPdf {
        NoteWithPdf {
            note: Note {
                id: self.id,
                pdf_id: self.pdf_id,
                user_id: self.user_id,
                page_number: self.page_number as u32,
                content: self.content,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            pdf_title: self.pdf_title,
        }
    }
}

#[derive(FromRow)]
struct PdfRefRecord {
    id: Uuid,
    title: String,
}
impl PdfRefRecord {
    fn to_domain(self) -> PdfRef {
        PdfRef {
            id: self.id,
            title: self.title,
        }
    }
}

#[derive(FromRow)]
struct BlogPostRecord {
    id: i64,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    author_id: Uuid,
    status: String,
    view_count: i32,
    meta_title: Option<String>,
    meta_description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}
impl BlogPostRecord {
    /// Fails if the stored status string is not one the domain knows,
    /// which would mean the table was modified outside the application.
    fn to_domain(self) -> PortResult<BlogPost> {
        let status = PostStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown blog post status '{}'", self.status))
        })?;
        Ok(BlogPost {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            author_id: self.author_id,
            status,
            view_count: self.view_count,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
        })
    }
}

#[derive(FromRow)]
struct BlogImageRecord {
    id: i64,
    blog_post_id: i64,
    image_order: i32,
    file_path: String,
    alt_text: Option<String>,
    file_name: Option<String>,
}
impl BlogImageRecord {
    fn to_domain(self) -> BlogImage {
        BlogImage {
            id: self.id,
            blog_post_id: self.blog_post_id,
            image_order: self.image_order,
            file_path: self.file_path,
            alt_text: self.alt_text,
            file_name: self.file_name,
        }
    }
}

#[derive(FromRow)]
struct QuickRefRecord {
    id: Uuid,
    name: String,
    content: Option<String>,
    link: Option<String>,
    tag: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl QuickRefRecord {
    fn to_domain(self) -> QuickRef {
        QuickRef {
            id: self.id,
            name: self.name,
            content: self.content,
            link: self.link,
            tag: self.tag,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const BLOG_POST_COLUMNS: &str = "id, title, slug, content, excerpt, author_id, status, \
     view_count, meta_title, meta_description, created_at, updated_at, published_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) RETURNING user_id, email",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    // --- PDF Library ---
    async fn create_pdf(
        &self,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        file_path: &str,
        thumbnail_url: Option<&str>,
    ) -> PortResult<Pdf> {
        let record = sqlx::query_as::<_, PdfRecord>(
            "INSERT INTO pdf_library (user_id, title, description, file_path, thumbnail_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, title, description, file_path, thumbnail_url, created_at, updated_at",
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(file_path)
        .bind(thumbnail_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_pdf_by_id(&self, pdf_id: Uuid) -> PortResult<Pdf> {
        let record = sqlx::query_as::<_, PdfRecord>(
            "SELECT id, user_id, title, description, file_path, thumbnail_url, created_at, updated_at \
             FROM pdf_library WHERE id = $1",
        )
        .bind(pdf_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("PDF {} not found", pdf_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn list_pdfs(&self) -> PortResult<Vec<Pdf>> {
        let records = sqlx::query_as::<_, PdfRecord>(
            "SELECT id, user_id, title, description, file_path, thumbnail_url, created_at, updated_at \
             FROM pdf_library ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_pdf_metadata(
        &self,
        pdf_id: Uuid,
        title: &str,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> PortResult<()> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE pdf_library SET title = $2, description = $3, thumbnail_url = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING id",
        )
        .bind(pdf_id)
        .bind(title)
        .bind(description)
        .bind(thumbnail_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("PDF {} not found", pdf_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(())
    }

    async fn delete_pdf(&self, pdf_id: Uuid) -> PortResult<()> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM pdf_library WHERE id = $1 RETURNING id")
            .bind(pdf_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("PDF {} not found", pdf_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(())
    }

    // --- Reading Progress ---
    async fn upsert_reading_progress(
        &self,
        user_id: Uuid,
        pdf_id: Uuid,
        current_page: u32,
        total_pages: u32,
        last_read_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_pdf_progress (user_id, pdf_id, current_page, total_pages, last_read_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, pdf_id) DO UPDATE SET \
                 current_page = EXCLUDED.current_page, \
                 total_pages = EXCLUDED.total_pages, \
                 last_read_at = EXCLUDED.last_read_at",
        )
        .bind(user_id)
        .bind(pdf_id)
        .bind(current_page as i32)
        .bind(total_pages as i32)
        .bind(last_read_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_reading_progress(
        &self,
        user_id: Uuid,
        pdf_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            "SELECT user_id, pdf_id, current_page, total_pages, last_read_at \
             FROM user_pdf_progress WHERE user_id = $1 AND pdf_id = $2",
        )
        .bind(user_id)
        .bind(pdf_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_reading_progress(&self, user_id: Uuid) -> PortResult<Vec<ReadingProgress>> {
        let records = sqlx::query_as::<_, ProgressRecord>(
            "SELECT user_id, pdf_id, current_page, total_pages, last_read_at \
             FROM user_pdf_progress WHERE user_id = $1 ORDER BY last_read_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Page Notes ---
    async fn create_note(
        &self,
        pdf_id: Uuid,
        user_id: Uuid,
        page_number: u32,
        content: &str,
    ) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(
            "INSERT INTO pdf_notes (pdf_id, user_id, page_number, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, pdf_id, user_id, page_number, content, created_at, updated_at",
        )
        .bind(pdf_id)
        .bind(user_id)
        .bind(page_number as i32)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, pdf_id, user_id, page_number, content, created_at, updated_at \
             FROM pdf_notes WHERE id = $1",
        )
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Note {} not found", note_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn list_notes_for_page(&self, pdf_id: Uuid, page_number: u32) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, pdf_id, user_id, page_number, content, created_at, updated_at \
             FROM pdf_notes WHERE pdf_id = $1 AND page_number = $2 ORDER BY created_at DESC",
        )
        .bind(pdf_id)
        .bind(page_number as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_notes(
        &self,
        pdf_id: Option<Uuid>,
        query: Option<&str>,
    ) -> PortResult<Vec<NoteWithPdf>> {
        let records = sqlx::query_as::<_, NoteWithPdfRecord>(
            "SELECT n.id, n.pdf_id, n.user_id, n.page_number, n.content, n.created_at, n.updated_at, \
                    p.title AS pdf_title \
             FROM pdf_notes n \
             JOIN pdf_library p ON p.id = n.pdf_id \
             WHERE ($1::uuid IS NULL OR n.pdf_id = $1) \
               AND ($2::text IS NULL OR n.content ILIKE '%' || $2 || '%') \
             ORDER BY n.created_at DESC",
        )
        .bind(pdf_id)
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_pdfs_with_notes(&self) -> PortResult<Vec<PdfRef>> {
        let records = sqlx::query_as::<_, PdfRefRecord>(
            "SELECT DISTINCT p.id, p.title \
             FROM pdf_library p \
             JOIN pdf_notes n ON n.pdf_id = p.id \
             ORDER BY p.title ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_note_content(&self, note_id: Uuid, content: &str) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE pdf_notes SET content = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, pdf_id, user_id, page_number, content, created_at, updated_at",
        )
        .bind(note_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Note {} not found", note_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM pdf_notes WHERE id = $1 RETURNING id")
            .bind(note_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Note {} not found", note_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(())
    }

    // --- Blog Posts ---
    async fn create_blog_post(&self, post: NewBlogPost) -> PortResult<BlogPost> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!(
            "INSERT INTO blog_posts \
                 (title, slug, content, excerpt, author_id, status, meta_title, meta_description, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {BLOG_POST_COLUMNS}",
        ))
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(post.author_id)
        .bind(post.status.as_str())
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(post.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> PortResult<BlogPost> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!(
            "SELECT {BLOG_POST_COLUMNS} FROM blog_posts WHERE slug = $1",
        ))
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Post '{}' not found", slug)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn get_blog_post_by_id(&self, post_id: i64) -> PortResult<BlogPost> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!(
            "SELECT {BLOG_POST_COLUMNS} FROM blog_posts WHERE id = $1",
        ))
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Post {} not found", post_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn list_blog_posts(&self, published_only: bool) -> PortResult<Vec<BlogPost>> {
        let sql = if published_only {
            format!(
                "SELECT {BLOG_POST_COLUMNS} FROM blog_posts \
                 WHERE status = 'published' ORDER BY published_at DESC NULLS LAST",
            )
        } else {
            format!("SELECT {BLOG_POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC")
        };
        let records = sqlx::query_as::<_, BlogPostRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_blog_post(&self, post_id: i64, patch: BlogPostPatch) -> PortResult<BlogPost> {
        let record = sqlx::query_as::<_, BlogPostRecord>(&format!(
            "UPDATE blog_posts SET \
                 title = $2, slug = $3, content = $4, excerpt = $5, status = $6, \
                 meta_title = $7, meta_description = $8, published_at = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING {BLOG_POST_COLUMNS}",
        ))
        .bind(post_id)
        .bind(&patch.title)
        .bind(&patch.slug)
        .bind(&patch.content)
        .bind(&patch.excerpt)
        .bind(patch.status.as_str())
        .bind(&patch.meta_title)
        .bind(&patch.meta_description)
        .bind(patch.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Post {} not found", post_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn delete_blog_post(&self, post_id: i64) -> PortResult<()> {
        sqlx::query_scalar::<_, i64>("DELETE FROM blog_posts WHERE id = $1 RETURNING id")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Post {} not found", post_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(())
    }

    async fn increment_view_count(&self, post_id: i64) -> PortResult<()> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = $1 RETURNING id",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Post {} not found", post_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(())
    }

    async fn replace_blog_images(
        &self,
        post_id: i64,
        images: Vec<NewBlogImage>,
    ) -> PortResult<()> {
        // Delete-and-reinsert inside one transaction so readers never see
        // a half-replaced image list.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query("DELETE FROM blog_images WHERE blog_post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for image in images {
            sqlx::query(
                "INSERT INTO blog_images (blog_post_id, image_order, file_path, alt_text, file_name) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(post_id)
            .bind(image.image_order)
            .bind(&image.file_path)
            .bind(&image.alt_text)
            .bind(&image.file_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn list_blog_images(&self, post_id: i64) -> PortResult<Vec<BlogImage>> {
        let records = sqlx::query_as::<_, BlogImageRecord>(
            "SELECT id, blog_post_id, image_order, file_path, alt_text, file_name \
             FROM blog_images WHERE blog_post_id = $1 ORDER BY image_order ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Quick Reference ---
    async fn create_quick_ref(
        &self,
        name: &str,
        content: Option<&str>,
        link: Option<&str>,
        tag: Option<&str>,
    ) -> PortResult<QuickRef> {
        let record = sqlx::query_as::<_, QuickRefRecord>(
            "INSERT INTO quick_ref (name, content, link, tag) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, content, link, tag, created_at, updated_at",
        )
        .bind(name)
        .bind(content)
        .bind(link)
        .bind(tag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_quick_refs(&self) -> PortResult<Vec<QuickRef>> {
        let records = sqlx::query_as::<_, QuickRefRecord>(
            "SELECT id, name, content, link, tag, created_at, updated_at \
             FROM quick_ref ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_quick_ref(
        &self,
        quick_ref_id: Uuid,
        patch: QuickRefPatch,
    ) -> PortResult<QuickRef> {
        let record = sqlx::query_as::<_, QuickRefRecord>(
            "UPDATE quick_ref SET name = $2, content = $3, link = $4, tag = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING id, name, content, link, tag, created_at, updated_at",
        )
        .bind(quick_ref_id)
        .bind(&patch.name)
        .bind(&patch.content)
        .bind(&patch.link)
        .bind(&patch.tag)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Quick ref {} not found", quick_ref_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_quick_ref(&self, quick_ref_id: Uuid) -> PortResult<()> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM quick_ref WHERE id = $1 RETURNING id")
            .bind(quick_ref_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Quick ref {} not found", quick_ref_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(())
    }
}
