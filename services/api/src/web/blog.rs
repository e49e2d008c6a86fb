//! services/api/src/web/blog.rs
//!
//! Blog endpoints: the public published feed and single-post view, and
//! the authenticated management surface (create, update, delete, drafts).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use shelf_core::domain::{BlogImage, BlogPost, BlogPostPatch, NewBlogImage, NewBlogPost, PostStatus};
use shelf_core::ports::PortError;
use std::sync::{Arc, OnceLock};
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    /// One of `draft`, `published`, `archived`. Defaults to `draft`.
    pub status: Option<String>,
    /// Explicit slug. Derived from the title when absent.
    pub slug: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: Option<String>,
    pub slug: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BlogPostPayload {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author_id: Uuid,
    pub status: String,
    pub view_count: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<BlogPost> for BlogPostPayload {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            author_id: post.author_id,
            status: post.status.as_str().to_string(),
            view_count: post.view_count,
            meta_title: post.meta_title,
            meta_description: post.meta_description,
            created_at: post.created_at,
            updated_at: post.updated_at,
            published_at: post.published_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BlogImagePayload {
    pub id: i64,
    pub image_order: i32,
    pub file_path: String,
    pub alt_text: Option<String>,
    pub file_name: Option<String>,
}

impl From<BlogImage> for BlogImagePayload {
    fn from(image: BlogImage) -> Self {
        Self {
            id: image.id,
            image_order: image.image_order,
            file_path: image.file_path,
            alt_text: image.alt_text,
            file_name: image.file_name,
        }
    }
}

/// A single post together with its extracted image references.
#[derive(Serialize, ToSchema)]
pub struct BlogPostDetail {
    #[serde(flatten)]
    pub post: BlogPostPayload,
    pub images: Vec<BlogImagePayload>,
}

//=========================================================================================
// Slug and Image Extraction
//=========================================================================================

/// Derives a URL slug from a title: lowercased, alphanumeric runs
/// separated by single dashes, everything else dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn img_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<img[^>]*src="([^"]+)"[^>]*>"#).expect("valid regex"))
}

fn alt_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"alt="([^"]*)""#).expect("valid regex"))
}

/// Pulls the `<img>` references out of a post's HTML content, in
/// document order, so they can be tracked alongside the post.
pub fn extract_images(content: &str) -> Vec<NewBlogImage> {
    img_tag_regex()
        .captures_iter(content)
        .enumerate()
        .map(|(idx, caps)| {
            let tag = &caps[0];
            let src = caps[1].to_string();
            let alt_text = alt_attr_regex()
                .captures(tag)
                .map(|alt| alt[1].to_string())
                .filter(|alt| !alt.is_empty());
            let file_name = src
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            NewBlogImage {
                image_order: idx as i32,
                file_path: src,
                alt_text,
                file_name,
            }
        })
        .collect()
}

//=========================================================================================
// Public Handlers
//=========================================================================================

/// GET /blog/posts - Published posts, newest first
#[utoipa::path(
    get,
    path = "/blog/posts",
    responses(
        (status = 200, description = "Published posts", body = [BlogPostPayload]),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn list_published_posts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let posts = state.db.list_blog_posts(true).await.map_err(|e| {
        error!("Failed to list blog posts: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list posts".to_string(),
        )
    })?;
    let payload: Vec<BlogPostPayload> = posts.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// GET /blog/posts/{slug} - One published post by slug
#[utoipa::path(
    get,
    path = "/blog/posts/{slug}",
    params(("slug" = String, Path, description = "The post's URL slug")),
    responses(
        (status = 200, description = "The post", body = BlogPostDetail),
        (status = 404, description = "No published post with this slug"),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn get_post_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Fetch the post; drafts and archived posts are invisible here
    let post = state.db.get_blog_post_by_slug(&slug).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "Post not found".to_string())
        } else {
            error!("Failed to get blog post '{}': {:?}", slug, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load post".to_string(),
            )
        }
    })?;
    if post.status != PostStatus::Published {
        return Err((StatusCode::NOT_FOUND, "Post not found".to_string()));
    }

    // 2. Count the view. A failed counter must never break the page.
    if let Err(e) = state.db.increment_view_count(post.id).await {
        warn!("Failed to count view for post {}: {:?}", post.id, e);
    }

    // 3. Attach the stored image references
    let images = state.db.list_blog_images(post.id).await.unwrap_or_else(|e| {
        warn!("Failed to list images for post {}: {:?}", post.id, e);
        Vec::new()
    });

    Ok(Json(BlogPostDetail {
        post: post.into(),
        images: images.into_iter().map(Into::into).collect(),
    }))
}

//=========================================================================================
// Management Handlers (Authenticated)
//=========================================================================================

/// GET /blog/manage - Every post regardless of status
#[utoipa::path(
    get,
    path = "/blog/manage",
    responses(
        (status = 200, description = "All posts", body = [BlogPostPayload]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn manage_posts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let posts = state.db.list_blog_posts(false).await.map_err(|e| {
        error!("Failed to list blog posts: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to list posts".to_string(),
        )
    })?;
    let payload: Vec<BlogPostPayload> = posts.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// POST /blog/manage - Create a post
#[utoipa::path(
    post,
    path = "/blog/manage",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = BlogPostPayload),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "Slug already in use"),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn create_post_handler(
    State(state): State<Arc<AppState>>,
    axum::Extension(user_id): axum::Extension<Uuid>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the submitted fields
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Content is required".to_string()));
    }
    let status = parse_status(req.status.as_deref())?;

    // 2. Derive and reserve the slug
    let slug = resolve_slug(req.slug.as_deref(), &title)?;
    ensure_slug_free(&state, &slug, None).await?;

    // 3. Publishing now stamps the publish date
    let published_at = if status == PostStatus::Published {
        Some(Utc::now())
    } else {
        None
    };

    // 4. Create the post
    let post = state
        .db
        .create_blog_post(NewBlogPost {
            title,
            slug,
            content: req.content.clone(),
            excerpt: req.excerpt,
            author_id: user_id,
            status,
            meta_title: req.meta_title,
            meta_description: req.meta_description,
            published_at,
        })
        .await
        .map_err(|e| {
            error!("Failed to create blog post: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create post".to_string(),
            )
        })?;

    // 5. Track the images referenced by the content
    sync_images(&state, post.id, &req.content).await;

    Ok((StatusCode::CREATED, Json(BlogPostPayload::from(post))))
}

/// PUT /blog/manage/{id} - Replace a post's editable fields
#[utoipa::path(
    put,
    path = "/blog/manage/{id}",
    params(("id" = i64, Path, description = "The post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = BlogPostPayload),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such post"),
        (status = 409, description = "Slug already in use"),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn update_post_handler(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Load the current post
    let existing = state.db.get_blog_post_by_id(post_id).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "Post not found".to_string())
        } else {
            error!("Failed to get blog post {}: {:?}", post_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load post".to_string(),
            )
        }
    })?;

    // 2. Validate the submitted fields
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Content is required".to_string()));
    }
    let status = parse_status(req.status.as_deref())?;

    // 3. Re-derive the slug and check collisions when it changes
    let slug = resolve_slug(req.slug.as_deref(), &title)?;
    if slug != existing.slug {
        ensure_slug_free(&state, &slug, Some(existing.id)).await?;
    }

    // 4. Publishing stamps the date once; unpublishing keeps it
    let published_at = if status == PostStatus::Published {
        existing.published_at.or_else(|| Some(Utc::now()))
    } else {
        existing.published_at
    };

    // 5. Apply the replacement
    let post = state
        .db
        .update_blog_post(
            post_id,
            BlogPostPatch {
                title,
                slug,
                content: req.content.clone(),
                excerpt: req.excerpt,
                status,
                meta_title: req.meta_title,
                meta_description: req.meta_description,
                published_at,
            },
        )
        .await
        .map_err(|e| {
            error!("Failed to update blog post {}: {:?}", post_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update post".to_string(),
            )
        })?;

    // 6. Refresh the tracked images
    sync_images(&state, post.id, &req.content).await;

    Ok(Json(BlogPostPayload::from(post)))
}

/// DELETE /blog/manage/{id} - Delete a post and its image references
#[utoipa::path(
    delete,
    path = "/blog/manage/{id}",
    params(("id" = i64, Path, description = "The post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such post"),
        (status = 500, description = "Internal server error")
    ),
    tag = "blog"
)]
pub async fn delete_post_handler(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.db.delete_blog_post(post_id).await.map_err(|e| {
        if matches!(e, PortError::NotFound(_)) {
            (StatusCode::NOT_FOUND, "Post not found".to_string())
        } else {
            error!("Failed to delete blog post {}: {:?}", post_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete post".to_string(),
            )
        }
    })?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_status(raw: Option<&str>) -> Result<PostStatus, (StatusCode, String)> {
    match raw {
        None => Ok(PostStatus::Draft),
        Some(raw) => PostStatus::parse(raw)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown status '{}'", raw))),
    }
}

fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String, (StatusCode, String)> {
    let slug = match explicit {
        Some(raw) => slugify(raw),
        None => slugify(title),
    };
    if slug.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Slug must contain at least one alphanumeric character".to_string(),
        ));
    }
    Ok(slug)
}

/// Rejects a slug that is already taken by a different post.
async fn ensure_slug_free(
    state: &Arc<AppState>,
    slug: &str,
    current_id: Option<i64>,
) -> Result<(), (StatusCode, String)> {
    match state.db.get_blog_post_by_slug(slug).await {
        Ok(other) if Some(other.id) != current_id => Err((
            StatusCode::CONFLICT,
            format!("A post with slug '{}' already exists", slug),
        )),
        Ok(_) => Ok(()),
        Err(PortError::NotFound(_)) => Ok(()),
        Err(e) => {
            error!("Failed to check slug '{}': {:?}", slug, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to check slug".to_string(),
            ))
        }
    }
}

/// Re-extracts and stores a post's image references. Failures are logged
/// but never fail the request; the post itself is already saved.
async fn sync_images(state: &Arc<AppState>, post_id: i64, content: &str) {
    let images = extract_images(content);
    if let Err(e) = state.db.replace_blog_images(post_id, images).await {
        warn!("Failed to store image refs for post {}: {:?}", post_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_keeps_alphanumerics_and_collapses_the_rest() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust &   Tokio  "), "rust-tokio");
        assert_eq!(slugify("Already-Slugged-Title"), "already-slugged-title");
        assert_eq!(slugify("100 Days of Code"), "100-days-of-code");
    }

    #[test]
    fn slugify_drops_leading_and_trailing_separators() {
        assert_eq!(slugify("...Dots..."), "dots");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn extract_images_finds_sources_in_document_order() {
        let content = r#"<p>Intro</p>
            <img src="/uploads/first.png" alt="First diagram">
            <p>Middle</p>
            <img class="wide" src="https://cdn.example.com/second.jpg">"#;

        let images = extract_images(content);
        assert_eq!(images.len(), 2);

        assert_eq!(images[0].image_order, 0);
        assert_eq!(images[0].file_path, "/uploads/first.png");
        assert_eq!(images[0].alt_text.as_deref(), Some("First diagram"));
        assert_eq!(images[0].file_name.as_deref(), Some("first.png"));

        assert_eq!(images[1].image_order, 1);
        assert_eq!(images[1].file_path, "https://cdn.example.com/second.jpg");
        assert_eq!(images[1].alt_text, None);
        assert_eq!(images[1].file_name.as_deref(), Some("second.jpg"));
    }

    #[test]
    fn content_without_images_extracts_nothing() {
        assert!(extract_images("<p>Plain text post</p>").is_empty());
    }
}
