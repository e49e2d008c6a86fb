//! crates/shelf_core/src/testutil.rs
//!
//! An in-memory `DatabaseService` double for unit tests. Notes and
//! reading-progress writes are backed for real; every other method
//! panics if a test reaches it unexpectedly.

use crate::domain::{
    BlogImage, BlogPost, BlogPostPatch, NewBlogImage, NewBlogPost, Note, NoteWithPdf, Pdf, PdfRef,
    QuickRef, QuickRefPatch, ReadingProgress, User, UserCredentials,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub struct RecordingDb {
    notes: Mutex<Vec<Note>>,
    progress_writes: Mutex<Vec<(u32, u32)>>,
    fail_progress_writes: AtomicBool,
    last_search: Mutex<Option<(Option<Uuid>, Option<String>)>>,
}

impl RecordingDb {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(Vec::new()),
            progress_writes: Mutex::new(Vec::new()),
            fail_progress_writes: AtomicBool::new(false),
            last_search: Mutex::new(None),
        }
    }

    /// Every (current_page, total_pages) pair that reached the store.
    pub fn progress_writes(&self) -> Vec<(u32, u32)> {
        self.progress_writes.lock().unwrap().clone()
    }

    /// Makes subsequent progress writes fail with an injected error.
    pub fn fail_progress_writes(&self, fail: bool) {
        self.fail_progress_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored_notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    /// The (pdf filter, query) arguments of the most recent search.
    pub fn last_search(&self) -> Option<(Option<Uuid>, Option<String>)> {
        self.last_search.lock().unwrap().clone()
    }
}

impl Default for RecordingDb {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseService for RecordingDb {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        _email: &str,
        _hashed_password: &str,
    ) -> PortResult<User> {
        unimplemented!()
    }

    async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
        unimplemented!()
    }

    async fn get_user_by_id(&self, _user_id: Uuid) -> PortResult<User> {
        unimplemented!()
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        unimplemented!()
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        unimplemented!()
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        unimplemented!()
    }

    // --- PDF Library ---
    async fn create_pdf(
        &self,
        _user_id: Uuid,
        _title: &str,
        _description: Option<&str>,
        _file_path: &str,
        _thumbnail_url: Option<&str>,
    ) -> PortResult<Pdf> {
        unimplemented!()
    }

    async fn get_pdf_by_id(&self, _pdf_id: Uuid) -> PortResult<Pdf> {
        unimplemented!()
    }

    async fn list_pdfs(&self) -> PortResult<Vec<Pdf>> {
        unimplemented!()
    }

    async fn update_pdf_metadata(
        &self,
        _pdf_id: Uuid,
        _title: &str,
        _description: Option<&str>,
        _thumbnail_url: Option<&str>,
    ) -> PortResult<()> {
        unimplemented!()
    }

    async fn delete_pdf(&self, _pdf_id: Uuid) -> PortResult<()> {
        unimplemented!()
    }

    // --- Reading Progress ---
    async fn upsert_reading_progress(
        &self,
        _user_id: Uuid,
        _pdf_id: Uuid,
        current_page: u32,
        total_pages: u32,
        _last_read_at: DateTime<Utc>,
    ) -> PortResult<()> {
        if self.fail_progress_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("injected write failure".to_string()));
        }
        self.progress_writes
            .lock()
            .unwrap()
            .push((current_page, total_pages));
        Ok(())
    }

    async fn get_reading_progress(
        &self,
        _user_id: Uuid,
        _pdf_id: Uuid,
    ) -> PortResult<Option<ReadingProgress>> {
        unimplemented!()
    }

    async fn list_reading_progress(&self, _user_id: Uuid) -> PortResult<Vec<ReadingProgress>> {
        unimplemented!()
    }

    // --- Page Notes ---
    async fn create_note(
        &self,
        pdf_id: Uuid,
        user_id: Uuid,
        page_number: u32,
        content: &str,
    ) -> PortResult<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            pdf_id,
            user_id,
            page_number,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }

    async fn get_note_by_id(&self, note_id: Uuid) -> PortResult<Note> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == note_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("note {note_id}")))
    }

    async fn list_notes_for_page(&self, pdf_id: Uuid, page_number: u32) -> PortResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.pdf_id == pdf_id && n.page_number == page_number)
            .cloned()
            .collect();
        notes.reverse();
        Ok(notes)
    }

    async fn search_notes(
        &self,
        pdf_id: Option<Uuid>,
        query: Option<&str>,
    ) -> PortResult<Vec<NoteWithPdf>> {
        *self.last_search.lock().unwrap() = Some((pdf_id, query.map(str::to_string)));
        Ok(Vec::new())
    }

    async fn list_pdfs_with_notes(&self) -> PortResult<Vec<PdfRef>> {
        unimplemented!()
    }

    async fn update_note_content(&self, note_id: Uuid, content: &str) -> PortResult<Note> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| PortError::NotFound(format!("note {note_id}")))?;
        note.content = content.to_string();
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| n.id != note_id);
        if notes.len() == before {
            return Err(PortError::NotFound(format!("note {note_id}")));
        }
        Ok(())
    }

    // --- Blog Posts ---
    async fn create_blog_post(&self, _post: NewBlogPost) -> PortResult<BlogPost> {
        unimplemented!()
    }

    async fn get_blog_post_by_slug(&self, _slug: &str) -> PortResult<BlogPost> {
        unimplemented!()
    }

    async fn get_blog_post_by_id(&self, _post_id: i64) -> PortResult<BlogPost> {
        unimplemented!()
    }

    async fn list_blog_posts(&self, _published_only: bool) -> PortResult<Vec<BlogPost>> {
        unimplemented!()
    }

    async fn update_blog_post(&self, _post_id: i64, _patch: BlogPostPatch) -> PortResult<BlogPost> {
        unimplemented!()
    }

    async fn delete_blog_post(&self, _post_id: i64) -> PortResult<()> {
        unimplemented!()
    }

    async fn increment_view_count(&self, _post_id: i64) -> PortResult<()> {
        unimplemented!()
    }

    async fn replace_blog_images(
        &self,
        _post_id: i64,
        _images: Vec<NewBlogImage>,
    ) -> PortResult<()> {
        unimplemented!()
    }

    async fn list_blog_images(&self, _post_id: i64) -> PortResult<Vec<BlogImage>> {
        unimplemented!()
    }

    // --- Quick Reference ---
    async fn create_quick_ref(
        &self,
        _name: &str,
        _content: Option<&str>,
        _link: Option<&str>,
        _tag: Option<&str>,
    ) -> PortResult<QuickRef> {
        unimplemented!()
    }

    async fn list_quick_refs(&self) -> PortResult<Vec<QuickRef>> {
        unimplemented!()
    }

    async fn update_quick_ref(
        &self,
        _quick_ref_id: Uuid,
        _patch: QuickRefPatch,
    ) -> PortResult<QuickRef> {
        unimplemented!()
    }

    async fn delete_quick_ref(&self, _quick_ref_id: Uuid) -> PortResult<()> {
        unimplemented!()
    }
}
