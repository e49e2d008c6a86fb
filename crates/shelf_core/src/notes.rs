//! crates/shelf_core/src/notes.rs
//!
//! Page-note rules shared by the REST surface and the viewer session:
//! content validation, ownership checks on mutation, and the search
//! filters. Storage itself goes through the `DatabaseService` port.

use crate::domain::{Note, NoteWithPdf, PdfRef};
use crate::ports::{DatabaseService, PortError};
use std::sync::Arc;
use uuid::Uuid;

/// Longest accepted note body, counted in characters after trimming.
pub const MAX_NOTE_LENGTH: usize = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("{0}")]
    Validation(String),
    #[error("Not allowed to modify this note")]
    NotOwner,
    #[error(transparent)]
    Port(#[from] PortError),
}

pub struct NotesService {
    db: Arc<dyn DatabaseService>,
}

impl NotesService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Notes attached to one page of a document, newest first.
    pub async fn list_for_page(
        &self,
        pdf_id: Uuid,
        page_number: u32,
    ) -> Result<Vec<Note>, NotesError> {
        Ok(self.db.list_notes_for_page(pdf_id, page_number).await?)
    }

    pub async fn create(
        &self,
        pdf_id: Uuid,
        user_id: Uuid,
        page_number: u32,
        content: &str,
    ) -> Result<Note, NotesError> {
        if page_number < 1 {
            return Err(NotesError::Validation(
                "Page number must be at least 1".to_string(),
            ));
        }
        let content = validate_content(content)?;
        Ok(self
            .db
            .create_note(pdf_id, user_id, page_number, &content)
            .await?)
    }

    /// Rewrites a note's content. Only the author may edit it.
    pub async fn update(
        &self,
        note_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Note, NotesError> {
        let content = validate_content(content)?;
        let note = self.db.get_note_by_id(note_id).await?;
        if note.user_id != user_id {
            return Err(NotesError::NotOwner);
        }
        Ok(self.db.update_note_content(note_id, &content).await?)
    }

    /// Deletes a note. Only the author may remove it.
    pub async fn delete(&self, note_id: Uuid, user_id: Uuid) -> Result<(), NotesError> {
        let note = self.db.get_note_by_id(note_id).await?;
        if note.user_id != user_id {
            return Err(NotesError::NotOwner);
        }
        Ok(self.db.delete_note(note_id).await?)
    }

    /// Searches notes across the library. Both filters are optional; a
    /// blank query is treated as absent.
    pub async fn search(
        &self,
        pdf_id: Option<Uuid>,
        query: Option<&str>,
    ) -> Result<Vec<NoteWithPdf>, NotesError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(self.db.search_notes(pdf_id, query).await?)
    }

    /// The documents that currently have notes, for the search filter UI.
    pub async fn pdfs_with_notes(&self) -> Result<Vec<PdfRef>, NotesError> {
        Ok(self.db.list_pdfs_with_notes().await?)
    }
}

fn validate_content(content: &str) -> Result<String, NotesError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(NotesError::Validation(
            "Note content cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_NOTE_LENGTH {
        return Err(NotesError::Validation(format!(
            "Note content must be at most {MAX_NOTE_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingDb;

    fn service() -> (NotesService, Arc<RecordingDb>) {
        let db = Arc::new(RecordingDb::new());
        (NotesService::new(db.clone()), db)
    }

    #[tokio::test]
    async fn create_trims_and_stores_the_content() {
        let (notes, _db) = service();
        let note = notes
            .create(Uuid::new_v4(), Uuid::new_v4(), 3, "  remember this  ")
            .await
            .unwrap();
        assert_eq!(note.content, "remember this");
        assert_eq!(note.page_number, 3);
    }

    #[tokio::test]
    async fn whitespace_only_content_is_rejected_before_storage() {
        let (notes, db) = service();
        let err = notes
            .create(Uuid::new_v4(), Uuid::new_v4(), 1, "   \n\t ")
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::Validation(_)));
        assert!(db.stored_notes().is_empty());
    }

    #[tokio::test]
    async fn over_long_content_is_rejected() {
        let (notes, db) = service();
        let long = "x".repeat(MAX_NOTE_LENGTH + 1);
        let err = notes
            .create(Uuid::new_v4(), Uuid::new_v4(), 1, &long)
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::Validation(_)));
        assert!(db.stored_notes().is_empty());

        // Exactly at the limit is still fine.
        let exact = "x".repeat(MAX_NOTE_LENGTH);
        notes
            .create(Uuid::new_v4(), Uuid::new_v4(), 1, &exact)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn page_zero_is_rejected() {
        let (notes, db) = service();
        let err = notes
            .create(Uuid::new_v4(), Uuid::new_v4(), 0, "fine content")
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::Validation(_)));
        assert!(db.stored_notes().is_empty());
    }

    #[tokio::test]
    async fn only_the_author_may_update() {
        let (notes, db) = service();
        let author = Uuid::new_v4();
        let note = notes
            .create(Uuid::new_v4(), author, 2, "original")
            .await
            .unwrap();

        let err = notes
            .update(note.id, Uuid::new_v4(), "hijacked")
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::NotOwner));
        assert_eq!(db.stored_notes()[0].content, "original");

        let updated = notes.update(note.id, author, "revised").await.unwrap();
        assert_eq!(updated.content, "revised");
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let (notes, db) = service();
        let author = Uuid::new_v4();
        let note = notes
            .create(Uuid::new_v4(), author, 2, "keep me")
            .await
            .unwrap();

        let err = notes.delete(note.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NotesError::NotOwner));
        assert_eq!(db.stored_notes().len(), 1);

        notes.delete(note.id, author).await.unwrap();
        assert!(db.stored_notes().is_empty());
    }

    #[tokio::test]
    async fn blank_search_queries_are_dropped() {
        let (notes, db) = service();
        notes.search(None, Some("   ")).await.unwrap();
        assert_eq!(db.last_search(), Some((None, None)));

        let pdf_id = Uuid::new_v4();
        notes.search(Some(pdf_id), Some(" rust ")).await.unwrap();
        assert_eq!(
            db.last_search(),
            Some((Some(pdf_id), Some("rust".to_string())))
        );
    }
}
