//! crates/shelf_core/src/viewer/progress.rs
//!
//! Debounced persistence of reading progress. Page changes arrive far
//! faster than they are worth writing; only the position the reader
//! settles on gets upserted, and teardown flushes whatever is pending.

use crate::ports::DatabaseService;
use crate::viewer::debounce::Debouncer;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Quiet window between the last page change and the progress write.
pub const PROGRESS_WRITE_QUIET: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
struct PagePosition {
    page: u32,
    total_pages: u32,
}

/// Writes one user's position in one PDF through the database port.
///
/// Writes are best-effort: a failed upsert is logged and dropped rather
/// than retried, so a flaky connection can cost a position update but
/// never wedges the viewer.
pub struct ProgressWriter {
    debouncer: Debouncer<PagePosition>,
}

impl ProgressWriter {
    pub fn new(db: Arc<dyn DatabaseService>, user_id: Uuid, pdf_id: Uuid) -> Self {
        Self::with_quiet_window(db, user_id, pdf_id, PROGRESS_WRITE_QUIET)
    }

    pub fn with_quiet_window(
        db: Arc<dyn DatabaseService>,
        user_id: Uuid,
        pdf_id: Uuid,
        quiet: Duration,
    ) -> Self {
        let debouncer = Debouncer::new(quiet, move |position: PagePosition| {
            let db = Arc::clone(&db);
            async move {
                let result = db
                    .upsert_reading_progress(
                        user_id,
                        pdf_id,
                        position.page,
                        position.total_pages,
                        Utc::now(),
                    )
                    .await;
                if let Err(e) = result {
                    warn!(
                        "Failed to persist reading progress for pdf {}: {:?}",
                        pdf_id, e
                    );
                }
            }
        });
        Self { debouncer }
    }

    /// Records a committed page change; the write lands once the reader
    /// settles.
    pub async fn record(&self, page: u32, total_pages: u32) {
        self.debouncer.call(PagePosition { page, total_pages }).await;
    }

    /// Forces any pending write out immediately. Called when the session
    /// ends or the user navigates away.
    pub async fn flush(&self) {
        self.debouncer.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingDb;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_burst_of_page_changes_becomes_one_write() {
        let db = Arc::new(RecordingDb::new());
        let writer = ProgressWriter::new(db.clone(), Uuid::new_v4(), Uuid::new_v4());

        for page in 2..=6 {
            writer.record(page, 10).await;
            tokio::time::advance(Duration::from_millis(200)).await;
        }
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;

        assert_eq!(db.progress_writes(), vec![(6, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_the_pending_position_immediately() {
        let db = Arc::new(RecordingDb::new());
        let writer = ProgressWriter::new(db.clone(), Uuid::new_v4(), Uuid::new_v4());

        writer.record(4, 10).await;
        writer.flush().await;
        assert_eq!(db.progress_writes(), vec![(4, 10)]);

        // Nothing pending afterwards; the timer must not fire again.
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(db.progress_writes(), vec![(4, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_write_is_dropped_not_retried() {
        let db = Arc::new(RecordingDb::new());
        db.fail_progress_writes(true);
        let writer = ProgressWriter::new(db.clone(), Uuid::new_v4(), Uuid::new_v4());

        writer.record(3, 10).await;
        writer.flush().await;
        assert!(db.progress_writes().is_empty());

        // Later writes still go through once the store recovers.
        db.fail_progress_writes(false);
        writer.record(5, 10).await;
        writer.flush().await;
        assert_eq!(db.progress_writes(), vec![(5, 10)]);
    }
}
