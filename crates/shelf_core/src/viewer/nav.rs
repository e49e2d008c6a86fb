//! crates/shelf_core/src/viewer/nav.rs
//!
//! The page navigation state machine for the PDF viewer. All movement is
//! clamped to the valid page range, so callers never have to bounds-check.

/// Tracks the current page of an open document.
///
/// Until the document has loaded and reported its page count, every
/// navigation operation is a no-op: there is no upper bound to clamp
/// against yet.
#[derive(Debug, Clone)]
pub struct PageNavigator {
    current_page: u32,
    total_pages: Option<u32>,
}

impl PageNavigator {
    /// Creates a navigator positioned at `starting_page` (clamped to at
    /// least 1). The total page count is unknown until
    /// [`set_total_pages`](Self::set_total_pages) is called.
    pub fn new(starting_page: u32) -> Self {
        Self {
            current_page: starting_page.max(1),
            total_pages: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Percentage of the document read, or `None` while the page count is
    /// unknown.
    pub fn percent(&self) -> Option<f32> {
        self.total_pages
            .map(|total| (self.current_page as f32 / total as f32) * 100.0)
    }

    /// Records the page count reported by the loaded document and re-clamps
    /// the current page into the now-known range. A zero count is treated
    /// as a single-page document.
    pub fn set_total_pages(&mut self, total_pages: u32) {
        let total = total_pages.max(1);
        self.total_pages = Some(total);
        self.current_page = self.current_page.clamp(1, total);
    }

    /// Advances one page. Returns whether the page actually changed.
    pub fn next(&mut self) -> bool {
        match self.total_pages {
            Some(total) if self.current_page < total => {
                self.current_page += 1;
                true
            }
            _ => false,
        }
    }

    /// Goes back one page. Returns whether the page actually changed.
    pub fn previous(&mut self) -> bool {
        if self.total_pages.is_some() && self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to an arbitrary page, clamping out-of-range requests into
    /// `[1, total_pages]` instead of rejecting them. Returns whether the
    /// page actually changed.
    pub fn jump_to(&mut self, page: u32) -> bool {
        let Some(total) = self.total_pages else {
            return false;
        };
        let clamped = page.clamp(1, total);
        if clamped != self.current_page {
            self.current_page = clamped;
            true
        } else {
            false
        }
    }

    pub fn at_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn at_last_page(&self) -> bool {
        self.total_pages == Some(self.current_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(starting_page: u32, total: u32) -> PageNavigator {
        let mut nav = PageNavigator::new(starting_page);
        nav.set_total_pages(total);
        nav
    }

    #[test]
    fn navigation_is_a_noop_until_the_document_loads() {
        let mut nav = PageNavigator::new(3);
        assert!(!nav.next());
        assert!(!nav.previous());
        assert!(!nav.jump_to(7));
        assert_eq!(nav.page(), 3);
        assert_eq!(nav.percent(), None);
    }

    #[test]
    fn next_and_previous_stop_at_the_boundaries() {
        let mut nav = loaded(1, 3);
        assert!(!nav.previous());
        assert!(nav.next());
        assert!(nav.next());
        assert!(nav.at_last_page());
        assert!(!nav.next());
        assert_eq!(nav.page(), 3);
    }

    #[test]
    fn jump_to_clamps_instead_of_failing() {
        let mut nav = loaded(5, 10);
        assert!(nav.jump_to(15));
        assert_eq!(nav.page(), 10);
        assert!(nav.jump_to(0));
        assert_eq!(nav.page(), 1);
    }

    #[test]
    fn jump_to_the_current_page_reports_no_change() {
        let mut nav = loaded(4, 10);
        assert!(!nav.jump_to(4));
    }

    #[test]
    fn loading_reclamps_a_stale_starting_page() {
        // A stored position can exceed the page count if the file was
        // replaced with a shorter one.
        let mut nav = PageNavigator::new(50);
        nav.set_total_pages(20);
        assert_eq!(nav.page(), 20);
    }

    #[test]
    fn zero_page_count_is_treated_as_one_page() {
        let mut nav = PageNavigator::new(1);
        nav.set_total_pages(0);
        assert_eq!(nav.total_pages(), Some(1));
        assert!(!nav.next());
    }

    #[test]
    fn any_call_sequence_stays_in_bounds() {
        let mut nav = loaded(1, 10);
        let moves: [&dyn Fn(&mut PageNavigator) -> bool; 7] = [
            &|n| n.next(),
            &|n| n.next(),
            &|n| n.previous(),
            &|n| n.jump_to(9999),
            &|n| n.next(),
            &|n| n.jump_to(0),
            &|n| n.previous(),
        ];
        for (i, step) in moves.iter().cycle().take(200).enumerate() {
            step(&mut nav);
            let page = nav.page();
            assert!((1..=10).contains(&page), "step {} left page at {}", i, page);
        }
    }
}
