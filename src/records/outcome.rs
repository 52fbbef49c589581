//! Run-level aggregate types: pagination progress and the scrape outcome

use crate::records::CanonicalRecord;
use chrono::{DateTime, Utc};

/// Forward-only pagination progress
///
/// `current_page_index` starts at 1 and only increases; the state is
/// terminal once `has_more` is false or the index reaches the configured
/// page cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page_index: u32,
    pub has_more: bool,
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            current_page_index: 1,
            has_more: true,
        }
    }

    /// Moves to the next page index
    pub fn advance(&mut self) {
        self.current_page_index += 1;
    }

    /// Marks that no further pages exist
    pub fn exhaust(&mut self) {
        self.has_more = false;
    }

    /// Returns true once no further pages should be visited
    pub fn is_terminal(&self, max_pages: u32) -> bool {
        !self.has_more || self.current_page_index >= max_pages
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate result of one scrape run
///
/// Built incrementally by the orchestrator; the record sequence preserves
/// discovery order and is the only artifact handed to the CSV sink.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub records: Vec<CanonicalRecord>,
    pub pages_processed: u32,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScrapeOutcome {
    /// Returns true if the run recorded any non-fatal errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_starts_at_one() {
        let state = PaginationState::new();
        assert_eq!(state.current_page_index, 1);
        assert!(state.has_more);
    }

    #[test]
    fn test_pagination_terminal_on_exhaust() {
        let mut state = PaginationState::new();
        state.exhaust();
        assert!(state.is_terminal(100));
    }

    #[test]
    fn test_pagination_terminal_at_cap() {
        let mut state = PaginationState::new();
        assert!(state.is_terminal(1));

        state.advance();
        state.advance();
        assert_eq!(state.current_page_index, 3);
        assert!(state.is_terminal(3));
        assert!(!state.is_terminal(4));
    }
}
