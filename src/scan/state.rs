//! Segment scan states
//!
//! ```text
//! Waiting ──► Scanning ──► HasNextPage ──► Scanning ...
//!    ▲            │
//!    │            ├──► Completed
//!    │            ▼
//!    └────────  Failed   (only via retry)
//! ```

use std::fmt;

/// Lifecycle of one segment within a parallel scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentScanState {
    Waiting,
    Scanning,
    Failed,
    HasNextPage,
    Completed,
}

impl SegmentScanState {
    /// Whether the next batch issues a request for this segment
    pub fn is_ready(&self) -> bool {
        matches!(self, SegmentScanState::Waiting | SegmentScanState::HasNextPage)
    }

    pub fn is_completed(&self) -> bool {
        *self == SegmentScanState::Completed
    }

    pub fn can_transition_to(&self, next: SegmentScanState) -> bool {
        use SegmentScanState::*;
        matches!(
            (self, next),
            (Waiting, Scanning)
                | (HasNextPage, Scanning)
                | (Scanning, HasNextPage)
                | (Scanning, Completed)
                | (Scanning, Failed)
                // Rollback when another segment fails the batch
                | (Scanning, Waiting)
                | (Failed, Waiting)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentScanState::Waiting => "WAITING",
            SegmentScanState::Scanning => "SCANNING",
            SegmentScanState::Failed => "FAILED",
            SegmentScanState::HasNextPage => "HAS_NEXT_PAGE",
            SegmentScanState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for SegmentScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
