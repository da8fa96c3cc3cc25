//! Scan errors
//!
//! A failed segment fails the whole batch. Nothing is retried
//! automatically; see [`ParallelScanTask::retry_failed`](super::ParallelScanTask::retry_failed).

use thiserror::Error;

use crate::mapping::{BoxError, MappingError};

use super::state::SegmentScanState;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan of segment {segment} failed: {source}")]
    SegmentFailed {
        segment: usize,
        #[source]
        source: BoxError,
    },

    #[error("Segment {segment} is in a failed state")]
    SegmentFailedWithoutCause { segment: usize },

    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),

    #[error("Segment {segment} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        segment: usize,
        from: SegmentScanState,
        to: SegmentScanState,
    },

    #[error("Scanned item could not be converted: {0}")]
    Conversion(#[from] MappingError),
}

impl ScanError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::SegmentFailed { .. } => "DYNAMAP_SCAN_SEGMENT_FAILED",
            ScanError::SegmentFailedWithoutCause { .. } => "DYNAMAP_SCAN_SEGMENT_FAILED",
            ScanError::InvalidRequest(_) => "DYNAMAP_SCAN_INVALID_REQUEST",
            ScanError::InvalidTransition { .. } => "DYNAMAP_SCAN_INVALID_TRANSITION",
            ScanError::Conversion(e) => e.code(),
        }
    }

    /// The segment the error is attributed to, if any
    pub fn segment(&self) -> Option<usize> {
        match self {
            ScanError::SegmentFailed { segment, .. }
            | ScanError::SegmentFailedWithoutCause { segment }
            | ScanError::InvalidTransition { segment, .. } => Some(*segment),
            ScanError::InvalidRequest(_) | ScanError::Conversion(_) => None,
        }
    }
}
