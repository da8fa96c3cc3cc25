//! Parallel segmented scans
//!
//! A table is split into segments scanned concurrently. Each batch issues
//! one page request per unfinished segment and returns the pages in segment
//! order; a single failed segment fails the batch.

mod errors;
mod request;
mod scanner;
mod state;
mod task;

pub use errors::{ScanError, ScanResult};
pub use request::{ScanClient, ScanPage, ScanRequest};
pub use scanner::ParallelScanner;
pub use state::SegmentScanState;
pub use task::ParallelScanTask;
