//! Scan requests, pages and the client that serves them

use crate::attribute::Item;
use crate::mapping::BoxError;

/// One page request against a table, optionally for a single segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub table_name: String,
    pub segment: Option<u32>,
    pub total_segments: Option<u32>,
    pub exclusive_start_key: Option<Item>,
    pub limit: Option<u32>,
    pub consistent_read: bool,
    pub attributes_to_get: Vec<String>,
}

impl ScanRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// One request per segment, all sharing this request's options.
    pub fn segmented(&self, total_segments: u32) -> Vec<ScanRequest> {
        (0..total_segments)
            .map(|segment| ScanRequest {
                segment: Some(segment),
                total_segments: Some(total_segments),
                ..self.clone()
            })
            .collect()
    }

    pub fn with_segment(mut self, segment: u32, total_segments: u32) -> Self {
        self.segment = Some(segment);
        self.total_segments = Some(total_segments);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    pub fn with_attributes_to_get<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_get = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclusive_start_key(mut self, key: Item) -> Self {
        self.exclusive_start_key = Some(key);
        self
    }
}

/// One page of scan results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Present when the segment has more pages
    pub last_evaluated_key: Option<Item>,
    pub count: usize,
    pub scanned_count: usize,
}

impl ScanPage {
    pub fn new(items: Vec<Item>, last_evaluated_key: Option<Item>) -> Self {
        let count = items.len();
        Self {
            items,
            last_evaluated_key,
            count,
            scanned_count: count,
        }
    }

    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.is_some()
    }
}

/// Serves scan requests. Implementations own transport, signing and retries.
pub trait ScanClient: Send + Sync {
    fn scan(&self, request: &ScanRequest) -> Result<ScanPage, BoxError>;
}
