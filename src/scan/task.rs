//! Parallel scan coordinator
//!
//! Each call to [`ParallelScanTask::next_batch`] issues one request for every
//! segment that is not finished, runs them concurrently and returns their
//! pages in segment order.
//!
//! # Invariants
//!
//! - A segment is Completed exactly when its last page had no last key
//! - Any failed segment fails the batch; the other segments of that batch
//!   roll back so no page is lost
//! - A failed segment blocks further batches until `retry_failed`

use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{debug, warn};

use crate::attribute::Item;
use crate::mapping::BoxError;
use crate::observability::{MetricsRegistry, ObservationScope};

use super::errors::{ScanError, ScanResult};
use super::request::{ScanClient, ScanPage, ScanRequest};
use super::state::SegmentScanState;

#[derive(Debug)]
struct Segment {
    request: ScanRequest,
    state: SegmentScanState,
    last_key: Option<Item>,
}

impl Segment {
    fn transition(&mut self, index: usize, to: SegmentScanState) -> ScanResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(ScanError::InvalidTransition {
                segment: index,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Coordinates one parallel scan over a fixed set of segments.
pub struct ParallelScanTask {
    client: Arc<dyn ScanClient>,
    segments: Vec<Segment>,
    metrics: Arc<MetricsRegistry>,
}

impl ParallelScanTask {
    /// Creates a task with one segment per request.
    ///
    /// Requests must be non-empty and must not carry a zero page limit. A
    /// request that names a segment must name its own position.
    pub fn new(client: Arc<dyn ScanClient>, requests: Vec<ScanRequest>) -> ScanResult<Self> {
        if requests.is_empty() {
            return Err(ScanError::InvalidRequest(
                "a parallel scan needs at least one segment".to_string(),
            ));
        }
        let total = requests.len();
        for (index, request) in requests.iter().enumerate() {
            // A zero limit would end the segment after an empty page
            if request.limit == Some(0) {
                return Err(ScanError::InvalidRequest(format!(
                    "request {} has a zero page limit",
                    index
                )));
            }
            if let Some(segment) = request.segment {
                if segment as usize != index {
                    return Err(ScanError::InvalidRequest(format!(
                        "request {} names segment {}",
                        index, segment
                    )));
                }
            }
            if let Some(declared) = request.total_segments {
                if declared as usize != total {
                    return Err(ScanError::InvalidRequest(format!(
                        "request {} declares {} segments but {} were given",
                        index, declared, total
                    )));
                }
            }
        }

        let segments = requests
            .into_iter()
            .map(|request| Segment {
                last_key: request.exclusive_start_key.clone(),
                request,
                state: SegmentScanState::Waiting,
            })
            .collect();

        Ok(Self {
            client,
            segments,
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    /// Reports into a shared registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn total_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_states(&self) -> Vec<SegmentScanState> {
        self.segments.iter().map(|s| s.state).collect()
    }

    pub fn is_all_segments_complete(&self) -> bool {
        self.segments.iter().all(|s| s.state.is_completed())
    }

    /// Moves failed segments back to Waiting, keeping their last key.
    /// Returns how many were reset.
    pub fn retry_failed(&mut self) -> usize {
        let mut reset = 0;
        for (index, segment) in self.segments.iter_mut().enumerate() {
            if segment.state == SegmentScanState::Failed
                && segment.transition(index, SegmentScanState::Waiting).is_ok()
            {
                reset += 1;
            }
        }
        if reset > 0 {
            debug!(event = "SCAN_SEGMENTS_RESET", segments = reset, "failed segments reset");
        }
        reset
    }

    /// Scans the next page of every unfinished segment.
    ///
    /// Blocks until every issued request has finished. Returns an empty
    /// batch once all segments are complete.
    pub fn next_batch(&mut self) -> ScanResult<Vec<ScanPage>> {
        if let Some(index) = self
            .segments
            .iter()
            .position(|s| s.state == SegmentScanState::Failed)
        {
            return Err(ScanError::SegmentFailedWithoutCause { segment: index });
        }

        let active: Vec<usize> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.state.is_ready())
            .map(|(index, _)| index)
            .collect();
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let scope = ObservationScope::new("SCAN_BATCH");
        let mut previous = BTreeMap::new();
        for &index in &active {
            let segment = &mut self.segments[index];
            previous.insert(index, segment.state);
            segment.transition(index, SegmentScanState::Scanning)?;
        }

        let mut outcomes = self.run_requests(&active);

        let mut pages = Vec::with_capacity(active.len());
        let mut failure: Option<ScanError> = None;
        for &index in &active {
            match outcomes.remove(&index) {
                Some(Ok(page)) => pages.push((index, page)),
                Some(Err(source)) => {
                    self.record_failure(index, &source.to_string())?;
                    failure.get_or_insert(ScanError::SegmentFailed {
                        segment: index,
                        source,
                    });
                }
                None => {
                    self.record_failure(index, "no result")?;
                    failure.get_or_insert(ScanError::SegmentFailedWithoutCause { segment: index });
                }
            }
        }

        if let Some(err) = failure {
            // Successful segments re-read the same page on the next batch
            for (index, _) in pages {
                if let Some(&state) = previous.get(&index) {
                    self.segments[index].transition(index, state)?;
                }
            }
            scope.fail(&err.to_string());
            return Err(err);
        }

        let mut batch = Vec::with_capacity(pages.len());
        for (index, page) in pages {
            let next = if page.has_more() {
                SegmentScanState::HasNextPage
            } else {
                SegmentScanState::Completed
            };
            let segment = &mut self.segments[index];
            segment.transition(index, next)?;
            segment.last_key = page.last_evaluated_key.clone();
            batch.push(page);
        }

        self.metrics.increment_scan_batches();
        self.metrics.add_scan_pages(batch.len() as u64);
        debug!(
            event = "SCAN_BATCH_PAGES",
            segments = active.len(),
            items = batch.iter().map(|p| p.items.len()).sum::<usize>(),
            "batch assembled"
        );
        scope.complete();
        Ok(batch)
    }

    /// Runs one request per active segment on scoped threads and collects
    /// completion events from a channel. A segment missing from the result
    /// panicked.
    fn run_requests(&self, active: &[usize]) -> BTreeMap<usize, Result<ScanPage, BoxError>> {
        let client: &dyn ScanClient = self.client.as_ref();
        let (tx, rx) = mpsc::channel::<(usize, Result<ScanPage, BoxError>)>();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(active.len());
            for &index in active {
                let segment = &self.segments[index];
                let mut request = segment.request.clone();
                request.exclusive_start_key = segment.last_key.clone();
                let tx = tx.clone();
                handles.push(s.spawn(move || {
                    let result = client.scan(&request);
                    // The receiver outlives the scope
                    let _ = tx.send((index, result));
                }));
            }
            for handle in handles {
                if handle.join().is_err() {
                    warn!(event = "SCAN_WORKER_PANICKED", "scan worker panicked");
                }
            }
        });
        drop(tx);

        rx.into_iter().collect()
    }

    fn record_failure(&mut self, index: usize, reason: &str) -> ScanResult<()> {
        self.segments[index].transition(index, SegmentScanState::Failed)?;
        self.metrics.increment_scan_segment_failures();
        warn!(
            event = "SCAN_SEGMENT_FAILED",
            segment = index,
            table = %self.segments[index].request.table_name,
            reason,
            "segment scan failed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn key(n: usize) -> Item {
        let mut item = Item::new();
        item.insert("id".into(), AttributeValue::N(n.to_string()));
        item
    }

    /// Serves `pages` pages of one item per segment.
    struct PagedClient {
        pages: usize,
        calls: AtomicUsize,
        fail_segment: Mutex<Option<u32>>,
    }

    impl PagedClient {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                calls: AtomicUsize::new(0),
                fail_segment: Mutex::new(None),
            }
        }
    }

    impl ScanClient for PagedClient {
        fn scan(&self, request: &ScanRequest) -> Result<ScanPage, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let segment = request.segment.unwrap_or(0);
            if *self.fail_segment.lock().unwrap() == Some(segment) {
                return Err(format!("throttled on segment {}", segment).into());
            }
            let page = match &request.exclusive_start_key {
                None => 0,
                Some(k) => k["id"].as_n().unwrap().parse::<usize>().unwrap() % 100 + 1,
            };
            let id = segment as usize * 100 + page;
            let last = if page + 1 < self.pages { Some(key(id)) } else { None };
            Ok(ScanPage::new(vec![key(id)], last))
        }
    }

    #[test]
    fn test_rejects_empty_and_inconsistent_requests() {
        let client: Arc<dyn ScanClient> = Arc::new(PagedClient::new(1));
        assert!(ParallelScanTask::new(Arc::clone(&client), vec![]).is_err());

        let bad = vec![ScanRequest::new("t").with_segment(1, 2), ScanRequest::new("t")];
        let err = ParallelScanTask::new(client, bad).err().unwrap();
        assert_eq!(err.code(), "DYNAMAP_SCAN_INVALID_REQUEST");
    }

    #[test]
    fn test_rejects_zero_page_limit() {
        let client: Arc<dyn ScanClient> = Arc::new(PagedClient::new(1));
        let requests = ScanRequest::new("t").with_limit(0).segmented(2);
        let err = ParallelScanTask::new(client, requests).err().unwrap();
        assert_eq!(err.code(), "DYNAMAP_SCAN_INVALID_REQUEST");
        assert!(err.to_string().contains("zero page limit"));
    }

    #[test]
    fn test_batches_in_segment_order_until_complete() {
        let client = Arc::new(PagedClient::new(2));
        let requests = ScanRequest::new("t").segmented(3);
        let mut task = ParallelScanTask::new(client.clone(), requests).unwrap();

        let first = task.next_batch().unwrap();
        assert_eq!(first.len(), 3);
        let ids: Vec<_> = first.iter().map(|p| p.items[0]["id"].clone()).collect();
        assert_eq!(ids, vec![key(0)["id"].clone(), key(100)["id"].clone(), key(200)["id"].clone()]);
        assert_eq!(task.segment_states(), vec![SegmentScanState::HasNextPage; 3]);

        let second = task.next_batch().unwrap();
        assert_eq!(second.len(), 3);
        assert!(task.is_all_segments_complete());

        assert!(task.next_batch().unwrap().is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 6);
        assert_eq!(task.metrics().snapshot().scan_batches, 2);
    }

    #[test]
    fn test_failure_fails_batch_and_rolls_back() {
        let client = Arc::new(PagedClient::new(1));
        *client.fail_segment.lock().unwrap() = Some(1);
        let mut task = ParallelScanTask::new(client.clone(), ScanRequest::new("t").segmented(3)).unwrap();

        let err = task.next_batch().unwrap_err();
        assert_eq!(err.segment(), Some(1));
        assert!(err.to_string().contains("throttled"));
        assert_eq!(
            task.segment_states(),
            vec![SegmentScanState::Waiting, SegmentScanState::Failed, SegmentScanState::Waiting]
        );

        // Blocked until retried
        assert!(matches!(
            task.next_batch(),
            Err(ScanError::SegmentFailedWithoutCause { segment: 1 })
        ));

        *client.fail_segment.lock().unwrap() = None;
        assert_eq!(task.retry_failed(), 1);
        let batch = task.next_batch().unwrap();
        assert_eq!(batch.len(), 3);
        assert!(task.is_all_segments_complete());
        assert_eq!(task.metrics().snapshot().scan_segment_failures, 1);
    }
}
