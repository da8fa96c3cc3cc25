//! Typed parallel scans

use std::marker::PhantomData;

use crate::convert::ItemConverter;
use crate::mapping::Document;

use super::errors::{ScanError, ScanResult};
use super::task::ParallelScanTask;

/// Drives a [`ParallelScanTask`] and converts every page to `T`.
///
/// Iterating yields one converted batch at a time and stops after the last
/// batch or the first error.
pub struct ParallelScanner<'c, T> {
    task: ParallelScanTask,
    converter: &'c ItemConverter,
    stopped: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Document> ParallelScanner<'c, T> {
    pub fn new(task: ParallelScanTask, converter: &'c ItemConverter) -> Self {
        Self {
            task,
            converter,
            stopped: false,
            _marker: PhantomData,
        }
    }

    pub fn task(&self) -> &ParallelScanTask {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut ParallelScanTask {
        &mut self.task
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_all_segments_complete()
    }

    /// Scans and converts the next batch, in segment order.
    pub fn next_batch(&mut self) -> ScanResult<Vec<T>> {
        let pages = self.task.next_batch()?;
        let mut objects = Vec::with_capacity(pages.iter().map(|p| p.items.len()).sum());
        for page in &pages {
            for item in &page.items {
                objects.push(self.converter.from_item::<T>(Some(item))?);
            }
        }
        Ok(objects)
    }

    /// Scans every remaining batch.
    pub fn collect_all(mut self) -> ScanResult<Vec<T>> {
        let mut all = Vec::new();
        while !self.is_complete() {
            all.extend(self.next_batch()?);
        }
        Ok(all)
    }
}

impl<T: Document> Iterator for ParallelScanner<'_, T> {
    type Item = Result<Vec<T>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped || self.is_complete() {
            return None;
        }
        let batch = self.next_batch();
        if batch.is_err() {
            self.stopped = true;
        }
        Some(batch)
    }
}
