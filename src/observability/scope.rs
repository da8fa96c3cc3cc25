//! ObservationScope for automatic begin/complete logging
//!
//! - Logs BEGIN event on creation
//! - Logs COMPLETE event with elapsed time on `complete()`
//! - Logs FAILED on `fail()`, INCOMPLETE if dropped without either

use std::time::Instant;

use tracing::{debug, info, warn};

/// A scope that automatically logs begin and complete events
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::new("SCAN_BATCH");
/// // ... do work ...
/// scope.complete(); // logs SCAN_BATCH_COMPLETE
/// // if not completed, logs SCAN_BATCH_INCOMPLETE on drop
/// ```
pub struct ObservationScope {
    name: &'static str,
    completed: bool,
    start: Instant,
}

impl ObservationScope {
    /// Create a new observation scope
    ///
    /// Logs `{name}_BEGIN` immediately.
    pub fn new(name: &'static str) -> Self {
        debug!(event = %format!("{}_BEGIN", name), "scope started");

        Self {
            name,
            completed: false,
            start: Instant::now(),
        }
    }

    /// Milliseconds since the scope began
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Mark the scope as successfully completed
    ///
    /// Logs `{name}_COMPLETE` at INFO level.
    pub fn complete(mut self) {
        self.completed = true;
        info!(
            event = %format!("{}_COMPLETE", self.name),
            elapsed_ms = self.elapsed_ms() as u64,
            "scope completed"
        );
    }

    /// Mark the scope as failed with a reason
    ///
    /// Logs `{name}_FAILED` at WARN level.
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        warn!(
            event = %format!("{}_FAILED", self.name),
            elapsed_ms = self.elapsed_ms() as u64,
            reason,
            "scope failed"
        );
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                event = %format!("{}_INCOMPLETE", self.name),
                "scope dropped without completion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_creation() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
    }

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::new("TEST");
        scope.complete();
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail("something went wrong");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        // Logs a warning but does not panic
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_elapsed() {
        let scope = ObservationScope::new("TEST");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(scope.elapsed_ms() >= 10);
        scope.complete();
    }
}
