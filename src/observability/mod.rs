//! Observability subsystem for dynamap
//!
//! This module provides:
//! - Counter metrics for conversions, the field model cache and scans
//! - Scope-based lifecycle logging on top of `tracing`
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on conversion results
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use dynamap::observability::{MetricsRegistry, ObservationScope};
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_items_marshalled();
//!
//! let scope = ObservationScope::new("SCAN_BATCH");
//! // ... do work ...
//! scope.complete();
//! ```

mod metrics;
mod scope;

pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;
