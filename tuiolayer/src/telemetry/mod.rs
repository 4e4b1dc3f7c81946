//! Bridge telemetry for observability.
//!
//! Lock-free atomic counters shared between producer threads and the
//! consumer tick. The handoff queue is unbounded, so the depth gauge and its
//! high-water mark are the only signal of producer/consumer imbalance.
//!
//! # Architecture
//!
//! ```text
//! Listener callbacks ──┐
//!                      ├──► BridgeMetrics ─────► TelemetrySnapshot ─────► Views
//! Consumer tick ───────┘    (atomic counters)   (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tuiolayer::telemetry::BridgeMetrics;
//!
//! let metrics = Arc::new(BridgeMetrics::new());
//! metrics.event_enqueued();
//! metrics.event_dequeued();
//!
//! let snapshot = metrics.snapshot();
//! println!("backlog: {}", snapshot.backlog());
//! ```

mod metrics;
mod snapshot;

pub use metrics::BridgeMetrics;
pub use snapshot::TelemetrySnapshot;
