//! Lock-free counters for the event bridge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::TelemetrySnapshot;

/// Bridge counters shared between producer threads and the consumer tick.
///
/// Producer-side counters (`enqueued`, `filtered`, queue depth) are written
/// from listener threads; consumer-side counters are written from the tick.
/// All updates use relaxed atomics: the values are for observation only and
/// never gate behaviour.
#[derive(Debug)]
pub struct BridgeMetrics {
    events_enqueued: AtomicU64,
    events_filtered: AtomicU64,
    events_dequeued: AtomicU64,
    events_discarded: AtomicU64,
    events_dispatched: AtomicU64,
    receiver_faults: AtomicU64,
    queue_depth: AtomicU64,
    queue_high_water: AtomicU64,
    ticks: AtomicU64,
    started: Instant,
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeMetrics {
    /// Create a zeroed metrics block.
    pub fn new() -> Self {
        Self {
            events_enqueued: AtomicU64::new(0),
            events_filtered: AtomicU64::new(0),
            events_dequeued: AtomicU64::new(0),
            events_discarded: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
            receiver_faults: AtomicU64::new(0),
            queue_depth: AtomicU64::new(0),
            queue_high_water: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// An event is about to enter the handoff queue.
    ///
    /// Must be recorded before the event becomes visible to the consumer, so
    /// the matching [`event_dequeued`](Self::event_dequeued) always follows it.
    pub fn event_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
        let depth = self.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.queue_high_water.fetch_max(depth, Ordering::Relaxed);
    }

    /// An event counted by [`event_enqueued`](Self::event_enqueued) never
    /// made it into the queue.
    pub fn enqueue_rejected(&self) {
        self.events_enqueued.fetch_sub(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// An event left the handoff queue.
    pub fn event_dequeued(&self) {
        self.events_dequeued.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Queued events were thrown away on lossy teardown.
    pub fn events_discarded(&self, count: u64) {
        if count > 0 {
            self.events_discarded.fetch_add(count, Ordering::Relaxed);
            self.queue_depth.fetch_sub(count, Ordering::Relaxed);
        }
    }

    /// An event was dropped at callback time by a variant filter.
    pub fn event_filtered(&self) {
        self.events_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// An event was applied and fanned out on the consumer tick.
    pub fn event_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Receivers faulted during a fan-out.
    pub fn receiver_faults(&self, count: usize) {
        if count > 0 {
            self.receiver_faults.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// A consumer tick completed.
    pub fn tick_completed(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Current queue depth as seen by the counters.
    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_filtered: self.events_filtered.load(Ordering::Relaxed),
            events_dequeued: self.events_dequeued.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            receiver_faults: self.receiver_faults.load(Ordering::Relaxed),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            queue_high_water: self.queue_high_water.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            uptime: self.started.elapsed(),
        }
    }
}
