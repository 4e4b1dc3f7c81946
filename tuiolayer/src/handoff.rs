//! Concurrent handoff queue.
//!
//! Carries [`LifecycleEvent`]s from protocol listener threads to the single
//! consumer tick. The queue is multi-producer, single-consumer and unbounded:
//!
//! - [`HandoffProducer::push`] never blocks and may be called from any number
//!   of threads (producers are `Clone`).
//! - [`HandoffConsumer::try_pop`] never waits; it returns `None` as soon as
//!   the queue is empty.
//!
//! Ordering is FIFO per producer. Across producers the order is whatever
//! order the pushes arrived at the queue.
//!
//! No upper bound is enforced. A producer that outruns the consumer grows the
//! queue without limit; [`BridgeMetrics`] exposes the depth and high-water
//! mark so the imbalance is at least visible.
//!
//! # Example
//!
//! ```ignore
//! use tuiolayer::handoff::handoff_queue;
//!
//! let (producer, mut consumer) = handoff_queue(metrics);
//!
//! // Listener thread (fire-and-forget)
//! std::thread::spawn(move || producer.push(event));
//!
//! // Consumer tick
//! for event in consumer.drain_pending() {
//!     apply(event);
//! }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::container::LifecycleEvent;
use crate::telemetry::BridgeMetrics;

/// Create a connected producer/consumer pair.
pub fn handoff_queue(metrics: Arc<BridgeMetrics>) -> (HandoffProducer, HandoffConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));

    let producer = HandoffProducer {
        tx,
        pending: Arc::clone(&pending),
        metrics: Arc::clone(&metrics),
    };
    let consumer = HandoffConsumer {
        rx,
        pending,
        metrics,
    };
    (producer, consumer)
}

/// Sending half of the handoff queue. Cheap to clone, one per producer thread.
#[derive(Debug, Clone)]
pub struct HandoffProducer {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
    pending: Arc<AtomicUsize>,
    metrics: Arc<BridgeMetrics>,
}

impl HandoffProducer {
    /// Push an event. Never blocks.
    ///
    /// Returns `false` if the consumer has been dropped, in which case the
    /// event is discarded.
    pub fn push(&self, event: LifecycleEvent) -> bool {
        // Count before sending so the consumer never observes an event the
        // counters do not yet include.
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.metrics.event_enqueued();

        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                self.metrics.enqueue_rejected();
                trace!(
                    session_id = event.session_id().value(),
                    "Handoff consumer gone, event discarded"
                );
                false
            }
        }
    }

    /// Whether the consumer side is still alive.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Receiving half of the handoff queue. Owned by the consumer tick.
#[derive(Debug)]
pub struct HandoffConsumer {
    rx: mpsc::UnboundedReceiver<LifecycleEvent>,
    pending: Arc<AtomicUsize>,
    metrics: Arc<BridgeMetrics>,
}

impl HandoffConsumer {
    /// Pop the next event if one is available.
    pub fn try_pop(&mut self) -> Option<LifecycleEvent> {
        // Empty and Disconnected are the same thing to the tick.
        let event = self.rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.metrics.event_dequeued();
        Some(event)
    }

    /// Number of events pushed and not yet popped.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Drain the events that were pending when this call was made.
    ///
    /// Events pushed while the drain is running may or may not be yielded;
    /// the next tick picks them up. This keeps one tick bounded even when a
    /// producer never goes quiet.
    pub fn drain_pending(&mut self) -> DrainPending<'_> {
        let budget = self.pending();
        DrainPending {
            consumer: self,
            budget,
        }
    }

    /// Discard everything currently queued. Returns the number discarded.
    pub fn discard_all(&mut self) -> usize {
        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            discarded += 1;
        }
        self.metrics.events_discarded(discarded as u64);
        discarded
    }
}

/// Iterator returned by [`HandoffConsumer::drain_pending`].
pub struct DrainPending<'a> {
    consumer: &'a mut HandoffConsumer,
    budget: usize,
}

impl Iterator for DrainPending<'_> {
    type Item = LifecycleEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        self.consumer.try_pop()
    }
}
