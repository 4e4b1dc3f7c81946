//! Producer-side listener attached to a protocol client.
//!
//! Runs on the protocol client's thread. Each callback is filtered, turned
//! into a [`LifecycleEvent`] and pushed to the handoff queue. The live-set
//! and every receiver belong to the consumer tick and are never touched here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use super::filter::VariantFilter;
use crate::container::{Container, ContainerKind, LifecycleEvent, LifecycleKind};
use crate::handoff::HandoffProducer;
use crate::listener::{TrackingListener, TuioTime};
use crate::telemetry::BridgeMetrics;

/// Listener handed to the protocol client on connect.
///
/// One instance per connection attempt. After [`detach`](Self::detach) every
/// callback is discarded, so a client that delivers a late callback after
/// disconnect cannot leak events into the next connection.
#[derive(Debug)]
pub struct SessionCallbacks {
    port: u16,
    producer: HandoffProducer,
    filter: VariantFilter,
    attached: AtomicBool,
    metrics: Arc<BridgeMetrics>,
}

impl SessionCallbacks {
    pub fn new(
        port: u16,
        producer: HandoffProducer,
        filter: VariantFilter,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            port,
            producer,
            filter,
            attached: AtomicBool::new(true),
            metrics,
        }
    }

    /// Stop forwarding callbacks.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn enqueue(&self, kind: LifecycleKind, variant: ContainerKind, container: Container) {
        if !self.is_attached() {
            trace!(
                port = self.port,
                session_id = container.session_id.value(),
                "Callback after detach discarded"
            );
            return;
        }
        if self.filter.ignores(variant) {
            self.metrics.event_filtered();
            return;
        }
        self.producer.push(LifecycleEvent::new(kind, container));
    }
}

impl TrackingListener for SessionCallbacks {
    fn add_cursor(&self, cursor: Container) {
        self.enqueue(LifecycleKind::Added, ContainerKind::Cursor, cursor);
    }

    fn update_cursor(&self, cursor: Container) {
        self.enqueue(LifecycleKind::Updated, ContainerKind::Cursor, cursor);
    }

    fn remove_cursor(&self, cursor: Container) {
        self.enqueue(LifecycleKind::Removed, ContainerKind::Cursor, cursor);
    }

    fn add_object(&self, object: Container) {
        self.enqueue(LifecycleKind::Added, ContainerKind::Object, object);
    }

    fn update_object(&self, object: Container) {
        self.enqueue(LifecycleKind::Updated, ContainerKind::Object, object);
    }

    fn remove_object(&self, object: Container) {
        self.enqueue(LifecycleKind::Removed, ContainerKind::Object, object);
    }

    fn add_blob(&self, blob: Container) {
        self.enqueue(LifecycleKind::Added, ContainerKind::Blob, blob);
    }

    fn update_blob(&self, blob: Container) {
        self.enqueue(LifecycleKind::Updated, ContainerKind::Blob, blob);
    }

    fn remove_blob(&self, blob: Container) {
        self.enqueue(LifecycleKind::Removed, ContainerKind::Blob, blob);
    }

    // Liveness only; nothing is queued.
    fn refresh(&self, _time: TuioTime) {}
}
