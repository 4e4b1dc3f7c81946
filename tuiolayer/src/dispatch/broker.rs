//! Process-scoped fan-out hub.
//!
//! The broker is constructed once by the application and shared by `Rc` with
//! every session manager that forwards to it. It owns:
//!
//! - the ordered receiver registry,
//! - the authoritative list of live containers,
//! - a secondary broadcast channel raised after each receiver fan-out.
//!
//! All methods run on the consumer tick. The broker is `!Send`.

use std::cell::RefCell;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::receiver::{DispatchHold, DispatchOutcome, ReceiverSet, SharedReceiver};
use crate::container::{Container, LifecycleEvent, LifecycleKind, SessionId};

/// Default capacity of the secondary broadcast channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out hub decoupling producers from receivers.
#[derive(Debug)]
pub struct Broker {
    receivers: ReceiverSet,
    live: RefCell<Vec<Container>>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Create a broker with the default broadcast capacity.
    pub fn new() -> Self {
        Self::with_channel_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker whose secondary channel buffers `capacity` events per
    /// lagging subscriber.
    pub fn with_channel_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            receivers: ReceiverSet::new("broker"),
            live: RefCell::new(Vec::new()),
            events,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a receiver. Duplicate registration warns and is ignored.
    pub fn register(&self, receiver: SharedReceiver) -> bool {
        self.receivers.register(receiver)
    }

    /// Unregister a receiver. Unregistering an absent receiver warns and is
    /// ignored.
    pub fn unregister(&self, receiver: &SharedReceiver) -> bool {
        self.receivers.unregister(receiver)
    }

    /// Number of registered receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Queue registry changes until the returned hold is dropped.
    ///
    /// Taken by a session manager before its direct fan-out, so a receiver
    /// registered on the broker from a direct subscriber's callback does not
    /// see the event that is already in flight.
    pub fn hold(&self) -> DispatchHold<'_> {
        self.receivers.hold()
    }

    /// Subscribe to the secondary notification channel.
    ///
    /// Every publish is echoed here after all receivers have run. Subscribers
    /// that fall more than the channel capacity behind observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publish a lifecycle event, routing on its kind.
    ///
    /// The event's original timestamp is preserved on the secondary channel.
    pub fn publish(&self, event: &LifecycleEvent) -> DispatchOutcome {
        self.dispatch(event.kind, event.container, event.received_at)
    }

    /// A container appeared.
    ///
    /// Appends it to the live list, fans out `on_added`, then raises the
    /// secondary channel. A container whose id is already live replaces the
    /// stored copy instead of appearing twice.
    pub fn publish_added(&self, container: Container) -> DispatchOutcome {
        self.dispatch(LifecycleKind::Added, container, Instant::now())
    }

    /// A live container changed.
    ///
    /// The stored copy is replaced in place, keeping its position in the
    /// live list. Updates for ids that are not live are still fanned out but
    /// do not enter the live list: only an add makes a container live here.
    /// A session's own [`LiveSet`](crate::session::LiveSet) differs and
    /// inserts on such an update, since its view is rebuilt from whatever
    /// events got past that session's filter.
    pub fn publish_updated(&self, container: Container) -> DispatchOutcome {
        self.dispatch(LifecycleKind::Updated, container, Instant::now())
    }

    /// A container went away.
    ///
    /// Receivers see `on_removed` while the container is still in the live
    /// list; it is removed afterwards.
    pub fn publish_removed(&self, container: Container) -> DispatchOutcome {
        self.dispatch(LifecycleKind::Removed, container, Instant::now())
    }

    fn dispatch(
        &self,
        kind: LifecycleKind,
        container: Container,
        received_at: Instant,
    ) -> DispatchOutcome {
        trace!(kind = %kind, session_id = container.session_id.value(), "Broker publish");

        let outcome = match kind {
            LifecycleKind::Added => {
                self.upsert(container, true);
                self.receivers.fan_out(kind, &container)
            }
            LifecycleKind::Updated => {
                self.upsert(container, false);
                self.receivers.fan_out(kind, &container)
            }
            LifecycleKind::Removed => {
                let outcome = self.receivers.fan_out(kind, &container);
                self.live
                    .borrow_mut()
                    .retain(|c| c.session_id != container.session_id);
                outcome
            }
        };

        // No subscribers is not an error for the secondary channel.
        let _ = self.events.send(LifecycleEvent {
            kind,
            container,
            received_at,
        });

        outcome
    }

    fn upsert(&self, container: Container, append_if_missing: bool) {
        let mut live = self.live.borrow_mut();
        match live
            .iter_mut()
            .find(|c| c.session_id == container.session_id)
        {
            Some(existing) => *existing = container,
            None if append_if_missing => live.push(container),
            None => {}
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Point-in-time copy of the live list, in order of first appearance.
    pub fn live_containers(&self) -> Vec<Container> {
        self.live.borrow().clone()
    }

    /// Number of live containers.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Whether a container with `id` is live.
    pub fn is_live(&self, id: SessionId) -> bool {
        self.live.borrow().iter().any(|c| c.session_id == id)
    }

    /// Drop every registration and forget every live container.
    pub fn clear(&self) {
        let receivers = self.receivers.len();
        let live = self.live.borrow().len();
        self.receivers.clear();
        self.live.borrow_mut().clear();
        debug!(receivers, live, "Broker cleared");
    }
}
