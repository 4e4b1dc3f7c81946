//! Per-connection session manager.
//!
//! Owns one protocol client, the handoff queue fed by that client's thread,
//! the consumer-side live-set and an ordered set of direct subscribers.
//!
//! # Tick
//!
//! ```text
//! tick(now)
//!   ├─ pending startup delay elapsed? → handshake
//!   └─ for each event pushed before the tick began, in queue order:
//!        1. apply to Live-Set
//!        2. fan out to direct subscribers
//!        3. publish to the Broker (if forwarding)
//! ```
//!
//! Registry changes made by any receiver during steps 2 and 3 are held back
//! until the event has reached both stages.
//!
//! Everything except the protocol client's own thread runs on the consumer
//! tick. Subscribers and the broker are `Rc`, so a session manager is pinned
//! to the thread that created it.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use super::callbacks::SessionCallbacks;
use super::config::SessionConfig;
use super::error::SessionError;
use super::live_set::LiveSet;
use super::state::ConnectionState;
use crate::container::{Container, ContainerKind, LifecycleEvent};
use crate::dispatch::{Broker, DispatchOutcome, ReceiverFault, ReceiverSet, SharedReceiver};
use crate::handoff::{handoff_queue, HandoffConsumer, HandoffProducer};
use crate::listener::{ProtocolClient, TrackingListener};
use crate::telemetry::BridgeMetrics;

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Events drained from the handoff queue.
    pub drained: usize,
    /// Receiver faults across every fan-out in this tick.
    pub faults: Vec<ReceiverFault>,
    /// A delayed connect ran during this tick and failed.
    pub connect_error: Option<SessionError>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.connect_error.is_none()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: TickReport) {
        self.drained += other.drained;
        self.faults.extend(other.faults);
        if self.connect_error.is_none() {
            self.connect_error = other.connect_error;
        }
    }
}

/// Bridges one protocol connection onto the consumer tick.
pub struct SessionManager {
    config: SessionConfig,
    client: Box<dyn ProtocolClient>,
    state: ConnectionState,
    callbacks: Option<Arc<SessionCallbacks>>,
    producer: HandoffProducer,
    consumer: HandoffConsumer,
    live: LiveSet,
    subscribers: ReceiverSet,
    broker: Option<Rc<Broker>>,
    metrics: Arc<BridgeMetrics>,
}

impl SessionManager {
    /// Create a disconnected session manager.
    pub fn new(
        config: SessionConfig,
        client: Box<dyn ProtocolClient>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        let (producer, consumer) = handoff_queue(Arc::clone(&metrics));
        Self {
            config,
            client,
            state: ConnectionState::Disconnected,
            callbacks: None,
            producer,
            consumer,
            live: LiveSet::new(),
            subscribers: ReceiverSet::new("session"),
            broker: None,
            metrics,
        }
    }

    /// Attach the broker that drained events are forwarded to.
    ///
    /// Forwarding still depends on `forward_to_broker` in the config.
    pub fn with_broker(mut self, broker: Rc<Broker>) -> Self {
        self.broker = Some(broker);
        self
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Start connecting.
    ///
    /// With no startup delay the handshake runs immediately. Otherwise the
    /// manager enters `Connecting` and the first tick at or after
    /// `now + startup_delay` performs it.
    pub fn connect(&mut self, now: Instant) -> Result<(), SessionError> {
        if !self.state.is_disconnected() {
            return Err(SessionError::AlreadyActive {
                port: self.config.port,
                state: self.state.name(),
            });
        }

        if self.config.startup_delay.is_zero() {
            return self.open_connection();
        }

        let not_before = now + self.config.startup_delay;
        self.state = ConnectionState::Connecting { not_before };
        info!(
            port = self.config.port,
            delay_ms = self.config.startup_delay.as_millis() as u64,
            "Session connect scheduled"
        );
        Ok(())
    }

    fn open_connection(&mut self) -> Result<(), SessionError> {
        let port = self.config.port;
        self.state = ConnectionState::Connecting {
            not_before: Instant::now(),
        };

        let callbacks = Arc::new(SessionCallbacks::new(
            port,
            self.producer.clone(),
            self.config.filter,
            Arc::clone(&self.metrics),
        ));
        let listener: Arc<dyn TrackingListener> = callbacks.clone();

        match self.client.connect(port, listener) {
            Ok(()) => {
                self.callbacks = Some(callbacks);
                self.state = ConnectionState::Connected;
                info!(port, client = self.client.name(), "Session connected");
                Ok(())
            }
            Err(source) => {
                callbacks.detach();
                self.state = ConnectionState::Disconnected;
                warn!(port, error = %source, "Session connect failed");
                Err(SessionError::Connect { port, source })
            }
        }
    }

    /// Detach from the protocol client and release the connection.
    ///
    /// Safe to call repeatedly and before any successful connect. Events
    /// already queued are kept and dispatched by later ticks.
    pub fn disconnect(&mut self) {
        if let Some(callbacks) = self.callbacks.take() {
            callbacks.detach();
        }
        self.client.disconnect();

        if !self.state.is_disconnected() {
            info!(
                port = self.config.port,
                pending = self.consumer.pending(),
                "Session disconnected"
            );
        }
        self.state = ConnectionState::Disconnected;
    }

    // =========================================================================
    // Consumer tick
    // =========================================================================

    /// Run one consumer tick.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        if self.state.connect_due(now) {
            if let Err(e) = self.open_connection() {
                report.connect_error = Some(e);
            }
        }

        let events: Vec<LifecycleEvent> = self.consumer.drain_pending().collect();
        report.drained = events.len();

        for event in &events {
            let outcome = self.dispatch(event);
            self.metrics.event_dispatched();
            self.metrics.receiver_faults(outcome.faults.len());
            report.faults.extend(outcome.faults);
        }

        if report.drained > 0 {
            trace!(port = self.config.port, drained = report.drained, "Session tick");
        }
        self.metrics.tick_completed();
        report
    }

    fn dispatch(&mut self, event: &LifecycleEvent) -> DispatchOutcome {
        let broker = if self.config.forward_to_broker {
            self.broker.clone()
        } else {
            None
        };
        // Both registries keep the membership this event started with.
        let _broker_hold = broker.as_ref().map(|b| b.hold());
        let _direct_hold = self.subscribers.hold();

        self.live.apply(event);

        let mut outcome = self.subscribers.fan_out(event.kind, &event.container);
        if let Some(broker) = &broker {
            outcome.absorb(broker.publish(event));
        }

        outcome
    }

    // =========================================================================
    // Direct subscribers
    // =========================================================================

    /// Subscribe directly to this session's events.
    pub fn register(&self, receiver: SharedReceiver) -> bool {
        self.subscribers.register(receiver)
    }

    pub fn unregister(&self, receiver: &SharedReceiver) -> bool {
        self.subscribers.unregister(receiver)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the live cursors.
    pub fn all_live_cursors(&self) -> Vec<Container> {
        self.live.of_kind(ContainerKind::Cursor)
    }

    /// Copy of the live objects.
    pub fn all_live_objects(&self) -> Vec<Container> {
        self.live.of_kind(ContainerKind::Object)
    }

    /// Copy of the live blobs.
    pub fn all_live_blobs(&self) -> Vec<Container> {
        self.live.of_kind(ContainerKind::Blob)
    }

    pub fn live_set(&self) -> &LiveSet {
        &self.live
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Events waiting for the next tick.
    pub fn pending_events(&self) -> usize {
        self.consumer.pending()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.disconnect();
        let discarded = self.consumer.discard_all();
        if discarded > 0 {
            debug!(
                port = self.config.port,
                discarded, "Session dropped with queued events, discarding"
            );
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("port", &self.config.port)
            .field("client", &self.client.name())
            .field("state", &self.state)
            .field("live", &self.live.len())
            .field("pending", &self.consumer.pending())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
