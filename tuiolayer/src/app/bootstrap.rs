//! Application bootstrap implementation.
//!
//! `TrackingApp` owns the broker, the session managers and the optional
//! coordinate mapper, and wires them in the right order: broker first, then
//! the mapper registered on it, then one session manager per connection.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::dispatch::{Broker, SharedReceiver};
use crate::listener::ProtocolClient;
use crate::mapper::{CoordinateMapper, MapperConfig};
use crate::session::{SessionConfig, SessionManager, TickReport};
use crate::telemetry::{BridgeMetrics, TelemetrySnapshot};

/// The consumer side of the bridge, driven by a single thread.
///
/// # Example
///
/// ```ignore
/// use tuiolayer::app::{AppConfig, TrackingApp};
///
/// let mut app = TrackingApp::new(AppConfig::empty())?;
/// app.add_session(SessionConfig::new(3333), Box::new(client))?;
/// app.connect_all(Instant::now())?;
///
/// let shutdown = AtomicBool::new(false);
/// app.run_until(&shutdown, |_, report| {
///     // inspect the tick
///     ControlFlow::Continue(())
/// });
///
/// let telemetry = app.shutdown();
/// ```
pub struct TrackingApp {
    broker: Rc<Broker>,
    sessions: Vec<SessionManager>,
    mappers: Vec<Rc<RefCell<CoordinateMapper>>>,
    metrics: Arc<BridgeMetrics>,
    config: AppConfig,
}

impl TrackingApp {
    /// Build the broker and the configured mapper. Sessions are added with
    /// [`add_session`].
    ///
    /// The sessions listed in `config` are not created here because each
    /// needs its own protocol client; see [`start`](Self::start).
    ///
    /// [`add_session`]: Self::add_session
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        if let Some(port) = config.duplicate_port() {
            return Err(AppError::DuplicatePort(port));
        }

        let broker = Rc::new(Broker::with_channel_capacity(
            config.broker_channel_capacity,
        ));

        let mapper_config = config.mapper.clone();
        let mut app = Self {
            broker,
            sessions: Vec::new(),
            mappers: Vec::new(),
            metrics: Arc::new(BridgeMetrics::new()),
            config,
        };
        if let Some(mapper_config) = mapper_config {
            app.add_mapper(&mapper_config);
        }
        Ok(app)
    }

    /// Build the app and connect one session per configured connection.
    ///
    /// `client_for` supplies the protocol client for each session config.
    pub fn start<F>(config: AppConfig, now: Instant, mut client_for: F) -> Result<Self, AppError>
    where
        F: FnMut(&SessionConfig) -> Box<dyn ProtocolClient>,
    {
        let sessions = config.sessions.clone();
        let mut app = Self::new(config)?;
        for session in sessions {
            let client = client_for(&session);
            app.add_session(session, client)?;
        }
        app.connect_all(now)?;
        Ok(app)
    }

    /// Add a disconnected session manager attached to the shared broker.
    ///
    /// A session that does not forward to the broker gets every mapper as a
    /// direct subscriber instead.
    pub fn add_session(
        &mut self,
        config: SessionConfig,
        client: Box<dyn ProtocolClient>,
    ) -> Result<&mut SessionManager, AppError> {
        if self.sessions.iter().any(|s| s.port() == config.port) {
            return Err(AppError::DuplicatePort(config.port));
        }

        let forward = config.forward_to_broker;
        let port = config.port;
        let session = SessionManager::new(config, client, Arc::clone(&self.metrics))
            .with_broker(Rc::clone(&self.broker));

        if !forward {
            for mapper in &self.mappers {
                let receiver: SharedReceiver = mapper.clone();
                session.register(receiver);
            }
        }

        debug!(port, forward, "Session added");
        self.sessions.push(session);
        let index = self.sessions.len() - 1;
        Ok(&mut self.sessions[index])
    }

    /// Add a coordinate mapper.
    ///
    /// It is registered on the broker and on every session that does not
    /// forward to the broker.
    pub fn add_mapper(&mut self, config: &MapperConfig) -> Rc<RefCell<CoordinateMapper>> {
        let mapper = Rc::new(RefCell::new(CoordinateMapper::from_config(config)));
        let receiver: SharedReceiver = mapper.clone();

        self.broker.register(receiver.clone());
        for session in self.sessions.iter().filter(|s| !s.config().forward_to_broker) {
            session.register(receiver.clone());
        }

        info!(surface = %config.surface, "Coordinate mapper registered");
        self.mappers.push(Rc::clone(&mapper));
        mapper
    }

    /// Connect every session that is currently disconnected.
    ///
    /// Stops at the first failure; sessions already connected stay connected.
    pub fn connect_all(&mut self, now: Instant) -> Result<(), AppError> {
        for session in &mut self.sessions {
            if session.state().is_disconnected() {
                session.connect(now)?;
            }
        }
        Ok(())
    }

    /// Run one tick across all sessions, in the order they were added.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        for session in &mut self.sessions {
            report.merge(session.tick(now));
        }
        report
    }

    /// Tick at the configured interval until `shutdown` is set or
    /// `on_tick` breaks.
    ///
    /// Returns the number of ticks run.
    pub fn run_until<F>(&mut self, shutdown: &AtomicBool, mut on_tick: F) -> u64
    where
        F: FnMut(&Self, &TickReport) -> ControlFlow<()>,
    {
        let interval = self.config.tick_interval;
        let mut ticks = 0u64;

        while !shutdown.load(Ordering::Acquire) {
            let started = Instant::now();
            let report = self.tick(started);
            ticks += 1;

            if let Some(e) = &report.connect_error {
                warn!(error = %e, "Delayed connect failed");
            }
            if on_tick(self, &report).is_break() {
                break;
            }

            let elapsed = started.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }

        debug!(ticks, "Tick loop finished");
        ticks
    }

    /// Disconnect every session, newest first, and return final telemetry.
    pub fn shutdown(mut self) -> TelemetrySnapshot {
        info!(sessions = self.sessions.len(), "Shutting down TrackingApp");
        while let Some(session) = self.sessions.pop() {
            let port = session.port();
            drop(session);
            debug!(port, "Session shut down");
        }
        let snapshot = self.metrics.snapshot();
        info!(
            dispatched = snapshot.events_dispatched,
            faults = snapshot.receiver_faults,
            "TrackingApp shutdown complete"
        );
        snapshot
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn broker(&self) -> &Rc<Broker> {
        &self.broker
    }

    /// The first mapper, normally the one from `AppConfig::mapper`.
    pub fn mapper(&self) -> Option<&Rc<RefCell<CoordinateMapper>>> {
        self.mappers.first()
    }

    pub fn mappers(&self) -> &[Rc<RefCell<CoordinateMapper>>] {
        &self.mappers
    }

    pub fn sessions(&self) -> &[SessionManager] {
        &self.sessions
    }

    pub fn session(&self, port: u16) -> Option<&SessionManager> {
        self.sessions.iter().find(|s| s.port() == port)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Point-in-time bridge counters, aggregated over all sessions.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for TrackingApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingApp")
            .field("sessions", &self.sessions)
            .field("receivers", &self.broker.receiver_count())
            .field("mappers", &self.mappers.len())
            .finish()
    }
}
