//! Integration tests for the tracking bridge.
//!
//! These tests drive the full path with real producer threads:
//! - protocol callbacks → handoff queue → session tick → broker fan-out
//! - broker → coordinate mapper → position events
//! - variant filtering, fault isolation and connection lifecycle
//!
//! Run with: `cargo test --test bridge_integration`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use tuiolayer::app::{AppConfig, TrackingApp};
use tuiolayer::container::{Container, LifecycleKind, SessionId};
use tuiolayer::dispatch::{shared, Broker, ContainerReceiver, ReceiverError, SharedReceiver};
use tuiolayer::listener::{
    ListenerError, ProtocolClient, ScriptStep, SimulatedClient, TrackingListener,
};
use tuiolayer::mapper::{MapperConfig, PositionEvent};
use tuiolayer::session::{ConnectionState, SessionConfig, SessionManager};
use tuiolayer::telemetry::BridgeMetrics;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Helper Types
// ============================================================================

type Log = Rc<RefCell<Vec<(LifecycleKind, i64, f32)>>>;

/// Records every callback it receives.
struct Recorder {
    log: Log,
}

impl Recorder {
    fn new() -> (Self, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        (Self { log: log.clone() }, log)
    }

    fn push(&self, kind: LifecycleKind, c: &Container) {
        self.log.borrow_mut().push((kind, c.session_id.value(), c.x()));
    }
}

impl ContainerReceiver for Recorder {
    fn on_added(&mut self, c: &Container) -> Result<(), ReceiverError> {
        self.push(LifecycleKind::Added, c);
        Ok(())
    }

    fn on_updated(&mut self, c: &Container) -> Result<(), ReceiverError> {
        self.push(LifecycleKind::Updated, c);
        Ok(())
    }

    fn on_removed(&mut self, c: &Container) -> Result<(), ReceiverError> {
        self.push(LifecycleKind::Removed, c);
        Ok(())
    }
}

/// A protocol client that hands its listener to the test so test threads can
/// play the part of the network thread.
#[derive(Clone, Default)]
struct HandleClient {
    listener: Arc<Mutex<Option<Arc<dyn TrackingListener>>>>,
}

impl HandleClient {
    fn listener(&self) -> Arc<dyn TrackingListener> {
        self.listener
            .lock()
            .clone()
            .expect("client is not connected")
    }
}

impl ProtocolClient for HandleClient {
    fn connect(
        &mut self,
        _port: u16,
        listener: Arc<dyn TrackingListener>,
    ) -> Result<(), ListenerError> {
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.listener.lock().take();
    }

    fn is_connected(&self) -> bool {
        self.listener.lock().is_some()
    }
}

fn kinds(log: &Log) -> Vec<(LifecycleKind, i64)> {
    log.borrow().iter().map(|(k, id, _)| (*k, *id)).collect()
}

fn register(broker: &Broker, receiver: impl ContainerReceiver + 'static) {
    let receiver: SharedReceiver = shared(receiver);
    assert!(broker.register(receiver));
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Add → update → remove for one cursor, delivered in a single tick.
#[test]
fn test_end_to_end_single_cursor() {
    let client = SimulatedClient::new(vec![
        ScriptStep::Add(Container::cursor(7, 0.2, 0.8)),
        ScriptStep::Update(Container::cursor(7, 0.3, 0.8)),
        ScriptStep::Remove(Container::cursor(7, 0.3, 0.8)),
    ]);
    let completion = client.completion();

    let mut app = TrackingApp::new(AppConfig::empty().with_mapper(MapperConfig::plane(1.0, 1.0)))
        .unwrap();
    let (first, first_log) = Recorder::new();
    let (second, second_log) = Recorder::new();
    register(app.broker(), first);
    register(app.broker(), second);

    let mut positions = app.mapper().unwrap().borrow().subscribe();

    app.add_session(SessionConfig::new(5000), Box::new(client))
        .unwrap();
    app.connect_all(Instant::now()).unwrap();
    assert!(completion.wait(WAIT));

    let report = app.tick(Instant::now());
    assert!(report.is_clean());
    assert_eq!(report.drained, 3);

    assert_eq!(app.broker().live_count(), 0);
    assert!(app.mapper().unwrap().borrow().position(SessionId(7)).is_none());

    let expected = vec![
        (LifecycleKind::Added, 7),
        (LifecycleKind::Updated, 7),
        (LifecycleKind::Removed, 7),
    ];
    assert_eq!(kinds(&first_log), expected);
    assert_eq!(kinds(&second_log), expected);

    assert!(matches!(positions.try_recv(), Ok(PositionEvent::Added { .. })));
    assert!(matches!(positions.try_recv(), Ok(PositionEvent::Moved { .. })));
    assert!(matches!(positions.try_recv(), Ok(PositionEvent::Removed { .. })));
    assert!(positions.try_recv().is_err());

    let telemetry = app.shutdown();
    assert_eq!(telemetry.events_enqueued, 3);
    assert_eq!(telemetry.events_dispatched, 3);
    assert_eq!(telemetry.queue_depth, 0);
}

/// Ignored variants never reach the queue, for any of their event kinds.
#[test]
fn test_ignored_objects_are_filtered_at_callback_time() {
    let object = Container::object(1, 4, 0.5, 0.5, 0.0);
    let client = SimulatedClient::new(vec![
        ScriptStep::Add(object),
        ScriptStep::Add(Container::cursor(2, 0.1, 0.1)),
        ScriptStep::Update(object.moved_to(0.6, 0.6)),
        ScriptStep::Remove(object),
    ]);
    let completion = client.completion();

    let metrics = Arc::new(BridgeMetrics::new());
    let broker = Rc::new(Broker::new());
    let (recorder, log) = Recorder::new();
    register(&broker, recorder);

    // Default session config ignores objects.
    let mut session = SessionManager::new(
        SessionConfig::new(5001),
        Box::new(client),
        Arc::clone(&metrics),
    )
    .with_broker(Rc::clone(&broker));
    session.connect(Instant::now()).unwrap();
    assert!(completion.wait(WAIT));

    let report = session.tick(Instant::now());
    assert_eq!(report.drained, 1);
    assert_eq!(kinds(&log), vec![(LifecycleKind::Added, 2)]);
    assert!(session.all_live_objects().is_empty());
    assert_eq!(session.all_live_cursors().len(), 1);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_filtered, 3);
    assert_eq!(snapshot.events_enqueued, 1);
}

/// Each producer's events keep their order end to end, even with several
/// producer threads pushing concurrently.
#[test]
fn test_per_producer_fifo_across_threads() {
    const PRODUCERS: i64 = 4;
    const UPDATES: usize = 200;

    let client = HandleClient::default();
    let broker = Rc::new(Broker::new());
    let (recorder, log) = Recorder::new();
    register(&broker, recorder);

    let mut session = SessionManager::new(
        SessionConfig::new(5002),
        Box::new(client.clone()),
        Arc::new(BridgeMetrics::new()),
    )
    .with_broker(Rc::clone(&broker));
    session.connect(Instant::now()).unwrap();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let listener = client.listener();
            thread::spawn(move || {
                let mut cursor = Container::cursor(id, 0.0, 0.5);
                listener.add_cursor(cursor);
                for step in 1..=UPDATES {
                    cursor = cursor.moved_to(step as f32 / UPDATES as f32, 0.5);
                    listener.update_cursor(cursor);
                }
                listener.remove_cursor(cursor);
            })
        })
        .collect();

    // Tick while the producers are running; nothing may be lost or reordered.
    let mut drained = 0;
    while handles.iter().any(|h| !h.is_finished()) {
        drained += session.tick(Instant::now()).drained;
    }
    for handle in handles {
        handle.join().unwrap();
    }
    drained += session.tick(Instant::now()).drained;

    let total = PRODUCERS as usize * (UPDATES + 2);
    assert_eq!(drained, total);
    assert_eq!(log.borrow().len(), total);

    for id in 0..PRODUCERS {
        let events: Vec<_> = log
            .borrow()
            .iter()
            .filter(|(_, sid, _)| *sid == id)
            .copied()
            .collect();
        assert_eq!(events.len(), UPDATES + 2);
        assert_eq!(events.first().map(|e| e.0), Some(LifecycleKind::Added));
        assert_eq!(events.last().map(|e| e.0), Some(LifecycleKind::Removed));

        let xs: Vec<f32> = events[1..=UPDATES].iter().map(|e| e.2).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "session {} reordered", id);
    }

    assert_eq!(broker.live_count(), 0);
    assert!(session.live_set().is_empty());
}

/// A failing or panicking receiver does not stop delivery to the others.
#[test]
fn test_receiver_faults_are_isolated() {
    struct Failing;
    impl ContainerReceiver for Failing {
        fn on_added(&mut self, _: &Container) -> Result<(), ReceiverError> {
            Err(ReceiverError::failed("no room"))
        }
        fn on_updated(&mut self, _: &Container) -> Result<(), ReceiverError> {
            Ok(())
        }
        fn on_removed(&mut self, _: &Container) -> Result<(), ReceiverError> {
            Ok(())
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;
    impl ContainerReceiver for Panicking {
        fn on_added(&mut self, _: &Container) -> Result<(), ReceiverError> {
            Ok(())
        }
        fn on_updated(&mut self, _: &Container) -> Result<(), ReceiverError> {
            panic!("bad frame");
        }
        fn on_removed(&mut self, _: &Container) -> Result<(), ReceiverError> {
            Ok(())
        }
        fn name(&self) -> &str {
            "panicking"
        }
    }

    let client = SimulatedClient::new(vec![
        ScriptStep::Add(Container::cursor(9, 0.1, 0.1)),
        ScriptStep::Update(Container::cursor(9, 0.2, 0.1)),
        ScriptStep::Remove(Container::cursor(9, 0.2, 0.1)),
    ]);
    let completion = client.completion();

    let metrics = Arc::new(BridgeMetrics::new());
    let broker = Rc::new(Broker::new());
    let (before, before_log) = Recorder::new();
    let (after, after_log) = Recorder::new();
    register(&broker, before);
    register(&broker, Failing);
    register(&broker, Panicking);
    register(&broker, after);

    let mut session = SessionManager::new(
        SessionConfig::new(5003),
        Box::new(client),
        Arc::clone(&metrics),
    )
    .with_broker(Rc::clone(&broker));
    session.connect(Instant::now()).unwrap();
    assert!(completion.wait(WAIT));

    let report = session.tick(Instant::now());
    assert_eq!(report.faults.len(), 2);
    assert_eq!(report.faults[0].receiver, "failing");
    assert_eq!(report.faults[1].receiver, "panicking");
    assert!(matches!(report.faults[1].error, ReceiverError::Panicked(_)));

    assert_eq!(before_log.borrow().len(), 3);
    assert_eq!(after_log.borrow().len(), 3);
    assert_eq!(broker.live_count(), 0);
    assert_eq!(metrics.snapshot().receiver_faults, 2);
}

/// A delayed connect happens on the first tick after the delay.
#[test]
fn test_startup_delay_defers_handshake() {
    let client = HandleClient::default();
    let mut session = SessionManager::new(
        SessionConfig::new(5004).with_startup_delay(Duration::from_millis(50)),
        Box::new(client.clone()),
        Arc::new(BridgeMetrics::new()),
    );

    let start = Instant::now();
    session.connect(start).unwrap();
    assert!(matches!(session.state(), ConnectionState::Connecting { .. }));
    assert!(!client.is_connected());

    session.tick(start + Duration::from_millis(10));
    assert!(!client.is_connected());

    let report = session.tick(start + Duration::from_millis(60));
    assert!(report.connect_error.is_none());
    assert!(session.state().is_connected());
    assert!(client.is_connected());
}

/// Callbacks arriving after disconnect are dropped; queued events survive.
#[test]
fn test_disconnect_detaches_listener() {
    let client = HandleClient::default();
    let broker = Rc::new(Broker::new());
    let mut session = SessionManager::new(
        SessionConfig::new(5005),
        Box::new(client.clone()),
        Arc::new(BridgeMetrics::new()),
    )
    .with_broker(Rc::clone(&broker));
    session.connect(Instant::now()).unwrap();

    let listener = client.listener();
    listener.add_cursor(Container::cursor(1, 0.5, 0.5));
    session.disconnect();
    session.disconnect();

    listener.add_cursor(Container::cursor(2, 0.5, 0.5));
    assert_eq!(session.pending_events(), 1);

    session.tick(Instant::now());
    assert!(broker.is_live(SessionId(1)));
    assert!(!broker.is_live(SessionId(2)));
}
