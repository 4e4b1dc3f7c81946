//! Scripted protocol client.
//!
//! Replays a fixed sequence of tracking callbacks from its own background
//! thread, the same way a real network client would deliver decoded
//! messages. Used for demos and for exercising the cross-thread bridge
//! without a tracker on the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use super::{ListenerError, ProtocolClient, TrackingListener, TuioTime};
use crate::container::{
    Container, ContainerKind, CursorData, Motion, NormalizedPoint, Payload, SessionId,
};

/// Granularity for pauses so a disconnect is noticed promptly.
const PAUSE_SLICE: Duration = Duration::from_millis(5);

/// One scripted callback.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Add(Container),
    Update(Container),
    Remove(Container),
    Refresh(TuioTime),
    /// Sleep on the listener thread before the next step.
    Pause(Duration),
}

impl ScriptStep {
    /// Script a straight-line cursor swipe.
    ///
    /// Emits one add, `samples` updates interpolated from `from` to `to`
    /// (each followed by a refresh and `frame_interval` pause), and a remove
    /// at the final position.
    pub fn swipe(
        session_id: i64,
        from: (f32, f32),
        to: (f32, f32),
        samples: usize,
        frame_interval: Duration,
    ) -> Vec<ScriptStep> {
        let mut steps = Vec::with_capacity(samples * 3 + 2);
        let mut cursor = Container::cursor(session_id, from.0, from.1);
        steps.push(ScriptStep::Add(cursor));

        let dt = frame_interval.as_secs_f32().max(f32::EPSILON);
        for i in 1..=samples {
            let t = i as f32 / samples as f32;
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            let motion = Motion::new((x - cursor.x()) / dt, (y - cursor.y()) / dt, 0.0);
            cursor = Container {
                session_id: SessionId(session_id),
                position: NormalizedPoint::new(x, y),
                payload: Payload::Cursor(CursorData {
                    cursor_id: 0,
                    motion: Some(motion),
                }),
            };
            steps.push(ScriptStep::Update(cursor));
            steps.push(ScriptStep::Refresh(TuioTime::new(0, (i as i64) * 1000)));
            steps.push(ScriptStep::Pause(frame_interval));
        }

        steps.push(ScriptStep::Remove(cursor));
        steps
    }
}

/// Completion signal for a running script.
#[derive(Debug, Clone, Default)]
pub struct ScriptCompletion {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ScriptCompletion {
    fn mark_finished(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock() = true;
        cvar.notify_all();
    }

    fn reset(&self) {
        *self.inner.0.lock() = false;
    }

    /// Whether the script has run to the end (or was stopped).
    pub fn is_finished(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Block until the script finishes or `timeout` elapses.
    ///
    /// Returns `true` if the script finished.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut finished = lock.lock();
        while !*finished {
            if cvar.wait_until(&mut finished, deadline).timed_out() {
                break;
            }
        }
        *finished
    }
}

/// A protocol client that replays a script on a background thread.
pub struct SimulatedClient {
    script: Vec<ScriptStep>,
    handshake_failure: Option<String>,
    connected: bool,
    stop: Arc<AtomicBool>,
    completion: ScriptCompletion,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedClient {
    /// Create a client that will replay `script` once connected.
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            handshake_failure: None,
            connected: false,
            stop: Arc::new(AtomicBool::new(false)),
            completion: ScriptCompletion::default(),
            worker: None,
        }
    }

    /// Make every connect attempt fail with a handshake error.
    pub fn with_handshake_failure(mut self, reason: impl Into<String>) -> Self {
        self.handshake_failure = Some(reason.into());
        self
    }

    /// Handle that signals when the script has been fully delivered.
    pub fn completion(&self) -> ScriptCompletion {
        self.completion.clone()
    }

    fn deliver(listener: &dyn TrackingListener, step: &ScriptStep, stop: &AtomicBool) {
        match step {
            ScriptStep::Add(c) => match c.kind() {
                ContainerKind::Cursor => listener.add_cursor(*c),
                ContainerKind::Object => listener.add_object(*c),
                ContainerKind::Blob => listener.add_blob(*c),
            },
            ScriptStep::Update(c) => match c.kind() {
                ContainerKind::Cursor => listener.update_cursor(*c),
                ContainerKind::Object => listener.update_object(*c),
                ContainerKind::Blob => listener.update_blob(*c),
            },
            ScriptStep::Remove(c) => match c.kind() {
                ContainerKind::Cursor => listener.remove_cursor(*c),
                ContainerKind::Object => listener.remove_object(*c),
                ContainerKind::Blob => listener.remove_blob(*c),
            },
            ScriptStep::Refresh(time) => listener.refresh(*time),
            ScriptStep::Pause(duration) => {
                let mut remaining = *duration;
                while !remaining.is_zero() && !stop.load(Ordering::Acquire) {
                    let slice = remaining.min(PAUSE_SLICE);
                    std::thread::sleep(slice);
                    remaining = remaining.saturating_sub(slice);
                }
            }
        }
    }
}

impl ProtocolClient for SimulatedClient {
    fn connect(
        &mut self,
        port: u16,
        listener: Arc<dyn TrackingListener>,
    ) -> Result<(), ListenerError> {
        if self.connected {
            return Err(ListenerError::AlreadyConnected);
        }
        if let Some(reason) = &self.handshake_failure {
            return Err(ListenerError::Handshake(reason.clone()));
        }

        self.stop.store(false, Ordering::Release);
        self.completion.reset();

        let script = self.script.clone();
        let stop = Arc::clone(&self.stop);
        let completion = self.completion.clone();

        let worker = std::thread::Builder::new()
            .name(format!("tuio-sim-{}", port))
            .spawn(move || {
                for step in &script {
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                    Self::deliver(listener.as_ref(), step, &stop);
                }
                completion.mark_finished();
            })
            .map_err(|e| ListenerError::Spawn(e.to_string()))?;

        info!(port, steps = self.script.len(), "Simulated client connected");
        self.worker = Some(worker);
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                debug!("Simulated client thread panicked");
            }
        }
        if self.connected {
            info!("Simulated client disconnected");
        }
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

impl Drop for SimulatedClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn record(&self, call: &str, c: Container) {
            self.calls
                .lock()
                .push(format!("{}:{}", call, c.session_id.value()));
        }
    }

    impl TrackingListener for Recorder {
        fn add_cursor(&self, c: Container) {
            self.record("add_cursor", c)
        }
        fn update_cursor(&self, c: Container) {
            self.record("update_cursor", c)
        }
        fn remove_cursor(&self, c: Container) {
            self.record("remove_cursor", c)
        }
        fn add_object(&self, c: Container) {
            self.record("add_object", c)
        }
        fn update_object(&self, c: Container) {
            self.record("update_object", c)
        }
        fn remove_object(&self, c: Container) {
            self.record("remove_object", c)
        }
        fn add_blob(&self, c: Container) {
            self.record("add_blob", c)
        }
        fn update_blob(&self, c: Container) {
            self.record("update_blob", c)
        }
        fn remove_blob(&self, c: Container) {
            self.record("remove_blob", c)
        }
        fn refresh(&self, _time: TuioTime) {
            self.calls.lock().push("refresh".to_string());
        }
    }

    #[test]
    fn test_replays_script_by_variant() {
        let object = Container::object(2, 4, 0.5, 0.5, 0.0);
        let mut client = SimulatedClient::new(vec![
            ScriptStep::Add(Container::cursor(1, 0.1, 0.1)),
            ScriptStep::Add(object),
            ScriptStep::Refresh(TuioTime::new(0, 1)),
            ScriptStep::Remove(object),
        ]);
        let completion = client.completion();
        let recorder = Arc::new(Recorder::default());

        client.connect(3333, recorder.clone()).unwrap();
        assert!(completion.wait(Duration::from_secs(2)));
        assert!(client.is_connected());

        assert_eq!(
            *recorder.calls.lock(),
            vec!["add_cursor:1", "add_object:2", "refresh", "remove_object:2"]
        );

        client.disconnect();
        assert!(!client.is_connected());
    }

    #[test]
    fn test_handshake_failure() {
        let mut client = SimulatedClient::new(vec![]).with_handshake_failure("no tracker");
        let result = client.connect(3333, Arc::new(Recorder::default()));
        assert!(matches!(result, Err(ListenerError::Handshake(_))));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_double_connect_rejected() {
        let mut client = SimulatedClient::new(vec![]);
        client.connect(3333, Arc::new(Recorder::default())).unwrap();
        let second = client.connect(3333, Arc::new(Recorder::default()));
        assert!(matches!(second, Err(ListenerError::AlreadyConnected)));
    }

    #[test]
    fn test_disconnect_is_idempotent_and_safe_before_connect() {
        let mut client = SimulatedClient::new(vec![]);
        client.disconnect();
        client.disconnect();
        assert!(!client.is_connected());
    }

    #[test]
    fn test_disconnect_interrupts_long_pause() {
        let mut client = SimulatedClient::new(vec![
            ScriptStep::Pause(Duration::from_secs(30)),
            ScriptStep::Add(Container::cursor(1, 0.0, 0.0)),
        ]);
        let recorder = Arc::new(Recorder::default());
        client.connect(3333, recorder.clone()).unwrap();

        let started = Instant::now();
        client.disconnect();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(recorder.calls.lock().is_empty());
    }

    #[test]
    fn test_swipe_shape() {
        let steps = ScriptStep::swipe(7, (0.2, 0.8), (0.3, 0.8), 2, Duration::ZERO);
        assert!(matches!(steps.first(), Some(ScriptStep::Add(_))));
        assert!(matches!(steps.last(), Some(ScriptStep::Remove(c)) if (c.x() - 0.3).abs() < 1e-6));
        let updates = steps
            .iter()
            .filter(|s| matches!(s, ScriptStep::Update(_)))
            .count();
        assert_eq!(updates, 2);
    }
}
