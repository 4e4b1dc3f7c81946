//! Application configuration for `TrackingApp`.

use std::time::Duration;

use crate::config::ConfigFile;
use crate::dispatch::DEFAULT_CHANNEL_CAPACITY;
use crate::mapper::MapperConfig;
use crate::session::SessionConfig;

/// Default consumer tick interval (roughly 60 ticks per second).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Top-level configuration passed to `TrackingApp::new()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// One entry per protocol connection. Ports must be distinct.
    pub sessions: Vec<SessionConfig>,

    /// Coordinate mapper registered on the broker. `None` runs without one.
    pub mapper: Option<MapperConfig>,

    /// Capacity of the broker's secondary broadcast channel.
    pub broker_channel_capacity: usize,

    /// Pause between ticks in `TrackingApp::run_until`.
    pub tick_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sessions: vec![SessionConfig::default()],
            mapper: Some(MapperConfig::default()),
            broker_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl AppConfig {
    /// An app with no sessions and no mapper.
    pub fn empty() -> Self {
        Self {
            sessions: Vec::new(),
            mapper: None,
            ..Default::default()
        }
    }

    /// Build the app configuration from the config file.
    ///
    /// The file describes a single connection and a single mapper.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            sessions: vec![config.session_config()],
            mapper: Some(config.mapper_config()),
            ..Default::default()
        }
    }

    /// Add a session.
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn with_mapper(mut self, mapper: MapperConfig) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn without_mapper(mut self) -> Self {
        self.mapper = None;
        self
    }

    pub fn with_broker_channel_capacity(mut self, capacity: usize) -> Self {
        self.broker_channel_capacity = capacity;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// First port that appears more than once, if any.
    pub fn duplicate_port(&self) -> Option<u16> {
        self.sessions
            .iter()
            .enumerate()
            .find(|(i, s)| self.sessions[..*i].iter().any(|o| o.port == s.port))
            .map(|(_, s)| s.port)
    }
}
