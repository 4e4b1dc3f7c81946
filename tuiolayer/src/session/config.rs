//! Session manager configuration.

use std::time::Duration;

use super::filter::VariantFilter;

/// Default protocol port.
pub const DEFAULT_PORT: u16 = 3333;

/// Configuration for one session manager.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Port the protocol client listens on.
    pub port: u16,

    /// Variants discarded at callback time.
    pub filter: VariantFilter,

    /// Publish drained events to the broker as well as to direct subscribers.
    pub forward_to_broker: bool,

    /// Delay between `connect()` and the actual handshake.
    pub startup_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            filter: VariantFilter {
                ignore_cursors: false,
                ignore_objects: true,
                ignore_blobs: false,
            },
            forward_to_broker: true,
            startup_delay: Duration::ZERO,
        }
    }
}

impl SessionConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_filter(mut self, filter: VariantFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_ignore_cursors(mut self, ignore: bool) -> Self {
        self.filter.ignore_cursors = ignore;
        self
    }

    pub fn with_ignore_objects(mut self, ignore: bool) -> Self {
        self.filter.ignore_objects = ignore;
        self
    }

    pub fn with_ignore_blobs(mut self, ignore: bool) -> Self {
        self.filter.ignore_blobs = ignore;
        self
    }

    pub fn with_forward_to_broker(mut self, forward: bool) -> Self {
        self.forward_to_broker = forward;
        self
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.port, 3333);
        assert!(config.filter.ignore_objects);
        assert!(!config.filter.ignore_cursors);
        assert!(config.forward_to_broker);
        assert_eq!(config.startup_delay, Duration::ZERO);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new(4444)
            .with_ignore_objects(false)
            .with_ignore_blobs(true)
            .with_forward_to_broker(false)
            .with_startup_delay(Duration::from_millis(250));

        assert_eq!(config.port, 4444);
        assert!(!config.filter.ignore_objects);
        assert!(config.filter.ignore_blobs);
        assert!(!config.forward_to_broker);
        assert_eq!(config.startup_delay, Duration::from_millis(250));
    }
}
