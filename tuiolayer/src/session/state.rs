//! Connection state machine.

use std::fmt;
use std::time::Instant;

/// Connection state of one session manager.
///
/// ```text
/// Disconnected ──connect()──► Connecting ──handshake──► Connected
///      ▲                          │                         │
///      └──────── failure ─────────┘◄──── disconnect() ──────┘
/// ```
///
/// `Connecting` also covers a configured startup delay: the manager sits in
/// `Connecting` with a deadline until a tick at or after that deadline
/// performs the actual connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,

    /// Connect requested; the handshake runs at `not_before`.
    Connecting { not_before: Instant },

    Connected,
}

impl ConnectionState {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected => "connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    /// Whether a pending connect is due at `now`.
    pub fn connect_due(&self, now: Instant) -> bool {
        matches!(self, ConnectionState::Connecting { not_before } if now >= *not_before)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
