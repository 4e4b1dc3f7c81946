//! Session manager errors.

use thiserror::Error;

use crate::listener::ListenerError;

/// Errors surfaced by a session manager.
///
/// None of these are fatal; the manager stays `Disconnected` and `connect`
/// may be retried.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The protocol client failed to connect.
    #[error("Failed to connect on port {port}: {source}")]
    Connect {
        port: u16,
        #[source]
        source: ListenerError,
    },

    /// `connect` was called while a connection is pending or live.
    #[error("Session on port {port} is already {state}")]
    AlreadyActive { port: u16, state: &'static str },
}

impl SessionError {
    /// Port of the session that raised this error.
    pub fn port(&self) -> u16 {
        match self {
            SessionError::Connect { port, .. } | SessionError::AlreadyActive { port, .. } => *port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_port_and_cause() {
        let err = SessionError::Connect {
            port: 3333,
            source: ListenerError::Handshake("timed out".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("3333"));
        assert!(msg.contains("timed out"));
        assert_eq!(err.port(), 3333);
    }

    #[test]
    fn test_already_active() {
        let err = SessionError::AlreadyActive {
            port: 3334,
            state: "connected",
        };
        assert_eq!(err.to_string(), "Session on port 3334 is already connected");
    }
}
