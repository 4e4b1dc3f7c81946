//! Protocol listener collaborator interface.
//!
//! Wire decoding is not part of this crate. A protocol client decodes the
//! tracking messages on its own network thread and reports the result through
//! the fixed [`TrackingListener`] callback interface: add/update/remove for
//! each of the three container variants, plus a periodic refresh tick.
//!
//! The [`ProtocolClient`] trait is the connection side of the same
//! collaborator: the session manager asks it to connect on a port with a
//! listener attached, and later to detach and disconnect.
//!
//! # Threading
//!
//! Callbacks arrive on an unspecified thread. Implementations of
//! [`TrackingListener`] must return quickly and must never block.

mod simulated;

pub use simulated::{ScriptCompletion, ScriptStep, SimulatedClient};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::container::Container;

/// Protocol frame time carried by refresh callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TuioTime {
    pub seconds: i64,
    pub micros: i64,
}

impl TuioTime {
    /// Create a new frame time.
    pub fn new(seconds: i64, micros: i64) -> Self {
        Self { seconds, micros }
    }

    /// Total microseconds.
    pub fn total_micros(&self) -> i64 {
        self.seconds * 1_000_000 + self.micros
    }
}

impl fmt::Display for TuioTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}s", self.seconds, self.micros)
    }
}

/// Callback interface implemented by anything that consumes decoded
/// tracking messages.
///
/// Every container passed to a cursor callback carries a cursor payload, and
/// likewise for objects and blobs; implementations may rely on this.
pub trait TrackingListener: Send + Sync {
    fn add_cursor(&self, cursor: Container);
    fn update_cursor(&self, cursor: Container);
    fn remove_cursor(&self, cursor: Container);

    fn add_object(&self, object: Container);
    fn update_object(&self, object: Container);
    fn remove_object(&self, object: Container);

    fn add_blob(&self, blob: Container);
    fn update_blob(&self, blob: Container);
    fn remove_blob(&self, blob: Container);

    /// End-of-frame liveness signal. Carries no container.
    fn refresh(&self, time: TuioTime);
}

/// Errors raised by protocol clients.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listening socket could not be bound.
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The handshake with the tracker did not complete.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The client is already connected.
    #[error("Client already connected")]
    AlreadyConnected,

    /// The listener thread could not be started.
    #[error("Failed to spawn listener thread: {0}")]
    Spawn(String),
}

/// Connection side of a protocol client.
///
/// `connect` attaches the listener and starts delivering callbacks on the
/// client's own thread once the handshake completes. `disconnect` detaches
/// the listener and releases the connection; it must be safe to call more
/// than once and on a client that never connected.
pub trait ProtocolClient: Send {
    /// Connect on `port` and deliver callbacks to `listener`.
    fn connect(&mut self, port: u16, listener: Arc<dyn TrackingListener>)
        -> Result<(), ListenerError>;

    /// Detach the listener and release the connection.
    fn disconnect(&mut self);

    /// Whether the client currently holds a live connection.
    fn is_connected(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &str {
        "protocol-client"
    }
}
