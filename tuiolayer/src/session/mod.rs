//! Session management.
//!
//! A [`SessionManager`] bridges one protocol connection onto the consumer
//! tick. The protocol client's thread only ever touches the handoff queue
//! (through [`SessionCallbacks`]); the live-set, direct subscribers and broker
//! forwarding all happen on the tick.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────────────┐
//! │ protocol thread      │        │ consumer tick                    │
//! │                      │        │                                  │
//! │ ProtocolClient       │        │ SessionManager::tick()           │
//! │   └► SessionCallbacks│ push   │   drain ─► LiveSet               │
//! │        filter ───────┼───────►│        ─► direct subscribers     │
//! │                      │ queue  │        ─► Broker (if forwarding) │
//! └──────────────────────┘        └──────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tuiolayer::session::{SessionConfig, SessionManager};
//!
//! let mut session = SessionManager::new(SessionConfig::new(3333), client, metrics)
//!     .with_broker(broker.clone());
//! session.connect(Instant::now())?;
//!
//! loop {
//!     session.tick(Instant::now());
//!     // ...
//! }
//! ```

mod callbacks;
mod config;
mod error;
mod filter;
mod live_set;
mod manager;
mod state;

pub use callbacks::SessionCallbacks;
pub use config::{SessionConfig, DEFAULT_PORT};
pub use error::SessionError;
pub use filter::VariantFilter;
pub use live_set::{LiveSet, LiveSetChange};
pub use manager::{SessionManager, TickReport};
pub use state::ConnectionState;
