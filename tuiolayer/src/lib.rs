//! TuioLayer - bridge multitouch tracking events into a frame loop
//!
//! A protocol client decodes cursor, object and blob messages on its own
//! thread. TuioLayer hands those events across to a single consumer thread,
//! applies them to a per-session live set once per tick, and fans them out
//! to any number of receivers through an explicitly shared broker. A
//! coordinate mapper built on top projects normalized positions onto a
//! plane or screen.
//!
//! ```text
//! listener thread            │ consumer thread (tick)
//!                            │
//! ProtocolClient ──callbacks─┼─► HandoffQueue ──► SessionManager ──► Broker ──► receivers
//!   (filter applied here)    │                     │  live set         │
//!                            │                     └► direct subs      └► CoordinateMapper
//! ```

pub mod app;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod handoff;
pub mod listener;
pub mod logging;
pub mod mapper;
pub mod session;
pub mod telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
