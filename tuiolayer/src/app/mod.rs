//! Application bootstrap and tick driver.
//!
//! [`TrackingApp`] is the explicitly constructed owner of the one broker a
//! process uses. Every session manager and mapper it creates holds a
//! reference to that broker; nothing is global.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── TrackingApp ────────────────────────────┐
//! │                                                                     │
//! │  SessionManager :3333 ──┐                                           │
//! │  SessionManager :3334 ──┼──► Broker ──► CoordinateMapper ──► positions
//! │          ...            │      └──► other receivers                 │
//! │                         │      └──► broadcast channel               │
//! │  BridgeMetrics (shared by every session's handoff queue)            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tuiolayer::app::{AppConfig, TrackingApp};
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let mut app = TrackingApp::start(config, Instant::now(), |_| Box::new(client()))?;
//!
//! loop {
//!     let report = app.tick(Instant::now());
//!     // render, sleep, ...
//! }
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::TrackingApp;
pub use config::{AppConfig, DEFAULT_TICK_INTERVAL};
pub use error::AppError;
