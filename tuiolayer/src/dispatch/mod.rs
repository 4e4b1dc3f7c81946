//! Receiver fan-out.
//!
//! This module contains the subscriber side of the bridge: the
//! [`ContainerReceiver`] interface, the ordered [`ReceiverSet`] used by both
//! the broker and session managers, and the process-scoped [`Broker`].
//!
//! # Architecture
//!
//! ```text
//! SessionManager::tick()
//!       │ apply to Live-Set
//!       ├──────────────► own ReceiverSet ──► receivers (direct mode)
//!       │ forward?
//!       ▼
//! Broker::publish()
//!       ├── live list (append / replace / erase)
//!       ├── ReceiverSet::fan_out ──► receiver 1, receiver 2, ...
//!       └── broadcast::Sender ──► secondary subscribers
//! ```
//!
//! Fan-out is synchronous: every receiver has observed the event before the
//! publish call returns. Faults are isolated per receiver and reported in the
//! returned [`DispatchOutcome`]. A session manager holds both its own set and
//! the broker's for the whole of one event, so registry changes made by any
//! receiver take effect from the next event on.

mod broker;
mod receiver;

pub use broker::{Broker, DEFAULT_CHANNEL_CAPACITY};
pub use receiver::{
    shared, ContainerReceiver, DispatchHold, DispatchOutcome, ReceiverError, ReceiverFault,
    ReceiverSet, SharedReceiver,
};
