//! Container model.
//!
//! Value and identity types for tracked entities (cursors, objects, blobs)
//! and the lifecycle events that describe their changes. This module has no
//! dependencies on the rest of the crate.
//!
//! # Ownership
//!
//! The session manager is the only component that creates and destroys
//! containers in response to protocol callbacks. Everything downstream
//! (broker, receivers, mappers) works on copies.

mod event;
mod model;

pub use event::{LifecycleEvent, LifecycleKind};
pub use model::{
    BlobData, Container, ContainerKind, CursorData, Motion, NormalizedPoint, ObjectData, Payload,
    SessionId,
};
