//! Lifecycle events carried from the protocol thread to the consumer tick.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use super::model::{Container, ContainerKind, SessionId};

/// What happened to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Added,
    Updated,
    Removed,
}

impl LifecycleKind {
    /// Lowercase name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleKind::Added => "added",
            LifecycleKind::Updated => "updated",
            LifecycleKind::Removed => "removed",
        }
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged lifecycle notification for one container.
///
/// Produced at callback time on the listener thread and consumed exactly once
/// by the drain step of the owning session manager. Not retained after
/// dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub container: Container,
    /// When the protocol callback produced this event.
    pub received_at: Instant,
}

impl LifecycleEvent {
    /// Create a new event stamped with the current time.
    pub fn new(kind: LifecycleKind, container: Container) -> Self {
        Self {
            kind,
            container,
            received_at: Instant::now(),
        }
    }

    /// Create an `Added` event.
    pub fn added(container: Container) -> Self {
        Self::new(LifecycleKind::Added, container)
    }

    /// Create an `Updated` event.
    pub fn updated(container: Container) -> Self {
        Self::new(LifecycleKind::Updated, container)
    }

    /// Create a `Removed` event.
    pub fn removed(container: Container) -> Self {
        Self::new(LifecycleKind::Removed, container)
    }

    /// Session id of the container this event concerns.
    pub fn session_id(&self) -> SessionId {
        self.container.session_id
    }

    /// Variant of the container this event concerns.
    pub fn container_kind(&self) -> ContainerKind {
        self.container.kind()
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        let c = Container::cursor(1, 0.5, 0.5);
        assert_eq!(LifecycleEvent::added(c).kind, LifecycleKind::Added);
        assert_eq!(LifecycleEvent::updated(c).kind, LifecycleKind::Updated);
        assert_eq!(LifecycleEvent::removed(c).kind, LifecycleKind::Removed);
    }

    #[test]
    fn test_accessors() {
        let event = LifecycleEvent::added(Container::object(9, 3, 0.1, 0.1, 0.0));
        assert_eq!(event.session_id(), SessionId(9));
        assert_eq!(event.container_kind(), ContainerKind::Object);
    }

    #[test]
    fn test_display() {
        let event = LifecycleEvent::removed(Container::cursor(7, 0.2, 0.8));
        assert_eq!(event.to_string(), "removed cursor #7 (0.200, 0.800)");
    }
}
