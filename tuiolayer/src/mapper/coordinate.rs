//! Session id → mapped position table.

use std::collections::BTreeMap;

use tokio::sync::broadcast;
use tracing::debug;

use super::config::MapperConfig;
use super::surface::Surface;
use super::transform::Vec3;
use crate::container::{Container, ContainerKind, NormalizedPoint, SessionId};
use crate::dispatch::{ContainerReceiver, ReceiverError, DEFAULT_CHANNEL_CAPACITY};

/// Position change re-published by a [`CoordinateMapper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionEvent {
    Added {
        session_id: SessionId,
        kind: ContainerKind,
        position: Vec3,
    },
    Moved {
        session_id: SessionId,
        kind: ContainerKind,
        position: Vec3,
    },
    Removed {
        session_id: SessionId,
        kind: ContainerKind,
    },
}

impl PositionEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            PositionEvent::Added { session_id, .. }
            | PositionEvent::Moved { session_id, .. }
            | PositionEvent::Removed { session_id, .. } => *session_id,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            PositionEvent::Added { kind, .. }
            | PositionEvent::Moved { kind, .. }
            | PositionEvent::Removed { kind, .. } => *kind,
        }
    }

    /// Mapped position, `None` for removals.
    pub fn position(&self) -> Option<Vec3> {
        match self {
            PositionEvent::Added { position, .. } | PositionEvent::Moved { position, .. } => {
                Some(*position)
            }
            PositionEvent::Removed { .. } => None,
        }
    }
}

/// Maps container positions onto a [`Surface`] and tracks them by session id.
///
/// Register it with a broker or directly with a session manager. Added and
/// updated containers are mapped and stored; removed containers are erased
/// from the table before the `Removed` event is sent, so a removed session
/// never lingers.
///
/// Only cursors are tracked unless objects or blobs are enabled.
pub struct CoordinateMapper<S: Surface = Box<dyn Surface>> {
    surface: S,
    track_objects: bool,
    track_blobs: bool,
    positions: BTreeMap<SessionId, Vec3>,
    events: broadcast::Sender<PositionEvent>,
}

impl<S: Surface> CoordinateMapper<S> {
    /// Create a cursor-only mapper over `surface`.
    pub fn new(surface: S) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            surface,
            track_objects: false,
            track_blobs: false,
            positions: BTreeMap::new(),
            events,
        }
    }

    pub fn with_track_objects(mut self, track: bool) -> Self {
        self.track_objects = track;
        self
    }

    pub fn with_track_blobs(mut self, track: bool) -> Self {
        self.track_blobs = track;
        self
    }

    /// Replace the event channel with one buffering `capacity` events.
    ///
    /// Existing subscribers are disconnected.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Whether containers of `kind` are tracked.
    pub fn tracks(&self, kind: ContainerKind) -> bool {
        match kind {
            ContainerKind::Cursor => true,
            ContainerKind::Object => self.track_objects,
            ContainerKind::Blob => self.track_blobs,
        }
    }

    /// Map a normalized position without touching the table.
    pub fn map(&self, x: f32, y: f32) -> Vec3 {
        self.surface.map(NormalizedPoint::new(x, y))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Last mapped position for `id`.
    pub fn position(&self, id: SessionId) -> Option<Vec3> {
        self.positions.get(&id).copied()
    }

    /// Copy of the whole table, ordered by session id.
    pub fn positions(&self) -> Vec<(SessionId, Vec3)> {
        self.positions.iter().map(|(id, p)| (*id, *p)).collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Subscribe to position events.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionEvent> {
        self.events.subscribe()
    }

    fn record(&mut self, container: &Container, added: bool) -> Result<(), ReceiverError> {
        let kind = container.kind();
        if !self.tracks(kind) {
            return Ok(());
        }

        let position = self.surface.map(container.position);
        if !position.is_finite() {
            return Err(ReceiverError::failed(format!(
                "non-finite position {} for {}",
                position, container.session_id
            )));
        }

        let session_id = container.session_id;
        self.positions.insert(session_id, position);

        let event = if added {
            debug!(session_id = session_id.value(), %kind, %position, "Mapped new container");
            PositionEvent::Added {
                session_id,
                kind,
                position,
            }
        } else {
            PositionEvent::Moved {
                session_id,
                kind,
                position,
            }
        };
        let _ = self.events.send(event);
        Ok(())
    }
}

impl CoordinateMapper<Box<dyn Surface>> {
    /// Build a mapper from configuration.
    pub fn from_config(config: &MapperConfig) -> Self {
        CoordinateMapper::new(config.build_surface())
            .with_track_objects(config.track_objects)
            .with_track_blobs(config.track_blobs)
            .with_channel_capacity(config.channel_capacity)
    }
}

impl<S: Surface> ContainerReceiver for CoordinateMapper<S> {
    fn on_added(&mut self, container: &Container) -> Result<(), ReceiverError> {
        self.record(container, true)
    }

    fn on_updated(&mut self, container: &Container) -> Result<(), ReceiverError> {
        self.record(container, false)
    }

    fn on_removed(&mut self, container: &Container) -> Result<(), ReceiverError> {
        let kind = container.kind();
        if !self.tracks(kind) {
            return Ok(());
        }

        let session_id = container.session_id;
        if self.positions.remove(&session_id).is_some() {
            debug!(session_id = session_id.value(), %kind, "Unmapped container");
        }
        let _ = self.events.send(PositionEvent::Removed { session_id, kind });
        Ok(())
    }

    fn name(&self) -> &str {
        "coordinate-mapper"
    }
}

impl<S: Surface> std::fmt::Debug for CoordinateMapper<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateMapper")
            .field("surface", &self.surface.name())
            .field("track_objects", &self.track_objects)
            .field("track_blobs", &self.track_blobs)
            .field("tracked", &self.positions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::surface::{PlaneSurface, ScreenSurface};

    const EPS: f32 = 1e-4;

    fn plane_mapper() -> CoordinateMapper<PlaneSurface> {
        CoordinateMapper::new(PlaneSurface::new(2.0, 2.0))
    }

    #[test]
    fn test_added_updated_removed() {
        let mut mapper = plane_mapper();
        let c = Container::cursor(7, 0.2, 0.8);

        mapper.on_added(&c).unwrap();
        let first = mapper.position(SessionId(7)).unwrap();
        assert!(first.approx_eq(Vec3::new(-0.6, 0.0, 0.6), EPS));

        mapper.on_updated(&c.moved_to(0.3, 0.8)).unwrap();
        let moved = mapper.position(SessionId(7)).unwrap();
        assert!(moved.approx_eq(Vec3::new(-0.4, 0.0, 0.6), EPS));

        mapper.on_removed(&c).unwrap();
        assert!(mapper.position(SessionId(7)).is_none());
        assert!(mapper.is_empty());
    }

    #[test]
    fn test_objects_ignored_by_default() {
        let mut mapper = plane_mapper();
        mapper
            .on_added(&Container::object(1, 4, 0.5, 0.5, 0.0))
            .unwrap();
        assert!(mapper.is_empty());

        let mut mapper = plane_mapper().with_track_objects(true);
        mapper
            .on_added(&Container::object(1, 4, 0.5, 0.5, 0.0))
            .unwrap();
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_position_events() {
        let mut mapper = CoordinateMapper::new(ScreenSurface::new(100, 100));
        let mut rx = mapper.subscribe();
        let c = Container::cursor(3, 0.5, 0.5);

        mapper.on_added(&c).unwrap();
        mapper.on_updated(&c.moved_to(0.6, 0.5)).unwrap();
        mapper.on_removed(&c).unwrap();

        let events: Vec<PositionEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], PositionEvent::Added { .. }));
        assert!(events[1]
            .position()
            .unwrap()
            .approx_eq(Vec3::new(60.0, 50.0, 0.0), EPS));
        assert_eq!(events[2].position(), None);
        assert!(events.iter().all(|e| e.session_id() == SessionId(3)));
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut mapper = plane_mapper();
        let err = mapper
            .on_added(&Container::cursor(1, f32::NAN, 0.5))
            .unwrap_err();
        assert!(matches!(err, ReceiverError::Failed(_)));
        assert!(mapper.is_empty());
    }

    #[test]
    fn test_positions_ordered_by_id() {
        let mut mapper = plane_mapper();
        for id in [5, 1, 3] {
            mapper.on_added(&Container::cursor(id, 0.5, 0.5)).unwrap();
        }
        let ids: Vec<i64> = mapper.positions().iter().map(|(id, _)| id.value()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_from_config() {
        let config = MapperConfig::screen(640, 480).with_track_blobs(true);
        let mapper: CoordinateMapper = CoordinateMapper::from_config(&config);
        assert_eq!(mapper.surface().name(), "screen");
        assert!(mapper.tracks(ContainerKind::Blob));
        assert!(!mapper.tracks(ContainerKind::Object));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// After a removal the session is gone from the table.
            #[test]
            fn removal_always_cleans_up(
                ids in prop::collection::vec(0i64..8, 1..32),
                x in 0.0f32..=1.0,
                y in 0.0f32..=1.0,
            ) {
                let mut mapper = plane_mapper();
                for id in &ids {
                    mapper.on_added(&Container::cursor(*id, x, y)).unwrap();
                }
                let victim = ids[0];
                mapper.on_removed(&Container::cursor(victim, x, y)).unwrap();
                prop_assert!(mapper.position(SessionId(victim)).is_none());
            }
        }
    }
}
