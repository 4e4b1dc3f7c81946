//! Core value types for tracked containers.
//!
//! A container is one tracked entity reported by the protocol layer: a
//! finger/pointer (cursor), a tagged physical object, or an untagged blob.
//! Every container carries a [`SessionId`] that names it for its whole
//! lifetime and a normalized position in `[0, 1]²`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Session identifier issued by the tracker for one container lifetime.
///
/// Session ids are monotonically issued and never reused while the container
/// is live. Once a container is removed its id is dead for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl SessionId {
    /// Create a new session id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for SessionId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position in normalized sensor space.
///
/// Both axes run from 0.0 to 1.0; `(0, 0)` is the top-left corner of the
/// tracking surface as reported by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// Create a new normalized point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    /// Whether both axes lie inside `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Euclidean distance to another point, in normalized units.
    pub fn distance_to(&self, other: &NormalizedPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Instantaneous motion derived by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    /// Velocity along X (normalized units per second).
    pub x_speed: f32,
    /// Velocity along Y (normalized units per second).
    pub y_speed: f32,
    /// Magnitude of the velocity vector.
    pub motion_speed: f32,
    /// Acceleration of the motion speed.
    pub motion_accel: f32,
}

impl Motion {
    /// Create a motion sample from velocity components and acceleration.
    ///
    /// The speed magnitude is derived from the components.
    pub fn new(x_speed: f32, y_speed: f32, motion_accel: f32) -> Self {
        Self {
            x_speed,
            y_speed,
            motion_speed: (x_speed * x_speed + y_speed * y_speed).sqrt(),
            motion_accel,
        }
    }
}

/// Cursor payload (finger or pointer).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorData {
    /// Tracker-local cursor slot, reused between touches.
    pub cursor_id: i32,
    /// Derived motion, when the tracker reports it.
    pub motion: Option<Motion>,
}

/// Tagged object payload (fiducial marker).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectData {
    /// Marker symbol / class identifier.
    pub symbol_id: i32,
    /// Orientation in radians.
    pub angle: f32,
}

/// Untagged blob payload.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlobData {
    /// Tracker-local blob slot.
    pub blob_id: i32,
    /// Orientation in radians.
    pub angle: f32,
    /// Width in normalized units.
    pub width: f32,
    /// Height in normalized units.
    pub height: f32,
}

impl BlobData {
    /// Area of the blob's bounding ellipse box, in normalized units.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Variant-specific payload of a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Cursor(CursorData),
    Object(ObjectData),
    Blob(BlobData),
}

/// Payload discriminant, used for filtering and per-variant queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Cursor,
    Object,
    Blob,
}

impl ContainerKind {
    /// All container kinds, in protocol order.
    pub const ALL: [ContainerKind; 3] = [
        ContainerKind::Cursor,
        ContainerKind::Object,
        ContainerKind::Blob,
    ];

    /// Lowercase name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Cursor => "cursor",
            ContainerKind::Object => "object",
            ContainerKind::Blob => "blob",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tracked entity.
///
/// Identity is the [`SessionId`]; two containers with the same id denote the
/// same entity at different points in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub session_id: SessionId,
    pub position: NormalizedPoint,
    pub payload: Payload,
}

impl Container {
    /// Create a cursor container.
    pub fn cursor(session_id: impl Into<SessionId>, x: f32, y: f32) -> Self {
        Self {
            session_id: session_id.into(),
            position: NormalizedPoint::new(x, y),
            payload: Payload::Cursor(CursorData::default()),
        }
    }

    /// Create an object container.
    pub fn object(
        session_id: impl Into<SessionId>,
        symbol_id: i32,
        x: f32,
        y: f32,
        angle: f32,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            position: NormalizedPoint::new(x, y),
            payload: Payload::Object(ObjectData { symbol_id, angle }),
        }
    }

    /// Create a blob container.
    pub fn blob(
        session_id: impl Into<SessionId>,
        x: f32,
        y: f32,
        angle: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            position: NormalizedPoint::new(x, y),
            payload: Payload::Blob(BlobData {
                blob_id: 0,
                angle,
                width,
                height,
            }),
        }
    }

    /// Return a copy moved to a new position, keeping identity and payload.
    pub fn moved_to(mut self, x: f32, y: f32) -> Self {
        self.position = NormalizedPoint::new(x, y);
        self
    }

    /// Which variant this container is.
    pub fn kind(&self) -> ContainerKind {
        match self.payload {
            Payload::Cursor(_) => ContainerKind::Cursor,
            Payload::Object(_) => ContainerKind::Object,
            Payload::Blob(_) => ContainerKind::Blob,
        }
    }

    /// X position in normalized space.
    pub fn x(&self) -> f32 {
        self.position.x
    }

    /// Y position in normalized space.
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Orientation in radians for objects and blobs, `None` for cursors.
    pub fn angle(&self) -> Option<f32> {
        match self.payload {
            Payload::Cursor(_) => None,
            Payload::Object(obj) => Some(obj.angle),
            Payload::Blob(blob) => Some(blob.angle),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.3}, {:.3})",
            self.kind(),
            self.session_id,
            self.position.x,
            self.position.y
        )
    }
}
