//! Coordinate mapper configuration.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::surface::{PlaneSurface, ScreenSurface, Surface};
use super::transform::Placement;
use crate::container::ContainerKind;
use crate::dispatch::DEFAULT_CHANNEL_CAPACITY;

/// Which surface a mapper projects onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceKind {
    #[default]
    Plane,
    Screen,
}

impl SurfaceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceKind::Plane => "plane",
            SurfaceKind::Screen => "screen",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised surface name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown surface '{0}', expected 'plane' or 'screen'")]
pub struct UnknownSurface(pub String);

impl FromStr for SurfaceKind {
    type Err = UnknownSurface;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plane" => Ok(SurfaceKind::Plane),
            "screen" => Ok(SurfaceKind::Screen),
            other => Err(UnknownSurface(other.to_string())),
        }
    }
}

/// Settings for one coordinate mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    pub surface: SurfaceKind,

    /// Plane width in target units.
    pub width: f32,

    /// Plane height in target units.
    pub height: f32,

    pub flip_y: bool,

    /// Screen width in pixels.
    pub screen_width: u32,

    /// Screen height in pixels.
    pub screen_height: u32,

    /// Plane placement. Ignored for screen surfaces.
    pub placement: Placement,

    pub track_objects: bool,
    pub track_blobs: bool,

    /// Buffer size of the position event channel.
    pub channel_capacity: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceKind::Plane,
            width: 1.0,
            height: 1.0,
            flip_y: false,
            screen_width: 1920,
            screen_height: 1080,
            placement: Placement::default(),
            track_objects: false,
            track_blobs: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl MapperConfig {
    /// Plane of the given size.
    pub fn plane(width: f32, height: f32) -> Self {
        Self {
            surface: SurfaceKind::Plane,
            width,
            height,
            ..Default::default()
        }
    }

    /// Screen of the given pixel size.
    pub fn screen(width: u32, height: u32) -> Self {
        Self {
            surface: SurfaceKind::Screen,
            screen_width: width,
            screen_height: height,
            ..Default::default()
        }
    }

    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_track_objects(mut self, track: bool) -> Self {
        self.track_objects = track;
        self
    }

    pub fn with_track_blobs(mut self, track: bool) -> Self {
        self.track_blobs = track;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Whether a mapper built from this config follows `kind`.
    ///
    /// Cursors are always tracked.
    pub fn tracks(&self, kind: ContainerKind) -> bool {
        match kind {
            ContainerKind::Cursor => true,
            ContainerKind::Object => self.track_objects,
            ContainerKind::Blob => self.track_blobs,
        }
    }

    /// Build the configured surface.
    pub fn build_surface(&self) -> Box<dyn Surface> {
        match self.surface {
            SurfaceKind::Plane => Box::new(
                PlaneSurface::new(self.width, self.height)
                    .with_flip_y(self.flip_y)
                    .with_placement(self.placement),
            ),
            SurfaceKind::Screen => Box::new(
                ScreenSurface::new(self.screen_width, self.screen_height)
                    .with_flip_y(self.flip_y),
            ),
        }
    }
}
