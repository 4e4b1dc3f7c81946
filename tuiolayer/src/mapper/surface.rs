//! Target surfaces for coordinate mapping.

use std::fmt;

use super::transform::{Placement, Vec3};
use crate::container::NormalizedPoint;

/// A target coordinate space that normalized positions are mapped onto.
pub trait Surface {
    /// Map a normalized `[0, 1]²` position into this surface's space.
    fn map(&self, point: NormalizedPoint) -> Vec3;

    /// Short name for logs.
    fn name(&self) -> &str;
}

impl Surface for Box<dyn Surface> {
    fn map(&self, point: NormalizedPoint) -> Vec3 {
        (**self).map(point)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A rectangle placed in 3D space.
///
/// The sensor's centre `(0.5, 0.5)` lands on the placement origin. Sensor x
/// runs along local `+x`, sensor y along local `+z`; the plane has no
/// thickness, so local `y` is always zero before placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    pub width: f32,
    pub height: f32,
    pub flip_y: bool,
    pub placement: Placement,
}

impl Default for PlaneSurface {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl PlaneSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            flip_y: false,
            placement: Placement::default(),
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

    /// Position of the sensor centre in target space.
    pub fn origin(&self) -> Vec3 {
        self.placement.transform_point(Vec3::ZERO)
    }

    /// Map before placement.
    pub fn map_local(&self, x: f32, y: f32) -> Vec3 {
        let y = if self.flip_y { 1.0 - y } else { y };
        Vec3::new((x - 0.5) * self.width, 0.0, (y - 0.5) * self.height)
    }

    /// Outline corners in target space, counter-clockwise from local
    /// `(-w/2, -h/2)`.
    pub fn corners(&self) -> [Vec3; 4] {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        [
            Vec3::new(-hw, 0.0, -hh),
            Vec3::new(hw, 0.0, -hh),
            Vec3::new(hw, 0.0, hh),
            Vec3::new(-hw, 0.0, hh),
        ]
        .map(|c| self.placement.transform_point(c))
    }
}

impl Surface for PlaneSurface {
    fn map(&self, point: NormalizedPoint) -> Vec3 {
        self.placement
            .transform_point(self.map_local(point.x, point.y))
    }

    fn name(&self) -> &str {
        "plane"
    }
}

/// Pixel space of a display.
///
/// Inputs are clamped to `[0, 1]` before scaling. Output `z` is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSurface {
    pub width: u32,
    pub height: u32,
    pub flip_y: bool,
}

impl Default for ScreenSurface {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl ScreenSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            flip_y: false,
        }
    }

    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }
}

impl Surface for ScreenSurface {
    fn map(&self, point: NormalizedPoint) -> Vec3 {
        let p = point.clamped();
        let y = if self.flip_y { 1.0 - p.y } else { p.y };
        Vec3::new(p.x * self.width as f32, y * self.height as f32, 0.0)
    }

    fn name(&self) -> &str {
        "screen"
    }
}

impl fmt::Display for ScreenSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen {}x{}", self.width, self.height)
    }
}

impl fmt::Display for PlaneSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plane {}x{} at {}", self.width, self.height, self.origin())
    }
}
