//! Coordinate mapping.
//!
//! Projects normalized `[0, 1]²` container positions onto a target surface
//! and keeps a table of the last mapped position per session id.
//!
//! # Surfaces
//!
//! | Surface | Mapping |
//! |---------|---------|
//! | [`PlaneSurface`] | `placement(((x - 0.5)·w, 0, (y' - 0.5)·h))`, `y' = flip_y ? 1 - y : y` |
//! | [`ScreenSurface`] | `(clamp01(x)·W, clamp01(y')·H, 0)` |
//!
//! For a plane, `map(0.5, 0.5)` is always the placement origin, whatever the
//! width and height.
//!
//! # Example
//!
//! ```ignore
//! use tuiolayer::mapper::{CoordinateMapper, PlaneSurface};
//!
//! let mapper = shared(CoordinateMapper::new(PlaneSurface::new(2.0, 1.0)));
//! broker.register(mapper.clone());
//!
//! let mut positions = mapper.borrow().subscribe();
//! // ... after a tick
//! while let Ok(event) = positions.try_recv() {
//!     println!("{:?}", event);
//! }
//! ```

mod config;
mod coordinate;
mod surface;
mod transform;

pub use config::{MapperConfig, SurfaceKind, UnknownSurface};
pub use coordinate::{CoordinateMapper, PositionEvent};
pub use surface::{PlaneSurface, ScreenSurface, Surface};
pub use transform::{Placement, Rotation, Vec3};
