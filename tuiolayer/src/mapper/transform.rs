//! Minimal 3D math for placing a mapping surface in its target space.
//!
//! Conventions follow the usual scene-graph layout: `+y` is up, a plane lies
//! in its local `xz` plane, and Euler angles are applied roll (z), then pitch
//! (x), then yaw (y).

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A point or direction in the target space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise product.
    pub fn scale(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Whether `other` is within `epsilon` of this point.
    pub fn approx_eq(self, other: Vec3, epsilon: f32) -> bool {
        self.distance(other) <= epsilon
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Row-major 3x3 rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    m: [[f32; 3]; 3],
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Rotation from Euler angles in degrees.
    ///
    /// Applied z first, then x, then y.
    pub fn from_euler_degrees(x: f32, y: f32, z: f32) -> Self {
        let (sx, cx) = x.to_radians().sin_cos();
        let (sy, cy) = y.to_radians().sin_cos();
        let (sz, cz) = z.to_radians().sin_cos();

        let rx = Rotation {
            m: [[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]],
        };
        let ry = Rotation {
            m: [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]],
        };
        let rz = Rotation {
            m: [[cz, -sz, 0.0], [sz, cz, 0.0], [0.0, 0.0, 1.0]],
        };

        ry.compose(&rx).compose(&rz)
    }

    /// `self * other`: apply `other` first, then `self`.
    fn compose(&self, other: &Rotation) -> Rotation {
        let mut m = [[0.0f32; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Rotation { m }
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let r = &self.m;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }
}

/// Position, orientation and scale of a surface in its target space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub translation: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local point to target space: scale, then rotate, then translate.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation.rotate(local.scale(self.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_vec_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert!((Vec3::new(3.0, 4.0, 0.0).length() - 5.0).abs() < EPS);
    }

    mod rotation {
        use super::*;

        #[test]
        fn test_yaw_turns_forward_to_right() {
            let r = Rotation::from_euler_degrees(0.0, 90.0, 0.0);
            assert!(r
                .rotate(Vec3::new(0.0, 0.0, 1.0))
                .approx_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
        }

        #[test]
        fn test_pitch_turns_up_to_forward() {
            let r = Rotation::from_euler_degrees(90.0, 0.0, 0.0);
            assert!(r
                .rotate(Vec3::new(0.0, 1.0, 0.0))
                .approx_eq(Vec3::new(0.0, 0.0, 1.0), EPS));
        }

        #[test]
        fn test_roll_turns_right_to_up() {
            let r = Rotation::from_euler_degrees(0.0, 0.0, 90.0);
            assert!(r
                .rotate(Vec3::new(1.0, 0.0, 0.0))
                .approx_eq(Vec3::new(0.0, 1.0, 0.0), EPS));
        }

        #[test]
        fn test_rotation_preserves_length() {
            let r = Rotation::from_euler_degrees(33.0, -71.0, 12.5);
            let v = Vec3::new(0.3, -1.2, 2.0);
            assert!((r.rotate(v).length() - v.length()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_placement_order_scale_rotate_translate() {
        let placement = Placement::new()
            .with_scale(Vec3::new(2.0, 1.0, 1.0))
            .with_rotation(Rotation::from_euler_degrees(0.0, 0.0, 90.0))
            .with_translation(Vec3::new(10.0, 0.0, 0.0));

        // (1,0,0) → scale (2,0,0) → roll (0,2,0) → translate (10,2,0)
        let p = placement.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.approx_eq(Vec3::new(10.0, 2.0, 0.0), EPS));
    }
}
