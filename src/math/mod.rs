pub mod intersect_3d;

use crate::error::{GeometryError, Result};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Unit quaternion used for label orientation and axis-angle rotation.
pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// World "up" direction (Y-up convention).
pub const WORLD_UP: Vector3 = Vector3::new(0.0, 1.0, 0.0);

/// World "forward" direction.
pub const WORLD_FORWARD: Vector3 = Vector3::new(0.0, 0.0, 1.0);

/// A half-line `origin + t * direction`, `t >= 0`, with unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if `direction` has no length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let direction = direction
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        Ok(Self { origin, direction })
    }

    /// Returns the point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Rotates `v` about the unit `axis` by `angle` radians (right-handed).
#[must_use]
pub fn rotate_about_axis(v: &Vector3, axis: &Vector3, angle: f64) -> Vector3 {
    let axis = nalgebra::Unit::new_unchecked(*axis);
    UnitQuaternion::from_axis_angle(&axis, angle) * v
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn ray_normalizes_direction() {
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert_relative_eq!(ray.direction.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(ray.at(2.0), Point3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Ray::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn rotation_is_right_handed() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let z = Vector3::new(0.0, 0.0, 1.0);
        let r = rotate_about_axis(&x, &z, FRAC_PI_2);
        assert_relative_eq!(r, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
