//! Math utilities and types
//!
//! Provides the fundamental math types for swept-volume collision work.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// An infinite plane in the form `dot(normal, p) + d = 0`.
///
/// The normal is unit length when built from a non-degenerate triangle;
/// a degenerate triangle yields a zero normal and a zero offset, which
/// downstream distance tests treat as "everywhere at distance zero".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal (or zero for a degenerate source triangle)
    pub normal: Vec3,

    /// Signed offset so that `signed_distance_to` is zero on the plane
    pub d: f32,
}

impl Plane {
    /// Builds the plane through three points.
    ///
    /// The normal follows the right-hand rule over `(p2 - p1, p3 - p1)`.
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let normal = (p2 - p1)
            .cross(&(p3 - p1))
            .try_normalize(0.0)
            .unwrap_or_else(Vec3::zeros);
        Self {
            normal,
            d: -normal.dot(&p1),
        }
    }

    /// Signed distance from `point` to the plane, positive on the normal side.
    pub fn signed_distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.d
    }

    /// Whether the plane faces against `direction`.
    ///
    /// A plane is front-facing to a motion direction when the normal points
    /// toward the mover, i.e. `dot(normal, direction) <= epsilon`.
    pub fn is_front_facing_to(&self, direction: Vec3, epsilon: f32) -> bool {
        self.normal.dot(&direction) <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_from_points_is_unit_normal() {
        let plane = Plane::from_points(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(2.0, 0.0, 0.0),
        );

        assert_relative_eq!(plane.normal.magnitude(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(plane.normal, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(plane.d, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn signed_distance_has_normal_side_positive() {
        let plane = Plane::from_points(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        );

        assert_relative_eq!(plane.signed_distance_to(Vec3::new(0.5, 3.0, 0.5)), 2.0, epsilon = 1e-6);
        assert_relative_eq!(plane.signed_distance_to(Vec3::new(0.5, -1.0, 0.5)), -2.0, epsilon = 1e-6);
    }

    #[test]
    fn front_facing_includes_grazing_motion() {
        let plane = Plane::from_points(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        );

        assert!(plane.is_front_facing_to(Vec3::new(0.0, -1.0, 0.0), 0.0));
        assert!(plane.is_front_facing_to(Vec3::new(1.0, 0.0, 0.0), 0.0));
        assert!(!plane.is_front_facing_to(Vec3::new(0.0, 1.0, 0.0), 0.0));
    }

    #[test]
    fn degenerate_triangle_yields_zero_plane() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let plane = Plane::from_points(p, p, Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(plane.normal, Vec3::zeros());
        assert_eq!(plane.d, 0.0);
        assert_eq!(plane.signed_distance_to(Vec3::new(9.0, 9.0, 9.0)), 0.0);
    }
}
