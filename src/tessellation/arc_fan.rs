use tracing::trace;

use crate::angle::AngleResult;
use crate::config::AngleToolConfig;
use crate::math::rotate_about_axis;

use super::TriangleMesh;

/// Builds the filled circular sector ("pie slice") that visualizes an angle.
///
/// The fan has `resolution + 2` vertices: the center, then the start leg
/// rotated through the full angle in `resolution` equal steps. Every vertex
/// is lifted along the rotation axis by `visual_offset` so the sector does
/// not z-fight with the surface underneath.
#[derive(Debug, Clone, Copy)]
pub struct ArcFan {
    resolution: usize,
    visual_offset: f64,
    min_radius: f64,
}

impl ArcFan {
    /// Creates a new arc fan builder. `resolution` is clamped to at least 1.
    #[must_use]
    pub fn new(resolution: usize, visual_offset: f64, min_radius: f64) -> Self {
        Self {
            resolution: resolution.max(1),
            visual_offset,
            min_radius,
        }
    }

    #[must_use]
    pub fn from_config(config: &AngleToolConfig) -> Self {
        Self::new(config.arc_resolution, config.arc_visual_offset, config.min_arc_radius)
    }

    /// Builds the sector for `angle`, or an empty mesh when the arc radius
    /// is below the visibility threshold.
    #[must_use]
    pub fn build(&self, angle: &AngleResult) -> TriangleMesh {
        if !angle.has_visible_arc(self.min_radius) {
            trace!(vertex = angle.vertex_index, radius = angle.arc_radius, "arc too small, cleared");
            return TriangleMesh::default();
        }

        let axis = angle.rotation_axis;
        let lift = axis * self.visual_offset;
        let start = angle.start_direction * angle.arc_radius;
        #[allow(clippy::cast_precision_loss)]
        let step = angle.angle_radians() / self.resolution as f64;

        let mut vertices = Vec::with_capacity(self.resolution + 2);
        vertices.push(angle.vertex + lift);
        for i in 0..=self.resolution {
            #[allow(clippy::cast_precision_loss)]
            let rim = rotate_about_axis(&start, &axis, step * i as f64);
            vertices.push(angle.vertex + rim + lift);
        }

        // Reversed fan winding: the sector is seen looking down the axis.
        #[allow(clippy::cast_possible_truncation)]
        let indices = (0..self.resolution as u32).map(|i| [0, i + 2, i + 1]).collect();

        TriangleMesh {
            normals: vec![-axis; vertices.len()],
            vertices,
            indices,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::angle::compute_angle;
    use crate::math::{Point3, Vector3};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn right_angle() -> AngleResult {
        compute_angle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(1.0, 1.0, 0.0), 0.2).unwrap()
    }

    #[test]
    fn fan_has_expected_counts() {
        let mesh = ArcFan::new(20, 0.0, 0.001).build(&right_angle());
        assert_eq!(mesh.vertices.len(), 22);
        assert_eq!(mesh.normals.len(), 22);
        assert_eq!(mesh.indices.len(), 20);
        assert_eq!(mesh.indices[0], [0, 2, 1]);
        assert_eq!(mesh.indices[19], [0, 21, 20]);
    }

    #[test]
    fn rim_spans_both_legs_at_arc_radius() {
        let angle = right_angle();
        let mesh = ArcFan::new(10, 0.0, 0.001).build(&angle);
        assert_relative_eq!(mesh.vertices[0], p(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(mesh.vertices[1], p(0.8, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(mesh.vertices[11], p(1.0, 0.2, 0.0), epsilon = 1e-9);
        for v in &mesh.vertices[1..] {
            assert_relative_eq!((v - mesh.vertices[0]).norm(), 0.2, epsilon = 1e-9);
        }
    }

    #[test]
    fn fan_is_lifted_along_axis() {
        let angle = right_angle();
        let mesh = ArcFan::new(10, 0.01, 0.001).build(&angle);
        for v in &mesh.vertices {
            let height = (v - angle.vertex).dot(&angle.rotation_axis);
            assert_relative_eq!(height, 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn winding_matches_normals() {
        let mesh = ArcFan::new(12, 0.0, 0.001).build(&right_angle());
        for [a, b, c] in &mesh.indices {
            let (a, b, c) = (mesh.vertices[*a as usize], mesh.vertices[*b as usize], mesh.vertices[*c as usize]);
            let n = (b - a).cross(&(c - a)).normalize();
            assert_relative_eq!(n, mesh.normals[0], epsilon = 1e-9);
        }
    }

    #[test]
    fn tiny_arc_is_cleared() {
        let angle = compute_angle(&p(0.0, 0.0, 0.0), &p(0.011, 0.0, 0.0), &p(0.011, 0.011, 0.0), 0.05).unwrap();
        let mesh = ArcFan::new(20, 0.0, 0.001).build(&angle);
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn straight_angle_fan_is_a_half_disc() {
        let angle = compute_angle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), 0.2).unwrap();
        let mesh = ArcFan::new(10, 0.0, 0.001).build(&angle);
        assert_relative_eq!(mesh.vertices[11], p(1.2, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(mesh.normals[0].norm(), 1.0, epsilon = 1e-12);
        assert!(mesh.normals[0].dot(&Vector3::x()).abs() < 1e-12);
    }
}
