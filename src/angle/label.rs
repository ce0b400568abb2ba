use crate::config::AngleToolConfig;
use crate::math::{Point3, UnitQuaternion, Vector3, TOLERANCE, WORLD_FORWARD, WORLD_UP};

use super::compute::AngleResult;

/// Text shown while an angle is incomplete or undefined.
pub const PLACEHOLDER: &str = "--";

/// Formats an angle to one decimal place with a degree sign.
#[must_use]
pub fn format_angle(degrees: f64) -> String {
    format!("{degrees:.1}°")
}

/// World placement and text of one angle label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub vertex_index: usize,
    pub position: Point3,
    /// Rotation whose local +Z faces away from the viewpoint.
    pub rotation: UnitQuaternion,
    pub text: String,
}

/// Positions angle labels along the bisector, pushed away from the shape centroid.
#[derive(Debug, Clone, Copy)]
pub struct LabelPlacer {
    offset_factor: f64,
    avoidance_factor: f64,
}

impl LabelPlacer {
    /// Creates a new `LabelPlacer`.
    ///
    /// * `offset_factor` - Distance from the vertex in arc radii.
    /// * `avoidance_factor` - Extra distance away from the centroid.
    #[must_use]
    pub fn new(offset_factor: f64, avoidance_factor: f64) -> Self {
        Self {
            offset_factor,
            avoidance_factor,
        }
    }

    #[must_use]
    pub fn from_config(config: &AngleToolConfig) -> Self {
        Self::new(config.world_text_offset_factor, config.text_avoidance_factor)
    }

    /// Places the label for a computed angle.
    ///
    /// `centroid` is given in triangle mode only; a vertex sitting on the
    /// centroid gets no outward push.
    #[must_use]
    pub fn place(&self, angle: &AngleResult, centroid: Option<&Point3>, viewpoint: &Point3) -> LabelPlacement {
        let mut position = angle.vertex + angle.bisector() * (angle.arc_radius * self.offset_factor);
        if let Some(outward) = centroid.and_then(|c| (angle.vertex - c).try_normalize(TOLERANCE)) {
            position += outward * self.avoidance_factor;
        }
        LabelPlacement {
            vertex_index: angle.vertex_index,
            position,
            rotation: billboard_rotation(&position, viewpoint),
            text: format_angle(angle.angle_degrees),
        }
    }

    /// Placeholder label at `anchor` for an undefined angle.
    #[must_use]
    pub fn placeholder(&self, vertex_index: usize, anchor: &Point3, viewpoint: &Point3) -> LabelPlacement {
        LabelPlacement {
            vertex_index,
            position: *anchor,
            rotation: billboard_rotation(anchor, viewpoint),
            text: PLACEHOLDER.to_owned(),
        }
    }
}

/// Rotation that turns a label at `position` to face `viewpoint`.
///
/// The look direction is `position - viewpoint`. Falls back to the forward
/// axis as "up" when looking straight up or down, and to identity when the
/// viewpoint coincides with the label.
#[must_use]
pub fn billboard_rotation(position: &Point3, viewpoint: &Point3) -> UnitQuaternion {
    let Some(look) = (position - viewpoint).try_normalize(TOLERANCE) else {
        return UnitQuaternion::identity();
    };
    let up: Vector3 = if look.cross(&WORLD_UP).norm() > 1e-6 {
        WORLD_UP
    } else {
        WORLD_FORWARD
    };
    UnitQuaternion::face_towards(&look, &up)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::angle::compute::{centroid, compute_angle, compute_vertex};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn formats_one_decimal() {
        assert_eq!(format_angle(90.0), "90.0°");
        assert_eq!(format_angle(59.96), "60.0°");
        assert_eq!(format_angle(0.04), "0.0°");
    }

    #[test]
    fn label_sits_on_bisector() {
        let angle = compute_angle(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(1.0, 1.0, 0.0), 0.2).unwrap();
        let label = LabelPlacer::new(2.0, 0.5).place(&angle, None, &p(0.0, 0.0, 10.0));
        let expected = p(1.0, 0.0, 0.0) + Vector3::new(-1.0, 1.0, 0.0).normalize() * 0.4;
        assert_relative_eq!(label.position, expected, epsilon = 1e-9);
        assert_eq!(label.text, "90.0°");
        assert_eq!(label.vertex_index, 0);
    }

    #[test]
    fn triangle_labels_are_pushed_outward() {
        let points = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(1.0, 2.0, 0.0)];
        let center = centroid(&points);
        let placer = LabelPlacer::new(1.5, 0.3);
        let viewpoint = p(1.0, 1.0, 10.0);
        for i in 0..3 {
            let angle = compute_vertex(&points, i, 0.2).unwrap();
            let plain = placer.place(&angle, None, &viewpoint);
            let biased = placer.place(&angle, Some(&center), &viewpoint);
            let push = biased.position - plain.position;
            assert_relative_eq!(push.norm(), 0.3, epsilon = 1e-9);
            assert!(push.dot(&(points[i] - center)) > 0.0);
        }
    }

    #[test]
    fn billboard_faces_away_from_viewer() {
        let rotation = billboard_rotation(&p(0.0, 0.0, 5.0), &p(0.0, 0.0, 0.0));
        assert_relative_eq!(rotation * Vector3::z(), Vector3::z(), epsilon = 1e-9);

        let rotation = billboard_rotation(&p(3.0, 0.0, 0.0), &p(0.0, 0.0, 0.0));
        assert_relative_eq!(rotation * Vector3::z(), Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn billboard_handles_vertical_and_coincident_views() {
        let rotation = billboard_rotation(&p(0.0, 0.0, 0.0), &p(0.0, 4.0, 0.0));
        assert_relative_eq!(rotation * Vector3::z(), -Vector3::y(), epsilon = 1e-9);
        assert_eq!(billboard_rotation(&p(1.0, 1.0, 1.0), &p(1.0, 1.0, 1.0)), UnitQuaternion::identity());
    }

    #[test]
    fn placeholder_label_text() {
        let label = LabelPlacer::new(1.5, 0.3).placeholder(2, &p(1.0, 2.0, 3.0), &p(0.0, 0.0, 0.0));
        assert_eq!(label.text, PLACEHOLDER);
        assert_eq!(label.position, p(1.0, 2.0, 3.0));
    }
}
