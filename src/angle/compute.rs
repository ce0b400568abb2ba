use crate::error::{GeometryError, Result};
use crate::math::{rotate_about_axis, Point3, Vector3, WORLD_FORWARD, WORLD_UP};

/// Squared leg length below which an angle is undefined.
pub const DEGENERATE_EPSILON: f64 = 1e-4;

/// Cross-product length below which two unit vectors count as collinear.
const AXIS_EPSILON: f64 = 1e-6;

/// The angle at one vertex and the frame needed to draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleResult {
    /// Marker index of the vertex. Only [`compute_vertex`] knows it;
    /// [`compute_angle`] on bare points leaves it at 0.
    pub vertex_index: usize,
    pub vertex: Point3,
    /// Unsigned angle in `[0, 180]`.
    pub angle_degrees: f64,
    /// Unit axis; rotating `start_direction` about it by the angle reaches the second leg.
    pub rotation_axis: Vector3,
    /// Unit direction of the first leg (`prev - vertex`).
    pub start_direction: Vector3,
    pub arc_radius: f64,
}

impl AngleResult {
    #[must_use]
    pub fn angle_radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }

    /// Unit direction halfway between the two legs.
    #[must_use]
    pub fn bisector(&self) -> Vector3 {
        rotate_about_axis(&self.start_direction, &self.rotation_axis, self.angle_radians() * 0.5)
    }

    /// Whether the arc is large enough to be worth building.
    #[must_use]
    pub fn has_visible_arc(&self, min_radius: f64) -> bool {
        self.arc_radius >= min_radius
    }
}

/// Computes the angle at `center` between the legs towards `prev` and `next`.
///
/// The result's `vertex_index` is 0; use [`compute_vertex`] to measure a
/// marker by index.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] when either leg is shorter than
/// `sqrt(DEGENERATE_EPSILON)`.
pub fn compute_angle(prev: &Point3, center: &Point3, next: &Point3, radius_factor: f64) -> Result<AngleResult> {
    let vec_a = prev - center;
    let vec_b = next - center;
    if vec_a.norm_squared() < DEGENERATE_EPSILON || vec_b.norm_squared() < DEGENERATE_EPSILON {
        return Err(GeometryError::Degenerate("angle leg has zero length".into()).into());
    }

    let len_a = vec_a.norm();
    let len_b = vec_b.norm();
    let dir_a = vec_a / len_a;
    let dir_b = vec_b / len_b;

    let cos = dir_a.dot(&dir_b).clamp(-1.0, 1.0);
    let angle_degrees = cos.acos().to_degrees();

    Ok(AngleResult {
        vertex_index: 0,
        vertex: *center,
        angle_degrees,
        rotation_axis: rotation_axis(&dir_a, &dir_b),
        start_direction: dir_a,
        arc_radius: len_a.min(len_b) * radius_factor,
    })
}

/// Unit axis perpendicular to both directions.
///
/// Collinear inputs fall back to `dir_a x up`, then to `dir_a x forward`.
#[must_use]
pub fn rotation_axis(dir_a: &Vector3, dir_b: &Vector3) -> Vector3 {
    [*dir_b, WORLD_UP, WORLD_FORWARD]
        .iter()
        .find_map(|other| dir_a.cross(other).try_normalize(AXIS_EPSILON))
        // dir_a cannot be parallel to both up and forward.
        .unwrap_or(WORLD_FORWARD)
}

/// Computes the angle at marker `vertex` of a three-point shape.
///
/// Neighbours are cyclic: `next = (vertex + 1) % 3`, `prev = (vertex + 2) % 3`.
///
/// # Errors
///
/// Returns an error if the angle at that vertex is degenerate.
pub fn compute_vertex(points: &[Point3; 3], vertex: usize, radius_factor: f64) -> Result<AngleResult> {
    let vertex = vertex % 3;
    let prev = &points[(vertex + 2) % 3];
    let next = &points[(vertex + 1) % 3];
    let mut result = compute_angle(prev, &points[vertex], next, radius_factor)?;
    result.vertex_index = vertex;
    Ok(result)
}

/// Mean of the three positions.
#[must_use]
pub fn centroid(points: &[Point3; 3]) -> Point3 {
    Point3::from((points[0].coords + points[1].coords + points[2].coords) / 3.0)
}
