mod arc_fan;
mod marker_line;

pub use arc_fan::ArcFan;
pub use marker_line::MarkerLine;

use crate::math::{Point3, Vector3};

/// A polyline drawn through marker positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    /// The ordered vertices of the polyline.
    pub points: Vec<Point3>,
}

/// A triangle mesh ready for upload to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// A mesh with no triangles means "clear the arc".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
