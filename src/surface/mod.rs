//! Surface sampling: the ray-cast collaborator seam and its helpers.

pub mod probe;
pub mod store;

pub use probe::{nearest_vertex, SurfaceProbe};
pub use store::{SurfaceData, SurfaceId, SurfaceStore};

use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Point3, Ray, Vector3};

/// A point on a surface together with its unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSample {
    pub position: Point3,
    pub normal: Vector3,
}

impl SurfaceSample {
    /// Creates a sample, normalizing `normal`.
    ///
    /// A zero normal is kept as-is so that callers can detect it.
    #[must_use]
    pub fn new(position: Point3, normal: Vector3) -> Self {
        let normal = normal.try_normalize(0.0).unwrap_or(normal);
        Self { position, normal }
    }

    /// Returns `true` if the position is finite and the normal is unit length.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|c| c.is_finite()) && (self.normal.norm() - 1.0).abs() < 1e-6
    }
}

/// Result of a successful ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<C> {
    pub sample: SurfaceSample,
    /// Distance along the ray.
    pub distance: f64,
    /// The collider that was hit.
    pub collider: C,
}

/// Read-only view of a collider's mesh in its local space.
#[derive(Debug, Clone, Copy)]
pub struct MeshView<'a> {
    pub vertices: &'a [Point3],
    /// Per-vertex normals; may be empty when the mesh carries none.
    pub normals: &'a [Vector3],
    pub local_to_world: Matrix4,
}

/// Ray casting and mesh access provided by the host's physics layer.
pub trait SurfaceQuery {
    /// Opaque handle identifying a collider.
    type Collider: Copy + Eq + std::fmt::Debug;

    /// Casts `ray` against colliders on the layers in `layer_mask` and
    /// returns the nearest hit within `max_distance`.
    fn cast_ray(&self, ray: &Ray, max_distance: f64, layer_mask: u32) -> Option<RayHit<Self::Collider>>;

    /// Returns the mesh behind `collider`, if it exposes one.
    fn mesh(&self, collider: Self::Collider) -> Option<MeshView<'_>>;
}
