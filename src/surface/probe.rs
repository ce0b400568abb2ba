use tracing::{debug, warn};

use crate::math::{Matrix4, Ray, Vector3, TOLERANCE};

use super::{MeshView, RayHit, SurfaceQuery, SurfaceSample};

/// Bounded, layer-filtered ray cast against the host's surfaces.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProbe {
    max_distance: f64,
    layer_mask: u32,
}

impl SurfaceProbe {
    /// Creates a new `SurfaceProbe`.
    #[must_use]
    pub fn new(max_distance: f64, layer_mask: u32) -> Self {
        Self {
            max_distance,
            layer_mask,
        }
    }

    /// Casts `ray` and returns the hit, or `None` when nothing on the
    /// filtered layers lies within range.
    ///
    /// The hit normal is renormalized; a hit whose normal cannot be
    /// normalized or whose position is not finite counts as a miss.
    pub fn probe<S: SurfaceQuery>(&self, surfaces: &S, ray: &Ray) -> Option<RayHit<S::Collider>> {
        let hit = surfaces.cast_ray(ray, self.max_distance, self.layer_mask)?;
        if hit.distance > self.max_distance {
            return None;
        }
        let sample = SurfaceSample::new(hit.sample.position, hit.sample.normal);
        if !sample.is_valid() {
            debug!(collider = ?hit.collider, normal = ?hit.sample.normal, "unusable hit sample, ignored");
            return None;
        }
        Some(RayHit { sample, ..hit })
    }

    /// Snaps `hit` to the nearest vertex of the collider's mesh.
    ///
    /// Returns the raw sample and `false` when the collider exposes no
    /// usable mesh.
    pub fn snap<S: SurfaceQuery>(&self, surfaces: &S, hit: &RayHit<S::Collider>) -> (SurfaceSample, bool) {
        let snapped = surfaces
            .mesh(hit.collider)
            .and_then(|mesh| nearest_vertex(&hit.sample, &mesh));
        match snapped {
            Some(sample) => {
                debug!(?sample.position, "snapped to mesh vertex");
                (sample, true)
            }
            None => {
                warn!(collider = ?hit.collider, "no mesh data to snap to, keeping raw hit");
                (hit.sample, false)
            }
        }
    }
}

/// Finds the mesh vertex closest to `sample` and returns it in world space.
///
/// The scan runs in the mesh's local space by squared distance; on exact
/// ties the first vertex in mesh order wins. The vertex's stored normal is
/// carried over when present, otherwise the sample's normal is kept.
///
/// Returns `None` if the mesh has no vertices or its transform is singular.
#[must_use]
pub fn nearest_vertex(sample: &SurfaceSample, mesh: &MeshView<'_>) -> Option<SurfaceSample> {
    let world_to_local = mesh.local_to_world.try_inverse()?;
    let local_point = world_to_local.transform_point(&sample.position);

    let mut best: Option<(usize, f64)> = None;
    for (i, v) in mesh.vertices.iter().enumerate() {
        let d = (v - local_point).norm_squared();
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    let (index, _) = best?;

    let position = mesh.local_to_world.transform_point(&mesh.vertices[index]);
    let normal = match mesh.normals.get(index) {
        Some(n) => transform_normal(&mesh.local_to_world, n).unwrap_or(sample.normal),
        None => sample.normal,
    };
    Some(SurfaceSample::new(position, normal))
}

/// Transforms a local-space normal to world space (inverse transpose).
pub(crate) fn transform_normal(local_to_world: &Matrix4, normal: &Vector3) -> Option<Vector3> {
    let linear = local_to_world.fixed_view::<3, 3>(0, 0).into_owned();
    let normal_matrix = linear.try_inverse()?.transpose();
    (normal_matrix * normal).try_normalize(TOLERANCE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Point3;
    use crate::surface::{SurfaceData, SurfaceId, SurfaceStore};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tri_vertices() -> Vec<Point3> {
        vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]
    }

    #[test]
    fn snaps_to_nearest_by_squared_distance() {
        let vertices = tri_vertices();
        let normals = vec![Vector3::z(); 3];
        let mesh = MeshView {
            vertices: &vertices,
            normals: &normals,
            local_to_world: Matrix4::identity(),
        };
        let sample = SurfaceSample::new(p(0.1, 0.1, 0.0), Vector3::z());
        let snapped = nearest_vertex(&sample, &mesh).unwrap();
        assert_relative_eq!(snapped.position, p(0.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn tie_goes_to_first_vertex() {
        let vertices = tri_vertices();
        let mesh = MeshView {
            vertices: &vertices,
            normals: &[],
            local_to_world: Matrix4::identity(),
        };
        // Equidistant from vertex 1 and vertex 2.
        let sample = SurfaceSample::new(p(1.0, 1.0, 0.0), Vector3::z());
        let snapped = nearest_vertex(&sample, &mesh).unwrap();
        assert_relative_eq!(snapped.position, p(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(snapped.normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn snap_respects_transform() {
        let vertices = tri_vertices();
        let normals = vec![Vector3::z(); 3];
        let local_to_world = Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 2.0, 2.0));
        let mesh = MeshView {
            vertices: &vertices,
            normals: &normals,
            local_to_world,
        };
        let sample = SurfaceSample::new(p(11.8, 0.1, 0.0), Vector3::z());
        let snapped = nearest_vertex(&sample, &mesh).unwrap();
        assert_relative_eq!(snapped.position, p(12.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(snapped.normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn empty_mesh_has_no_snap_target() {
        let mesh = MeshView {
            vertices: &[],
            normals: &[],
            local_to_world: Matrix4::identity(),
        };
        let sample = SurfaceSample::new(p(0.0, 0.0, 0.0), Vector3::z());
        assert!(nearest_vertex(&sample, &mesh).is_none());
    }

    #[test]
    fn probe_respects_max_distance() {
        let mut store = SurfaceStore::new();
        store.add(SurfaceData::quad(2.0));
        let ray = Ray::new(p(0.0, 5.0, 0.0), -Vector3::y()).unwrap();

        assert!(SurfaceProbe::new(10.0, u32::MAX).probe(&store, &ray).is_some());
        assert!(SurfaceProbe::new(1.0, u32::MAX).probe(&store, &ray).is_none());
    }

    /// Wraps a store and distorts the normals it reports.
    struct ScaledNormals {
        inner: SurfaceStore,
        scale: f64,
    }

    impl SurfaceQuery for ScaledNormals {
        type Collider = SurfaceId;

        fn cast_ray(&self, ray: &Ray, max_distance: f64, layer_mask: u32) -> Option<RayHit<SurfaceId>> {
            let mut hit = self.inner.cast_ray(ray, max_distance, layer_mask)?;
            hit.sample.normal *= self.scale;
            Some(hit)
        }

        fn mesh(&self, collider: SurfaceId) -> Option<MeshView<'_>> {
            self.inner.mesh(collider)
        }
    }

    fn scaled_store(scale: f64) -> ScaledNormals {
        let mut inner = SurfaceStore::new();
        inner.add(SurfaceData::quad(2.0));
        ScaledNormals { inner, scale }
    }

    #[test]
    fn probe_renormalizes_host_normals() {
        let ray = Ray::new(p(0.0, 5.0, 0.0), -Vector3::y()).unwrap();
        let hit = SurfaceProbe::new(10.0, u32::MAX).probe(&scaled_store(2.0), &ray).unwrap();
        assert!(hit.sample.is_valid());
        assert_relative_eq!(hit.sample.normal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn zero_or_nan_normal_is_a_miss() {
        let ray = Ray::new(p(0.0, 5.0, 0.0), -Vector3::y()).unwrap();
        let probe = SurfaceProbe::new(10.0, u32::MAX);
        assert!(probe.probe(&scaled_store(0.0), &ray).is_none());
        assert!(probe.probe(&scaled_store(f64::NAN), &ray).is_none());
    }

    #[test]
    fn snap_falls_back_without_mesh() {
        let mut store = SurfaceStore::new();
        let id = store.add(SurfaceData::quad(2.0));
        let probe = SurfaceProbe::new(10.0, u32::MAX);
        let ray = Ray::new(p(0.3, 5.0, 0.2), -Vector3::y()).unwrap();
        let mut hit = probe.probe(&store, &ray).unwrap();
        assert_eq!(hit.collider, id);

        store.remove(id);
        hit.sample.position = p(0.3, 0.0, 0.2);
        let (sample, snapped) = probe.snap(&store, &hit);
        assert!(!snapped);
        assert_eq!(sample, hit.sample);
    }
}
