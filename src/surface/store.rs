use slotmap::SlotMap;

use crate::math::intersect_3d::ray_triangle_intersect;
use crate::math::{Matrix4, Point3, Ray, Vector3, TOLERANCE};

use super::probe::transform_normal;
use super::{MeshView, RayHit, SurfaceQuery, SurfaceSample};

slotmap::new_key_type! {
    /// Unique identifier for a surface in the surface store.
    pub struct SurfaceId;
}

/// A triangle mesh placed in the world on a single layer.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    vertices: Vec<Point3>,
    normals: Vec<Vector3>,
    triangles: Vec<[u32; 3]>,
    local_to_world: Matrix4,
    world_to_local: Option<Matrix4>,
    layer: u8,
    mesh_access: bool,
}

impl SurfaceData {
    /// Creates a surface from local-space vertices and triangles.
    ///
    /// Vertex normals are area-weighted averages of the adjacent face
    /// normals. Triangles referencing missing vertices are dropped.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        let triangles: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|t| t.iter().all(|&i| (i as usize) < vertices.len()))
            .collect();
        let normals = vertex_normals(&vertices, &triangles);
        Self {
            vertices,
            normals,
            triangles,
            local_to_world: Matrix4::identity(),
            world_to_local: Some(Matrix4::identity()),
            layer: 0,
            mesh_access: true,
        }
    }

    /// A square of side `size` in the local XZ plane, centered on the origin, facing +Y.
    #[must_use]
    pub fn quad(size: f64) -> Self {
        let h = size * 0.5;
        Self::new(
            vec![
                Point3::new(-h, 0.0, -h),
                Point3::new(h, 0.0, -h),
                Point3::new(h, 0.0, h),
                Point3::new(-h, 0.0, h),
            ],
            vec![[0, 2, 1], [0, 3, 2]],
        )
    }

    /// Places the surface in the world.
    #[must_use]
    pub fn with_transform(mut self, local_to_world: Matrix4) -> Self {
        self.local_to_world = local_to_world;
        self.world_to_local = local_to_world.try_inverse();
        self
    }

    /// Moves the surface to `layer` (0..=31).
    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer.min(31);
        self
    }

    /// Replaces the computed vertex normals.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vector3>) -> Self {
        self.normals = normals;
        self
    }

    /// Hides the vertex data so the surface is hittable but not snappable.
    #[must_use]
    pub fn without_mesh_access(mut self) -> Self {
        self.mesh_access = false;
        self
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn local_to_world(&self) -> &Matrix4 {
        &self.local_to_world
    }

    fn layer_bit(&self) -> u32 {
        1 << self.layer
    }

    /// Nearest hit of a world ray against this surface.
    fn intersect(&self, ray: &Ray) -> Option<(f64, SurfaceSample)> {
        let world_to_local = self.world_to_local?;
        let local_origin = world_to_local.transform_point(&ray.origin);
        let local_dir = world_to_local.transform_vector(&ray.direction);
        let local_ray = Ray::new(local_origin, local_dir).ok()?;

        let mut best: Option<(f64, usize)> = None;
        for (i, tri) in self.triangles.iter().enumerate() {
            let [a, b, c] = tri.map(|k| self.vertices[k as usize]);
            if let Some(hit) = ray_triangle_intersect(&local_ray, &a, &b, &c) {
                if best.is_none_or(|(t, _)| hit.t < t) {
                    best = Some((hit.t, i));
                }
            }
        }
        let (t, index) = best?;

        let world_point = self.local_to_world.transform_point(&local_ray.at(t));
        let [a, b, c] = self.triangles[index].map(|k| self.vertices[k as usize]);
        let face_normal = (b - a).cross(&(c - a));
        let normal = transform_normal(&self.local_to_world, &face_normal)?;
        let distance = (world_point - ray.origin).norm();
        Some((distance, SurfaceSample::new(world_point, normal)))
    }
}

/// Area-weighted vertex normals; isolated vertices get a zero normal.
fn vertex_normals(vertices: &[Point3], triangles: &[[u32; 3]]) -> Vec<Vector3> {
    let mut normals = vec![Vector3::zeros(); vertices.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|k| vertices[k as usize]);
        let n = (b - a).cross(&(c - a));
        for &k in tri {
            normals[k as usize] += n;
        }
    }
    for n in &mut normals {
        if let Some(unit) = n.try_normalize(TOLERANCE) {
            *n = unit;
        }
    }
    normals
}

/// In-memory arena of ray-castable surfaces.
///
/// Serves as the physics backend for hosts that have none, and for tests.
#[derive(Debug, Default)]
pub struct SurfaceStore {
    surfaces: SlotMap<SurfaceId, SurfaceData>,
}

impl SurfaceStore {
    /// Creates a new, empty surface store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a surface and returns its ID.
    pub fn add(&mut self, data: SurfaceData) -> SurfaceId {
        self.surfaces.insert(data)
    }

    /// Removes a surface, returning its data if it existed.
    pub fn remove(&mut self, id: SurfaceId) -> Option<SurfaceData> {
        self.surfaces.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&SurfaceData> {
        self.surfaces.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(id)
    }

    /// Replaces a surface's placement, e.g. after the host rotates the model.
    ///
    /// Returns `false` if the surface does not exist.
    pub fn set_transform(&mut self, id: SurfaceId, local_to_world: Matrix4) -> bool {
        match self.surfaces.get_mut(id) {
            Some(surface) => {
                surface.local_to_world = local_to_world;
                surface.world_to_local = local_to_world.try_inverse();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SurfaceQuery for SurfaceStore {
    type Collider = SurfaceId;

    fn cast_ray(&self, ray: &Ray, max_distance: f64, layer_mask: u32) -> Option<RayHit<SurfaceId>> {
        self.surfaces
            .iter()
            .filter(|(_, s)| s.layer_bit() & layer_mask != 0)
            .filter_map(|(id, s)| s.intersect(ray).map(|(d, sample)| (id, d, sample)))
            .filter(|&(_, d, _)| d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(collider, distance, sample)| RayHit {
                sample,
                distance,
                collider,
            })
    }

    fn mesh(&self, collider: SurfaceId) -> Option<MeshView<'_>> {
        let surface = self.surfaces.get(collider)?;
        if !surface.mesh_access {
            return None;
        }
        Some(MeshView {
            vertices: &surface.vertices,
            normals: &surface.normals,
            local_to_world: surface.local_to_world,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn down(x: f64, z: f64) -> Ray {
        Ray::new(p(x, 5.0, z), Vector3::new(0.0, -1.0, 0.0)).unwrap()
    }

    #[test]
    fn quad_faces_up() {
        let mut store = SurfaceStore::new();
        let id = store.add(SurfaceData::quad(2.0));
        let hit = store.cast_ray(&down(0.25, -0.5), 100.0, u32::MAX).unwrap();
        assert_eq!(hit.collider, id);
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-12);
        assert_relative_eq!(hit.sample.position, p(0.25, 0.0, -0.5), epsilon = 1e-12);
        assert_relative_eq!(hit.sample.normal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn nearest_surface_wins() {
        let mut store = SurfaceStore::new();
        store.add(SurfaceData::quad(2.0));
        let upper = store.add(
            SurfaceData::quad(2.0).with_transform(Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0))),
        );
        let hit = store.cast_ray(&down(0.0, 0.0), 100.0, u32::MAX).unwrap();
        assert_eq!(hit.collider, upper);
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn layer_mask_filters_surfaces() {
        let mut store = SurfaceStore::new();
        store.add(SurfaceData::quad(2.0).with_layer(3));
        assert!(store.cast_ray(&down(0.0, 0.0), 100.0, 1 << 3).is_some());
        assert!(store.cast_ray(&down(0.0, 0.0), 100.0, 1).is_none());
    }

    #[test]
    fn transformed_surface_reports_world_normal() {
        let mut store = SurfaceStore::new();
        // Rotate the quad so it faces +Z, then push it back to z = -2.
        let rot = Matrix4::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let placed = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -2.0)) * rot;
        store.add(SurfaceData::quad(2.0).with_transform(placed));

        let ray = Ray::new(p(0.1, 0.2, 3.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hit = store.cast_ray(&ray, 100.0, u32::MAX).unwrap();
        assert_relative_eq!(hit.sample.position, p(0.1, 0.2, -2.0), epsilon = 1e-9);
        assert_relative_eq!(hit.sample.normal, Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn hidden_mesh_is_not_snappable() {
        let mut store = SurfaceStore::new();
        let id = store.add(SurfaceData::quad(2.0).without_mesh_access());
        assert!(store.cast_ray(&down(0.0, 0.0), 100.0, 1).is_some());
        assert!(store.mesh(id).is_none());
    }

    #[test]
    fn set_transform_moves_surface() {
        let mut store = SurfaceStore::new();
        let id = store.add(SurfaceData::quad(2.0));
        assert!(store.set_transform(id, Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0))));
        assert!(store.cast_ray(&down(0.0, 0.0), 100.0, u32::MAX).is_none());
        assert!(store.cast_ray(&down(10.0, 0.0), 100.0, u32::MAX).is_some());
    }
}
