use super::{Point3, Ray, Vector3, TOLERANCE};

/// A ray hit against a single triangle.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray.
    pub t: f64,
    /// Barycentric weight of the second vertex.
    pub u: f64,
    /// Barycentric weight of the third vertex.
    pub v: f64,
}

/// Intersects a ray with the triangle `(a, b, c)` (Möller–Trumbore).
///
/// Both faces are hit. Returns `None` when the ray is parallel to the
/// triangle plane, misses the triangle, or the hit lies behind the origin.
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, a: &Point3, b: &Point3, c: &Point3) -> Option<TriangleHit> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < TOLERANCE {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some(TriangleHit { t, u, v })
}

/// Returns the nearest non-negative distance at which `ray` enters the sphere.
///
/// A ray starting inside the sphere reports `0.0`.
#[must_use]
pub fn ray_sphere_intersect(ray: &Ray, center: &Point3, radius: f64) -> Option<f64> {
    let oc: Vector3 = ray.origin - center;
    let b = oc.dot(&ray.direction);
    let c = oc.norm_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    // Origin outside and pointing away.
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}
