//! Ray picking and 2D containment tests over scene geometry.

use crate::error::GeometryError;
use crate::geometry::{Point, Shape, Triangle};
use crate::mat4::Mat4;
use crate::vec3::{add, cross, distance, dot, scale, sub, Vec3};

/// Tolerance for the parallel test and for hits at the ray origin.
pub const EPSILON: f32 = f32::EPSILON;

/// How the points of a `Ray` pair up into individual rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayKind {
    /// Point 0 is the shared origin; every later point is a target.
    Centered,
    /// Points `(2n, 2n + 1)` form independent origin/target pairs.
    Strip,
}

/// A transient set of world-space rays. Each ray starts at its origin and
/// passes through its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    pub points: Vec<Vec3>,
    pub kind: RayKind,
}

impl Ray {
    /// Build a ray set from model-space points, moving them into world space.
    pub fn new(kind: RayKind, model: &Mat4, points: &[Vec3]) -> Self {
        Self {
            points: points.iter().map(|p| model.transform_point(*p)).collect(),
            kind,
        }
    }

    /// Picking ray under a cursor at normalized device coordinates, running
    /// from the near plane to the far plane. `None` when the view-projection
    /// matrix is singular.
    pub fn from_cursor(ndc_x: f32, ndc_y: f32, view_proj: &Mat4) -> Option<Self> {
        let inv = view_proj.inverse()?;
        let near = inv.transform_point(Vec3::new(ndc_x, ndc_y, -1.0));
        let far = inv.transform_point(Vec3::new(ndc_x, ndc_y, 1.0));
        Some(Self {
            points: vec![near, far],
            kind: RayKind::Centered,
        })
    }

    /// `(origin, target)` pairs according to the ray kind.
    pub fn segments(&self) -> Vec<(Vec3, Vec3)> {
        match self.kind {
            RayKind::Centered => match self.points.split_first() {
                Some((origin, rest)) => rest.iter().map(|t| (*origin, *t)).collect(),
                None => Vec::new(),
            },
            RayKind::Strip => self
                .points
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect(),
        }
    }
}

/// Where a ray met a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    /// Distance along the direction vector, in units of its length.
    pub t: f32,
    /// Barycentric weight of `v1`.
    pub u: f32,
    /// Barycentric weight of `v2`.
    pub v: f32,
}

/// Two-sided Moller-Trumbore test. A ray parallel to the triangle plane is
/// reported as `SingularRay`; a miss is `Ok(None)`.
pub fn ray_triangle_checked(
    origin: Vec3,
    direction: Vec3,
    tri: &Triangle,
) -> Result<Option<Hit>, GeometryError> {
    let edge1 = sub(tri[1], tri[0]);
    let edge2 = sub(tri[2], tri[0]);
    let h = cross(direction, edge2);
    let a = dot(edge1, h);
    if a.abs() < EPSILON {
        return Err(GeometryError::SingularRay);
    }

    let f = 1.0 / a;
    let s = sub(origin, tri[0]);
    let u = f * dot(s, h);
    if !(0.0..=1.0).contains(&u) {
        return Ok(None);
    }

    let q = cross(s, edge1);
    let v = f * dot(direction, q);
    if v < 0.0 || u + v > 1.0 {
        return Ok(None);
    }

    let t = f * dot(edge2, q);
    if t > EPSILON {
        Ok(Some(Hit {
            point: add(origin, scale(direction, t)),
            t,
            u,
            v,
        }))
    } else {
        Ok(None)
    }
}

/// Same as `ray_triangle_checked`, with a parallel ray counted as a miss.
#[inline]
pub fn ray_triangle(origin: Vec3, direction: Vec3, tri: &Triangle) -> Option<Hit> {
    ray_triangle_checked(origin, direction, tri).unwrap_or(None)
}

/// Which triangle a sub-ray reports when it crosses several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPolicy {
    /// The first triangle in triangulation order.
    #[default]
    First,
    /// The hit closest to the ray origin.
    Nearest,
}

/// One sub-ray's contact with a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Index of the sub-ray within `Ray::segments`.
    pub ray_index: usize,
    pub hit: Hit,
    /// The world-space triangle that was hit.
    pub triangle: Triangle,
}

/// Test every sub-ray of `ray` against the world-space triangles of `shape`,
/// reporting the first hit per sub-ray.
pub fn poly_collide(ray: &Ray, shape: &Shape) -> Vec<RayHit> {
    poly_collide_with(ray, shape, HitPolicy::First)
}

pub fn poly_collide_with(ray: &Ray, shape: &Shape, policy: HitPolicy) -> Vec<RayHit> {
    let triangles = shape.world_triangles();
    let mut hits = Vec::new();

    for (ray_index, (origin, target)) in ray.segments().into_iter().enumerate() {
        let direction = sub(target, origin);
        let mut found: Option<RayHit> = None;

        for tri in &triangles {
            let Some(hit) = ray_triangle(origin, direction, tri) else {
                continue;
            };
            let candidate = RayHit {
                ray_index,
                hit,
                triangle: *tri,
            };
            match policy {
                HitPolicy::First => {
                    found = Some(candidate);
                    break;
                }
                HitPolicy::Nearest => {
                    let closer = found
                        .map(|f| distance(origin, hit.point) < distance(origin, f.hit.point))
                        .unwrap_or(true);
                    if closer {
                        found = Some(candidate);
                    }
                }
            }
        }

        if let Some(h) = found {
            hits.push(h);
        }
    }

    hits
}

/// Even-odd crossing test in the XY plane over the polygon's vertices in
/// their original order.
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    let (px, py) = (point.x(), point.y());
    let mut inside = false;
    let n = polygon.len();

    for i in 0..n {
        let vc = &polygon[i];
        let vn = &polygon[(i + 1) % n];
        if (vc.y() > py) != (vn.y() > py)
            && px < (vn.x() - vc.x()) * (py - vc.y()) / (vn.y() - vc.y()) + vc.x()
        {
            inside = !inside;
        }
    }

    inside
}

/// `point_in_polygon` over a shape's untriangulated points.
pub fn point_in_shape(point: &Point, shape: &Shape) -> bool {
    point_in_polygon(point, shape.points())
}
