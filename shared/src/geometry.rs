//! Scene geometry: points, topology-tagged shapes and triangulation.
//!
//! `Point` is a plain value. Its `with_*` methods build a new point and never
//! touch the receiver. A `Shape` owns its points outright and caches its
//! triangulation until the points or the topology change.

use std::cell::OnceCell;

use crate::error::GeometryError;
use crate::mat4::Mat4;
use crate::vec3::{self, lerp, mul_elem, normalize, Vec3};

/// Floats per packed vertex: position, color, normal, texture, threshold.
pub const VERTEX_FLOATS: usize = 13;
/// Bytes per packed vertex.
pub const VERTEX_STRIDE: usize = VERTEX_FLOATS * 4;

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Three world- or model-space corners.
pub type Triangle = [Vec3; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub position: Vec3,
    /// RGBA, each channel in [0, 1].
    pub color: [f32; 4],
    /// Unit length by convention.
    pub normal: Vec3,
    pub tex: [f32; 2],
    /// Texture-space radius up to which the color does not fade.
    pub threshold: f32,
}

impl Default for Point {
    fn default() -> Self {
        Point::new(0.0, 0.0, 0.0)
    }
}

impl Point {
    /// White point facing +Z.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            color: WHITE,
            normal: Vec3::UNIT_Z,
            tex: [0.0, 0.0],
            threshold: 0.0,
        }
    }

    pub fn colored(x: f32, y: f32, z: f32, color: [f32; 4]) -> Self {
        Self {
            color,
            ..Self::new(x, y, z)
        }
    }

    /// The normal is normalized on the way in.
    pub fn lit(position: Vec3, color: [f32; 4], normal: Vec3) -> Self {
        Self {
            position,
            color,
            normal: normalize(normal),
            tex: [0.0, 0.0],
            threshold: 0.0,
        }
    }

    pub fn textured(position: Vec3, color: [f32; 4], normal: Vec3, tex: [f32; 2]) -> Self {
        Self {
            tex,
            ..Self::lit(position, color, normal)
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.position.z
    }

    pub fn with_position(&self, x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..*self
        }
    }

    pub fn with_color(&self, color: [f32; 4]) -> Self {
        Self { color, ..*self }
    }

    /// Stored as given, without normalizing.
    pub fn with_normal(&self, normal: Vec3) -> Self {
        Self { normal, ..*self }
    }

    pub fn with_tex(&self, u: f32, v: f32) -> Self {
        Self {
            tex: [u, v],
            ..*self
        }
    }

    pub fn with_threshold(&self, threshold: f32) -> Self {
        Self { threshold, ..*self }
    }

    /// Copies of `points` translated by this point's position.
    pub fn offset_all(&self, points: &[Point]) -> Vec<Point> {
        points
            .iter()
            .map(|p| Point {
                position: vec3::add(p.position, self.position),
                ..*p
            })
            .collect()
    }

    /// Scale the position per axis. Prefer a model matrix for anything
    /// rendered every frame.
    pub fn rescale(&self, x: f32, y: f32, z: f32) -> Self {
        Self {
            position: mul_elem(self.position, Vec3::new(x, y, z)),
            ..*self
        }
    }

    /// Position, color, normal and texture coordinates as 12 floats.
    pub fn to_floats(&self) -> [f32; 12] {
        let p = self.position;
        let c = self.color;
        let n = self.normal;
        [
            p.x, p.y, p.z, c[0], c[1], c[2], c[3], n.x, n.y, n.z, self.tex[0], self.tex[1],
        ]
    }
}

/// How a shape's point list is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    pub fn is_triangulable(self) -> bool {
        matches!(
            self,
            Topology::Triangles | Topology::TriangleStrip | Topology::TriangleFan
        )
    }
}

/// Split a point list into triangles according to `topology`.
///
/// Triangle lists drop a trailing partial triangle. Strips keep the order
/// `(i, i + 1, i + 2)` for every window; fans pivot on point 0. Fewer than
/// three points, or a point or line topology, gives no triangles.
pub fn triangulate(topology: Topology, points: &[Point]) -> Vec<Triangle> {
    try_triangulate(topology, points).unwrap_or_else(|err| {
        tracing::trace!("triangulation skipped: {}", err);
        Vec::new()
    })
}

/// Like [`triangulate`], but reports why a point list has no triangles.
pub fn try_triangulate(
    topology: Topology,
    points: &[Point],
) -> Result<Vec<Triangle>, GeometryError> {
    if !topology.is_triangulable() {
        return Err(GeometryError::UnsupportedTopology(topology));
    }
    if points.len() < 3 {
        return Err(GeometryError::DegenerateShape {
            topology,
            required: 3,
            actual: points.len(),
        });
    }

    let tris = match topology {
        Topology::Triangles => points
            .chunks_exact(3)
            .map(|c| [c[0].position, c[1].position, c[2].position])
            .collect(),
        Topology::TriangleFan => {
            let pivot = points[0].position;
            points[1..]
                .windows(2)
                .map(|w| [pivot, w[0].position, w[1].position])
                .collect()
        }
        Topology::TriangleStrip => points
            .windows(3)
            .map(|w| [w[0].position, w[1].position, w[2].position])
            .collect(),
        _ => Vec::new(),
    };
    Ok(tris)
}

/// An owned, topology-tagged point list with a model transform.
#[derive(Debug, Clone)]
pub struct Shape {
    points: Vec<Point>,
    pub model: Mat4,
    topology: Topology,
    triangulated: OnceCell<Vec<Triangle>>,
}

impl Shape {
    pub fn new(model: Mat4, topology: Topology, points: Vec<Point>) -> Self {
        Self {
            points,
            model,
            topology,
            triangulated: OnceCell::new(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
        self.triangulated = OnceCell::new();
    }

    pub fn extend<I: IntoIterator<Item = Point>>(&mut self, points: I) {
        self.points.extend(points);
        self.triangulated = OnceCell::new();
    }

    /// Model-space triangles, computed on first use. Shapes that cannot be
    /// triangulated yield an empty slice.
    pub fn triangulated(&self) -> &[Triangle] {
        self.triangulated
            .get_or_init(|| triangulate(self.topology, &self.points))
    }

    pub fn try_triangulate(&self) -> Result<Vec<Triangle>, GeometryError> {
        try_triangulate(self.topology, &self.points)
    }

    /// Triangles transformed by the model matrix.
    pub fn world_triangles(&self) -> Vec<Triangle> {
        self.triangulated()
            .iter()
            .map(|t| {
                [
                    self.model.transform_point(t[0]),
                    self.model.transform_point(t[1]),
                    self.model.transform_point(t[2]),
                ]
            })
            .collect()
    }

    /// A new shape with every point scaled and an identity transform.
    pub fn rescale(&self, x: f32, y: f32, z: f32) -> Shape {
        Shape::new(
            Mat4::IDENTITY,
            self.topology,
            self.points.iter().map(|p| p.rescale(x, y, z)).collect(),
        )
    }

    /// Interleaved native-endian vertex data, `VERTEX_STRIDE` bytes per point.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.points.len() * VERTEX_STRIDE);
        for p in &self.points {
            for f in p.to_floats() {
                out.extend_from_slice(&f.to_ne_bytes());
            }
            out.extend_from_slice(&p.threshold.to_ne_bytes());
        }
        out
    }
}

/// Expand a line strip into independent segment pairs.
pub fn line_strip_to_segments(points: &[Point]) -> Vec<Point> {
    points.windows(2).flat_map(|w| [w[0], w[1]]).collect()
}

fn curve_samples(step: f32) -> impl Iterator<Item = f32> {
    let count = if step.is_finite() && step > 0.0 {
        (1.0 / step).ceil() as usize
    } else {
        0
    };
    (0..count).map(move |i| i as f32 * step).filter(|t| *t < 1.0)
}

/// Sample a quadratic Bezier at `t = 0, step, 2 * step, ...` below 1.
pub fn quadratic_bezier(step: f32, c0: Vec3, c1: Vec3, c2: Vec3) -> Vec<Point> {
    curve_samples(step)
        .map(|t| {
            let p = lerp(lerp(c0, c1, t), lerp(c1, c2, t), t);
            Point::new(p.x, p.y, p.z)
        })
        .collect()
}

/// Sample a cubic Bezier at `t = 0, step, 2 * step, ...` below 1.
pub fn cubic_bezier(step: f32, c0: Vec3, c1: Vec3, c2: Vec3, c3: Vec3) -> Vec<Point> {
    curve_samples(step)
        .map(|t| {
            let a = lerp(c0, c1, t);
            let b = lerp(c1, c2, t);
            let c = lerp(c2, c3, t);
            let p = lerp(lerp(a, b, t), lerp(b, c, t), t);
            Point::new(p.x, p.y, p.z)
        })
        .collect()
}

/// Unit cube corners used for snake segments and food, drawn as a line loop.
pub fn cube_outline(color: [f32; 4]) -> Shape {
    let corners = [
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
        (-1.0, -1.0, 1.0),
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (1.0, -1.0, 1.0),
        (-1.0, 1.0, -1.0),
    ];
    Shape::new(
        Mat4::IDENTITY,
        Topology::LineLoop,
        corners
            .iter()
            .map(|&(x, y, z)| Point::colored(x, y, z, color))
            .collect(),
    )
}
