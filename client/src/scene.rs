//! Scene assembly from decoded frames, camera picking, and the render seam.

use std::rc::Rc;

use snek_shared::collision::{poly_collide_with, HitPolicy, Ray};
use snek_shared::frame::Frame;
use snek_shared::geometry::{cube_outline, Point, Shape, Topology, RED};
use snek_shared::mat4::Mat4;
use snek_shared::protocol::Handshake;
use snek_shared::vec3::{distance, Vec3};

/// Quads of the `[-1, 1]` cube, corner `i` at `(±1, ±1, ±1)` by bits x=1 y=2 z=4.
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 2, 6, 4],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 1, 3, 2],
    [4, 5, 7, 6],
];

fn cube_corner(i: usize) -> Vec3 {
    let s = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
    Vec3::new(s(1), s(2), s(4))
}

/// Solid cube as a triangle list, used as the pick target.
pub fn cube_hull() -> Shape {
    let mut points = Vec::with_capacity(36);
    for [a, b, c, d] in CUBE_FACES {
        for i in [a, b, c, a, c, d] {
            let p = cube_corner(i);
            points.push(Point::new(p.x, p.y, p.z));
        }
    }
    Shape::new(Mat4::IDENTITY, Topology::Triangles, points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Food,
    /// Body segment index, head first.
    Body(usize),
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub center: Vec3,
    pub outline: Shape,
    pub hull: Shape,
}

impl SceneObject {
    fn cube(kind: ObjectKind, center: Vec3, half: Vec3, color: [f32; 4]) -> Self {
        let model = Mat4::translation(center.x, center.y, center.z)
            .mul(&Mat4::scaling(half.x, half.y, half.z));
        let mut outline = cube_outline(color);
        outline.model = model;
        let mut hull = cube_hull();
        hull.model = model;
        Self {
            kind,
            center,
            outline,
            hull,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: [f32; 4],
    pub objects: Vec<SceneObject>,
    pub score: Option<u32>,
    /// Static point cloud drawn behind the snake.
    pub backdrop: Option<Rc<Shape>>,
}

impl Scene {
    /// Food becomes a red cube, body segments keep their decoded color
    /// (white unless the stream carries colors). Each cube spans
    /// one grid cell of the world.
    pub fn from_frame(handshake: &Handshake, frame: &Frame, normalized: bool) -> Self {
        let half = if normalized {
            let b = handshake.bounds;
            Vec3::new(
                0.5 / b.divisor(0) as f32,
                0.5 / b.divisor(1) as f32,
                0.5 / b.divisor(2) as f32,
            )
        } else {
            Vec3::new(0.5, 0.5, 0.5)
        };

        let mut objects = Vec::with_capacity(frame.points.len());
        if let Some(food) = frame.food() {
            objects.push(SceneObject::cube(ObjectKind::Food, food.position, half, RED));
        }
        for (i, p) in frame.body().iter().enumerate() {
            objects.push(SceneObject::cube(ObjectKind::Body(i), p.position, half, p.color));
        }

        Self {
            background: handshake.background.to_rgba(),
            objects,
            score: frame.score,
            backdrop: None,
        }
    }

    pub fn snake_len(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Body(_)))
            .count()
    }

    /// Nearest object under the cursor.
    pub fn pick(&self, camera: &Camera, ndc_x: f32, ndc_y: f32) -> Option<Picked> {
        let ray = Ray::from_cursor(ndc_x, ndc_y, &camera.view_proj())?;
        let origin = ray.points[0];
        self.objects
            .iter()
            .filter_map(|o| {
                poly_collide_with(&ray, &o.hull, HitPolicy::Nearest)
                    .first()
                    .map(|h| Picked {
                        kind: o.kind,
                        point: h.hit.point,
                        distance: distance(origin, h.hit.point),
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picked {
    pub kind: ObjectKind,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.5, 0.5, 2.5),
            target: Vec3::new(0.5, 0.5, 0.5),
            up: Vec3::new(0.0, 1.0, 0.0),
            fovy: std::f32::consts::FRAC_PI_3,
            aspect: 1.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

impl Camera {
    /// Frames a raw-coordinate world of the given extent.
    pub fn for_extent(extent: Vec3) -> Self {
        let center = Vec3::new(extent.x / 2.0, extent.y / 2.0, extent.z / 2.0);
        let depth = extent.x.max(extent.y).max(extent.z).max(1.0);
        Self {
            eye: Vec3::new(center.x, center.y, center.z + 2.0 * depth),
            target: center,
            far: 10.0 * depth,
            ..Self::default()
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        Mat4::perspective(self.fovy, self.aspect, self.near, self.far)
            .mul(&Mat4::look_at(self.eye, self.target, self.up))
    }
}

/// Draw target for assembled scenes.
pub trait Renderer {
    fn render(&mut self, scene: &Scene);
}

/// Headless renderer: reports what would be drawn.
#[derive(Debug, Default)]
pub struct LogRenderer {
    pub frames: u64,
    background: Option<[f32; 4]>,
    backdrop_logged: bool,
}

impl Renderer for LogRenderer {
    fn render(&mut self, scene: &Scene) {
        self.frames += 1;
        if self.background != Some(scene.background) {
            tracing::info!("Background {:?}", scene.background);
            self.background = Some(scene.background);
        }
        if let (Some(backdrop), false) = (&scene.backdrop, self.backdrop_logged) {
            tracing::info!("Backdrop with {} points", backdrop.len());
            self.backdrop_logged = true;
        }
        if let Some(score) = scene.score {
            tracing::info!("Game over. Score: {}", score);
            return;
        }
        let vertex_bytes: usize = scene
            .objects
            .iter()
            .map(|o| o.outline.vertex_bytes().len())
            .sum();
        tracing::info!("Snake length: {}", scene.snake_len());
        tracing::debug!(
            "Frame {}: {} cubes, {} vertex bytes",
            self.frames,
            scene.objects.len(),
            vertex_bytes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snek_shared::codec::IntegerWidth;
    use snek_shared::coords::{Rgb, WorldBounds};
    use snek_shared::geometry::WHITE;

    fn handshake(bound: u64) -> Handshake {
        Handshake {
            width: IntegerWidth::Four,
            bounds: WorldBounds::new(bound, bound, bound),
            background: Rgb([0, 0, 0]),
        }
    }

    fn frame(points: &[(f32, f32, f32)]) -> Frame {
        Frame {
            point_count: points.len() as u32,
            points: points
                .iter()
                .map(|&(x, y, z)| Point::new(x, y, z))
                .collect(),
            score: None,
        }
    }

    #[test]
    fn hull_has_twelve_triangles() {
        assert_eq!(cube_hull().triangulated().len(), 12);
    }

    #[test]
    fn food_is_red_and_body_white() {
        let scene = Scene::from_frame(
            &handshake(10),
            &frame(&[(0.1, 0.1, 0.1), (0.5, 0.5, 0.5), (0.6, 0.5, 0.5)]),
            true,
        );
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.snake_len(), 2);
        assert_eq!(scene.objects[0].kind, ObjectKind::Food);
        assert_eq!(scene.objects[0].outline.points()[0].color, RED);
        assert_eq!(scene.objects[2].kind, ObjectKind::Body(1));
        assert_eq!(scene.objects[2].outline.points()[0].color, WHITE);
        assert_eq!(scene.background, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn game_over_scene_is_empty() {
        let f = Frame {
            point_count: 0,
            points: Vec::new(),
            score: Some(9),
        };
        let scene = Scene::from_frame(&handshake(10), &f, true);
        assert!(scene.objects.is_empty());
        assert_eq!(scene.score, Some(9));
    }

    #[test]
    fn pick_hits_cube_under_cursor() {
        let scene = Scene::from_frame(
            &handshake(10),
            &frame(&[(0.1, 0.1, 0.1), (0.5, 0.5, 0.5)]),
            true,
        );
        let picked = scene.pick(&Camera::default(), 0.0, 0.0).unwrap();
        assert_eq!(picked.kind, ObjectKind::Body(0));
        assert!((picked.point.z - 0.55).abs() < 1e-3, "hit at {:?}", picked.point);
        assert!(scene.pick(&Camera::default(), 0.9, 0.9).is_none());
    }

    #[test]
    fn pick_prefers_nearest_object() {
        let scene = Scene::from_frame(
            &handshake(10),
            &frame(&[(0.5, 0.5, 0.2), (0.5, 0.5, 0.8)]),
            true,
        );
        let picked = scene.pick(&Camera::default(), 0.0, 0.0).unwrap();
        assert_eq!(picked.kind, ObjectKind::Body(0));
        assert!((picked.point.z - 0.85).abs() < 1e-3);
    }

    #[test]
    fn log_renderer_counts_frames() {
        let mut renderer = LogRenderer::default();
        let scene = Scene::from_frame(&handshake(4), &frame(&[(0.0, 0.0, 0.0)]), true);
        renderer.render(&scene);
        renderer.render(&scene);
        assert_eq!(renderer.frames, 2);
    }
}
