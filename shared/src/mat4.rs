/// Column-major 4x4 matrix used for model, view and projection transforms.
use crate::vec3::{cross, dot, normalize, sub, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// `cols[c][r]` is the element in column `c`, row `r`.
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [x, y, z, 1.0];
        m
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = x;
        m.cols[1][1] = y;
        m.cols[2][2] = z;
        m
    }

    /// Right-handed perspective projection, `fovy` in radians.
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fovy / 2.0).tan();
        let nf = 1.0 / (near - far);
        Mat4 {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, (far + near) * nf, -1.0],
                [0.0, 0.0, 2.0 * far * near * nf, 0.0],
            ],
        }
    }

    /// View matrix for a camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = normalize(sub(target, eye));
        let s = normalize(cross(f, up));
        let u = cross(s, f);
        Mat4 {
            cols: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-dot(s, eye), -dot(u, eye), dot(f, eye), 1.0],
            ],
        }
    }

    /// Matrix product `self * rhs`.
    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Mat4 { cols: out }
    }

    /// Transform a point as `(x, y, z, 1)` and divide by the resulting w.
    /// A zero w leaves the point undivided.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0f32; 4];
        for (r, cell) in out.iter_mut().enumerate() {
            *cell = (0..4).map(|k| self.cols[k][r] * v[k]).sum();
        }
        if out[3].abs() < f32::EPSILON {
            return Vec3::new(out[0], out[1], out[2]);
        }
        Vec3::new(out[0] / out[3], out[1] / out[3], out[2] / out[3])
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, cell) in col.iter_mut().enumerate() {
                *cell = self.cols[r][c];
            }
        }
        Mat4 { cols: out }
    }

    /// Gauss-Jordan inverse with partial pivoting. `None` when singular.
    pub fn inverse(&self) -> Option<Mat4> {
        // Work on rows: a[r][c].
        let mut a = self.transpose().cols;
        let mut inv = Self::IDENTITY.cols;

        for i in 0..4 {
            let pivot = (i..4)
                .max_by(|&x, &y| a[x][i].abs().total_cmp(&a[y][i].abs()))
                .unwrap_or(i);
            if a[pivot][i].abs() < 1e-12 {
                return None;
            }
            a.swap(i, pivot);
            inv.swap(i, pivot);

            let d = a[i][i];
            for k in 0..4 {
                a[i][k] /= d;
                inv[i][k] /= d;
            }
            for j in 0..4 {
                if j == i {
                    continue;
                }
                let ratio = a[j][i];
                for k in 0..4 {
                    a[j][k] -= ratio * a[i][k];
                    inv[j][k] -= ratio * inv[i][k];
                }
            }
        }

        Some(Mat4 { cols: inv }.transpose())
    }

    /// Flat column-major floats, the layout uniform uploads expect.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (c, col) in self.cols.iter().enumerate() {
            out[c * 4..c * 4 + 4].copy_from_slice(col);
        }
        out
    }
}
