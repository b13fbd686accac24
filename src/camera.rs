//! Camera and projection matrix builders.
//!
//! Three independent 4x4 matrices take a vertex from world space to the
//! screen:
//!
//! - **ModelView** ([`look_at`]): world space -> camera space
//! - **Perspective** ([`perspective`]): camera space -> clip space
//! - **Viewport** ([`viewport`]): NDC -> pixel coordinates
//!
//! They are grouped into a [`Transforms`] value that is built once per
//! frame and passed explicitly to shaders and the rasterizer; there is no
//! process-wide transform state. When camera or window parameters change,
//! the whole set is rebuilt.

use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;

/// The full transform set for one rendering pass.
#[derive(Debug, Clone, Copy)]
pub struct Transforms {
    pub model_view: Mat4,
    pub perspective: Mat4,
    pub viewport: Mat4,
}

impl Transforms {
    /// Builds the transform set for a camera at `eye` looking at `center`,
    /// rendering into the pixel rectangle `[x, x+w] x [y, y+h]`.
    ///
    /// The focal length is the eye-to-center distance, which keeps the
    /// look-at target in focus.
    pub fn new(eye: Vec3, center: Vec3, up: Vec3, x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            model_view: look_at(eye, center, up),
            perspective: perspective((eye - center).norm()),
            viewport: viewport(x, y, w, h),
        }
    }

    /// All three matrices set to identity. Clip space, NDC, and screen
    /// space coincide; handy for tests and screen-space drawing.
    pub fn identity() -> Self {
        Self {
            model_view: Mat4::identity(),
            perspective: Mat4::identity(),
            viewport: Mat4::identity(),
        }
    }
}

/// Builds the world-to-camera matrix for a camera at `eye` looking at
/// `center` with the given `up` hint.
///
/// The camera basis is `n = normalize(eye - center)`,
/// `l = normalize(up x n)`, `m = normalize(n x l)`; the result rotates
/// into that basis after translating `center` to the origin.
///
/// `up` must not be parallel to the view direction, or `l` degenerates to
/// NaN; that is the caller's precondition.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    let n = (eye - center).normalized();
    let l = up.cross(n).normalized();
    let m = n.cross(l).normalized();

    let rotation = Mat4::new([
        [l.x, l.y, l.z, 0.0],
        [m.x, m.y, m.z, 0.0],
        [n.x, n.y, n.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    let translation = Mat4::new([
        [1.0, 0.0, 0.0, -center.x],
        [0.0, 1.0, 0.0, -center.y],
        [0.0, 0.0, 1.0, -center.z],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    rotation * translation
}

/// Builds the pinhole projection matrix for the given focal length
/// (distance from the eye to the plane of focus, > 0).
///
/// The matrix leaves x, y, z untouched and sets `w = 1 - z/f`, so the
/// perspective divide shrinks geometry in proportion to its distance
/// along the view axis.
pub fn perspective(focal_length: f64) -> Mat4 {
    Mat4::new([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, -1.0 / focal_length, 1.0],
    ])
}

/// Builds the matrix mapping NDC `[-1,1]^2` to the pixel rectangle
/// `[x, x+w] x [y, y+h]`. The z component passes through unchanged so NDC
/// depth survives the screen transform.
pub fn viewport(x: i32, y: i32, w: i32, h: i32) -> Mat4 {
    let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
    Mat4::new([
        [w / 2.0, 0.0, 0.0, x + w / 2.0],
        [0.0, h / 2.0, 0.0, y + h / 2.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}
