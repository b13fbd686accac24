//! Triangle rasterization with depth buffering.
//!
//! [`rasterize`] takes one clip-space triangle through the perspective
//! divide, the screen transform, and a barycentric coverage walk over the
//! triangle's bounding box, invoking the shader's fragment stage at every
//! covered pixel that wins the depth test.
//!
//! # Barycentric coverage
//!
//! With the screen vertices as rows of a 3x3 matrix `ABC = [x y 1]`, the
//! weights of pixel `p = (x, y, 1)` are `ABC^-T * p`: the weights are the
//! unique coefficients reproducing `p` from the vertices, and a negative
//! weight means `p` lies outside the triangle. The matrix determinant is
//! twice the signed triangle area, which doubles as the backface/degeneracy
//! test.
//!
//! # Depth convention
//!
//! A pixel passes only when its interpolated NDC z is **strictly greater**
//! than the stored value. Every call site shares this "far passes"
//! orientation, and ties lose: a later triangle at exactly the stored
//! depth never overwrites the earlier one.

use crate::camera::Transforms;
use crate::math::mat3::Mat3;
use crate::math::vec3::Vec3;
use crate::math::vec4::Vec4;
use crate::shader::Shader;
use crate::tga::TgaImage;

/// A dense per-pixel depth store, co-indexed with the framebuffer.
///
/// Cells start at negative infinity (everything passes the first test).
/// Out-of-range reads return positive infinity so the depth test fails and
/// out-of-range writes are ignored, mirroring the pixel sink's bounds
/// behavior.
pub struct DepthBuffer {
    data: Vec<f64>,
    width: i32,
    height: i32,
}

impl DepthBuffer {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            data: vec![f64::NEG_INFINITY; width.max(0) as usize * height.max(0) as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Resets every cell to negative infinity for a new frame.
    pub fn clear(&mut self) {
        self.data.fill(f64::NEG_INFINITY);
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f64 {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return f64::INFINITY;
        }
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: f64) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        self.data[(y * self.width + x) as usize] = z;
    }
}

/// Rasterizes one clip-space triangle into the framebuffer.
///
/// The caller runs the shader's vertex stage three times to produce
/// `clip`, then hands the same shader over for the fragment stage. All
/// state lives with the caller; each call touches only pixels inside the
/// triangle's clamped bounding box.
///
/// Pixels that pass the depth test commit their depth *before* the
/// fragment stage runs, so a discarded fragment still occludes geometry
/// behind it.
pub fn rasterize<S: Shader>(
    clip: &[Vec4; 3],
    shader: &S,
    transforms: &Transforms,
    zbuffer: &mut DepthBuffer,
    framebuffer: &mut TgaImage,
) {
    let ndc = [clip[0] / clip[0].w, clip[1] / clip[1].w, clip[2] / clip[2].w];
    let screen = [
        (transforms.viewport * ndc[0]).xy(),
        (transforms.viewport * ndc[1]).xy(),
        (transforms.viewport * ndc[2]).xy(),
    ];

    let abc = Mat3::new([
        [screen[0].x, screen[0].y, 1.0],
        [screen[1].x, screen[1].y, 1.0],
        [screen[2].x, screen[2].y, 1.0],
    ]);
    // det(ABC) is twice the signed area: backfaces are negative, triangles
    // covering less than a pixel land below 1, and degenerate divides
    // (w = 0) turn it into NaN. All of them fail this comparison.
    if !(abc.det() >= 1.0) {
        return;
    }
    let weights = abc.invert_transpose();
    let ndc_z = Vec3::new(ndc[0].z, ndc[1].z, ndc[2].z);

    let min_x = (screen[0].x.min(screen[1].x).min(screen[2].x) as i32).max(0);
    let max_x = (screen[0].x.max(screen[1].x).max(screen[2].x) as i32).min(framebuffer.width() - 1);
    let min_y = (screen[0].y.min(screen[1].y).min(screen[2].y) as i32).max(0);
    let max_y = (screen[0].y.max(screen[1].y).max(screen[2].y) as i32).min(framebuffer.height() - 1);

    // Every pixel in the box is independent of the others: one weight
    // evaluation, one depth cell, one framebuffer cell.
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let bar = weights * Vec3::new(x as f64, y as f64, 1.0);
            if bar.x < 0.0 || bar.y < 0.0 || bar.z < 0.0 {
                continue;
            }
            let z = bar.dot(ndc_z);
            if z <= zbuffer.get(x, y) {
                continue;
            }
            zbuffer.set(x, y, z);
            if let Some(color) = shader.fragment(bar) {
                framebuffer.set(x, y, color);
            }
        }
    }
}
