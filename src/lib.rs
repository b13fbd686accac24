//! A CPU-based software 3D rasterizer.
//!
//! This crate implements the classic transform-and-rasterize pipeline with
//! no GPU involvement: homogeneous transforms, perspective divide,
//! barycentric triangle rasterization with a depth buffer, and a
//! programmable two-stage shader contract. Output goes to a TGA image.
//!
//! # Quick Start
//!
//! ```ignore
//! use softrender::prelude::*;
//!
//! let mesh = Mesh::from_obj("model.obj")?;
//! let transforms = Transforms::new(eye, center, Vec3::UP, 50, 50, 700, 700);
//! let mut framebuffer = TgaImage::new(800, 800, Format::Rgb);
//! let mut zbuffer = DepthBuffer::new(800, 800);
//!
//! let mut shader = PhongShader::new(&mesh, &transforms, light_dir);
//! for face in 0..mesh.nfaces() {
//!     let clip = [shader.vertex(face, 0), shader.vertex(face, 1), shader.vertex(face, 2)];
//!     rasterize(&clip, &shader, &transforms, &mut zbuffer, &mut framebuffer);
//! }
//! framebuffer.write_file("output.tga", true)?;
//! ```

pub mod camera;
pub mod math;
pub mod mesh;
pub mod raster;
pub mod shader;
pub mod texture;
pub mod tga;

// Re-export commonly needed types at crate root for convenience
pub use mesh::{LoadError, Mesh};
pub use raster::{rasterize, DepthBuffer};
pub use shader::Shader;
pub use tga::{Color, Format, TgaImage};

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use softrender::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::{look_at, perspective, viewport, Transforms};

    // Geometry
    pub use crate::mesh::{LoadError, Mesh};

    // Math
    pub use crate::math::mat3::Mat3;
    pub use crate::math::mat4::Mat4;
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;
    pub use crate::math::vec4::Vec4;

    // Rendering
    pub use crate::raster::{rasterize, DepthBuffer};
    pub use crate::shader::{GouraudShader, PhongShader, Shader};
    pub use crate::texture::Texture;
    pub use crate::tga::{Color, Format, TgaImage};
}
