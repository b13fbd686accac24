//! Programmable shading stages for the rasterizer.
//!
//! The pipeline is split GPU-style: the fixed-function rasterizer owns
//! coverage, barycentric weights, and depth testing, while a [`Shader`]
//! owns everything material-specific. `vertex` runs once per triangle
//! corner and stashes whatever varyings (`uv`, normals, ...) the fragment
//! stage will interpolate; `fragment` runs once per covered pixel that
//! passed the depth test.

use crate::camera::Transforms;
use crate::math::mat4::Mat4;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;
use crate::math::vec4::Vec4;
use crate::mesh::Mesh;
use crate::tga::Color;

/// The two-stage shading contract.
///
/// The rasterizer is generic over any implementation; a concrete shader
/// pairs one lighting model with the mesh and transforms it reads from.
pub trait Shader {
    /// Transforms corner `nth_vert` (0..3) of `face` into clip space,
    /// recording per-vertex varyings for the fragment stage on the way.
    /// Called exactly three times per triangle, before rasterization.
    fn vertex(&mut self, face: usize, nth_vert: usize) -> Vec4;

    /// Computes the color at a covered pixel from the barycentric weights
    /// of the current triangle, or returns `None` to discard the pixel.
    fn fragment(&self, bar: Vec3) -> Option<Color>;
}

/// Gouraud shading: Lambertian intensity computed per vertex, then
/// interpolated linearly across the triangle.
pub struct GouraudShader<'a> {
    mesh: &'a Mesh,
    transforms: &'a Transforms,
    mv_invt: Mat4,
    /// Light direction in eye coordinates, pointing toward the light.
    light: Vec4,
    base: Color,
    varying_intensity: [f64; 3],
}

impl<'a> GouraudShader<'a> {
    pub fn new(mesh: &'a Mesh, transforms: &'a Transforms, light_dir: Vec3, base: Color) -> Self {
        Self {
            mesh,
            transforms,
            mv_invt: transforms.model_view.invert_transpose(),
            light: (transforms.model_view * light_dir.extend(0.0)).normalized(),
            base,
            varying_intensity: [0.0; 3],
        }
    }
}

impl Shader for GouraudShader<'_> {
    fn vertex(&mut self, face: usize, nth_vert: usize) -> Vec4 {
        let n = (self.mv_invt * self.mesh.normal(face, nth_vert)).normalized();
        self.varying_intensity[nth_vert] = n.dot(self.light).max(0.0);
        self.transforms.perspective * (self.transforms.model_view * self.mesh.vert(face, nth_vert))
    }

    fn fragment(&self, bar: Vec3) -> Option<Color> {
        let intensity = self.varying_intensity[0] * bar.x
            + self.varying_intensity[1] * bar.y
            + self.varying_intensity[2] * bar.z;
        Some(self.base.modulate(intensity))
    }
}

/// Phong shading with ambient, diffuse, and specular terms.
///
/// Normals are interpolated per pixel (or looked up in the mesh's normal
/// map when it has one) and lit in eye space; the base color comes from
/// the diffuse map when present.
pub struct PhongShader<'a> {
    mesh: &'a Mesh,
    transforms: &'a Transforms,
    mv_invt: Mat4,
    /// Light direction in eye coordinates, pointing toward the light.
    light: Vec4,
    base: Color,
    varying_uv: [Vec2; 3],
    varying_nrm: [Vec4; 3],
}

impl<'a> PhongShader<'a> {
    const AMBIENT: f64 = 0.3;
    const SPECULAR: f64 = 0.6;
    const SHININESS: i32 = 35;

    pub fn new(mesh: &'a Mesh, transforms: &'a Transforms, light_dir: Vec3) -> Self {
        Self {
            mesh,
            transforms,
            mv_invt: transforms.model_view.invert_transpose(),
            light: (transforms.model_view * light_dir.extend(0.0)).normalized(),
            base: Color::WHITE,
            varying_uv: [Vec2::ZERO; 3],
            varying_nrm: [Vec4::ZERO; 3],
        }
    }
}

impl Shader for PhongShader<'_> {
    fn vertex(&mut self, face: usize, nth_vert: usize) -> Vec4 {
        self.varying_uv[nth_vert] = self.mesh.uv(face, nth_vert);
        self.varying_nrm[nth_vert] = self.mv_invt * self.mesh.normal(face, nth_vert);
        self.transforms.perspective * (self.transforms.model_view * self.mesh.vert(face, nth_vert))
    }

    fn fragment(&self, bar: Vec3) -> Option<Color> {
        let uv = self.varying_uv[0] * bar.x + self.varying_uv[1] * bar.y + self.varying_uv[2] * bar.z;
        let n = if self.mesh.has_normal_map() {
            (self.mv_invt * self.mesh.normal_at(uv)).normalized()
        } else {
            (self.varying_nrm[0] * bar.x
                + self.varying_nrm[1] * bar.y
                + self.varying_nrm[2] * bar.z)
                .normalized()
        };

        let diffuse = n.dot(self.light).max(0.0);
        // Reflect the light direction around the normal; its z component
        // is the alignment with the eye-space view axis.
        let reflected = (n * (n.dot(self.light) * 2.0) - self.light).normalized();
        let specular = reflected.z.max(0.0).powi(Self::SHININESS);

        let base = self.mesh.diffuse_at(uv).unwrap_or(self.base);
        Some(base.modulate(Self::AMBIENT + diffuse + Self::SPECULAR * specular))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    fn triangle() -> Mesh {
        Mesh::from_obj_buf(&mut Cursor::new(TRIANGLE_OBJ)).unwrap()
    }

    #[test]
    fn gouraud_vertex_passes_positions_through_identity_transforms() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let mut shader = GouraudShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, 1.0), Color::WHITE);
        let clip = shader.vertex(0, 1);
        assert_eq!(clip, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn gouraud_interpolates_full_intensity_on_facing_light() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let mut shader = GouraudShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, 1.0), Color::WHITE);
        for v in 0..3 {
            shader.vertex(0, v);
        }
        let centroid = Vec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        assert_eq!(shader.fragment(centroid), Some(Color::WHITE));
    }

    #[test]
    fn gouraud_is_dark_when_lit_from_behind() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let mut shader = GouraudShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, -1.0), Color::WHITE);
        for v in 0..3 {
            shader.vertex(0, v);
        }
        let color = shader.fragment(Vec3::new(0.2, 0.3, 0.5)).unwrap();
        assert_eq!((color.r(), color.g(), color.b()), (0, 0, 0));
    }

    #[test]
    fn phong_saturates_under_direct_light() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let mut shader = PhongShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, 1.0));
        for v in 0..3 {
            shader.vertex(0, v);
        }
        // n == l == (0,0,1): diffuse 1, reflection straight back at the
        // viewer, so every channel clamps to 255.
        assert_eq!(
            shader.fragment(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)),
            Some(Color::WHITE)
        );
    }

    #[test]
    fn phong_keeps_only_ambient_light_on_grazing_normals() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let mut shader = PhongShader::new(&mesh, &transforms, Vec3::new(1.0, 0.0, 0.0));
        for v in 0..3 {
            shader.vertex(0, v);
        }
        // Normal (0,0,1) against light (1,0,0): no diffuse, no specular.
        let color = shader.fragment(Vec3::new(0.5, 0.25, 0.25)).unwrap();
        assert_eq!(color, Color::WHITE.modulate(PhongShader::AMBIENT));
    }

    #[test]
    fn phong_samples_the_diffuse_map() {
        let mut mesh = triangle();
        mesh.set_diffuse(Texture::from_pixels(vec![Color::rgb(10, 250, 20)], 1, 1));
        let transforms = Transforms::identity();
        let mut shader = PhongShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, 1.0));
        for v in 0..3 {
            shader.vertex(0, v);
        }
        let color = shader.fragment(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)).unwrap();
        // Full light saturates the scale factor past 1, so every channel
        // is at least its texel value.
        assert!(color.r() >= 10 && color.g() >= 250 && color.b() >= 20);
    }

    #[test]
    fn phong_prefers_the_normal_map_when_present() {
        let mut mesh = triangle();
        // Normal map pointing along +x while vertex normals point +z.
        mesh.set_normal_map(Texture::from_pixels(vec![Color::rgb(255, 127, 127)], 1, 1));
        let transforms = Transforms::identity();
        let mut shader = PhongShader::new(&mesh, &transforms, Vec3::new(0.0, 0.0, 1.0));
        for v in 0..3 {
            shader.vertex(0, v);
        }
        let color = shader.fragment(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)).unwrap();
        // Light along +z against a +x normal: ambient only, far from white.
        let expected = Color::WHITE.modulate(PhongShader::AMBIENT);
        assert!((color.r() as i32 - expected.r() as i32).abs() <= 2);
    }

    #[test]
    fn light_direction_is_normalized_in_eye_space() {
        let mesh = triangle();
        let transforms = Transforms::identity();
        let shader = PhongShader::new(&mesh, &transforms, Vec3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(shader.light.norm(), 1.0, epsilon = 1e-12);
    }
}
