//! Triangulated mesh geometry loaded from Wavefront OBJ files.
//!
//! A [`Mesh`] is the read-only geometry provider the shaders draw from:
//! homogeneous vertex positions, per-corner normals and UVs, and the
//! optional companion textures (diffuse map, normal map) located next to
//! the OBJ file by filename convention.

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use crate::math::vec2::Vec2;
use crate::math::vec4::Vec4;
use crate::texture::Texture;
use crate::tga::Color;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Why a mesh failed to load.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Obj(tobj::LoadError),
    Image(image::ImageError),
    /// A face with other than 3 corners; the pipeline only accepts
    /// triangulated geometry.
    NotTriangulated { face: usize, vertices: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "failed to read mesh file: {e}"),
            LoadError::Obj(e) => write!(f, "failed to parse obj file: {e}"),
            LoadError::Image(e) => write!(f, "failed to load companion texture: {e}"),
            LoadError::NotTriangulated { face, vertices } => {
                write!(f, "face {face} has {vertices} vertices, expected a triangulated mesh")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Obj(e) => Some(e),
            LoadError::Image(e) => Some(e),
            LoadError::NotTriangulated { .. } => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<tobj::LoadError> for LoadError {
    fn from(e: tobj::LoadError) -> Self {
        LoadError::Obj(e)
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Image(e)
    }
}

/// A triangulated mesh with optional diffuse and normal-map textures.
#[derive(Debug)]
pub struct Mesh {
    verts: Vec<Vec4>,
    norms: Vec<Vec4>,
    uvs: Vec<Vec2>,
    face_vert: Vec<usize>,
    face_norm: Vec<usize>,
    face_uv: Vec<usize>,
    diffuse: Option<Texture>,
    normal_map: Option<Texture>,
}

impl Mesh {
    /// Loads a mesh from an OBJ file, along with its companion textures
    /// when present: `foo.obj` looks for `foo_diffuse.tga` and
    /// `foo_nm.tga` beside it. Missing textures are fine; unreadable ones
    /// are errors.
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(path, &load_options())?;
        let mut mesh = Self::from_models(models)?;
        mesh.diffuse = load_companion(path, "_diffuse.tga")?;
        mesh.normal_map = load_companion(path, "_nm.tga")?;
        Ok(mesh)
    }

    /// Parses OBJ data from an in-memory reader. No texture lookup.
    pub fn from_obj_buf<B: BufRead>(reader: &mut B) -> Result<Self, LoadError> {
        let (models, _materials) =
            tobj::load_obj_buf(reader, &load_options(), |_| Ok(Default::default()))?;
        Self::from_models(models)
    }

    fn from_models(models: Vec<tobj::Model>) -> Result<Self, LoadError> {
        let mut mesh = Mesh {
            verts: Vec::new(),
            norms: Vec::new(),
            uvs: Vec::new(),
            face_vert: Vec::new(),
            face_norm: Vec::new(),
            face_uv: Vec::new(),
            diffuse: None,
            normal_map: None,
        };
        let mut face = 0;

        for model in models {
            let m = model.mesh;
            for (i, &arity) in m.face_arities.iter().enumerate() {
                if arity != 3 {
                    return Err(LoadError::NotTriangulated {
                        face: face + i,
                        vertices: arity as usize,
                    });
                }
            }
            face += m.indices.len() / 3;

            let vert_base = mesh.verts.len();
            let norm_base = mesh.norms.len();
            let uv_base = mesh.uvs.len();

            for v in m.positions.chunks_exact(3) {
                mesh.verts
                    .push(Vec4::new(v[0] as f64, v[1] as f64, v[2] as f64, 1.0));
            }
            for n in m.normals.chunks_exact(3) {
                mesh.norms
                    .push(Vec4::new(n[0] as f64, n[1] as f64, n[2] as f64, 0.0));
            }
            for t in m.texcoords.chunks_exact(2) {
                mesh.uvs.push(Vec2::new(t[0] as f64, t[1] as f64));
            }

            mesh.face_vert
                .extend(m.indices.iter().map(|&i| i as usize + vert_base));
            mesh.face_norm
                .extend(m.normal_indices.iter().map(|&i| i as usize + norm_base));
            mesh.face_uv
                .extend(m.texcoord_indices.iter().map(|&i| i as usize + uv_base));
        }
        Ok(mesh)
    }

    pub fn nverts(&self) -> usize {
        self.verts.len()
    }

    pub fn nfaces(&self) -> usize {
        self.face_vert.len() / 3
    }

    /// Model-space position of corner `nth_vert` (0..3) of `face`, as a
    /// homogeneous point (w = 1).
    pub fn vert(&self, face: usize, nth_vert: usize) -> Vec4 {
        self.verts[self.face_vert[face * 3 + nth_vert]]
    }

    /// Model-space normal of corner `nth_vert` of `face`, as a direction
    /// (w = 0). Falls back to the face plane normal when the file carries
    /// no `vn` records.
    pub fn normal(&self, face: usize, nth_vert: usize) -> Vec4 {
        match self.face_norm.get(face * 3 + nth_vert) {
            Some(&i) => self.norms[i],
            None => {
                let a = self.vert(face, 0).xyz();
                let b = self.vert(face, 1).xyz();
                let c = self.vert(face, 2).xyz();
                (b - a).cross(c - a).normalized().extend(0.0)
            }
        }
    }

    /// Texture coordinates of corner `nth_vert` of `face`; zero when the
    /// file carries no `vt` records.
    pub fn uv(&self, face: usize, nth_vert: usize) -> Vec2 {
        match self.face_uv.get(face * 3 + nth_vert) {
            Some(&i) => self.uvs[i],
            None => Vec2::ZERO,
        }
    }

    pub fn has_diffuse(&self) -> bool {
        self.diffuse.is_some()
    }

    pub fn has_normal_map(&self) -> bool {
        self.normal_map.is_some()
    }

    /// Samples the diffuse map at `uv`, if the mesh has one.
    pub fn diffuse_at(&self, uv: Vec2) -> Option<Color> {
        self.diffuse.as_ref().map(|t| t.sample(uv.x, uv.y))
    }

    /// Decodes the model-space normal stored in the normal map at `uv`:
    /// each RGB channel maps from `[0, 255]` to `[-1, 1]`. Returns the +z
    /// direction when the mesh has no normal map.
    pub fn normal_at(&self, uv: Vec2) -> Vec4 {
        match &self.normal_map {
            Some(map) => {
                let c = map.sample(uv.x, uv.y);
                Vec4::new(c.r() as f64, c.g() as f64, c.b() as f64, 0.0) * (2.0 / 255.0)
                    - Vec4::new(1.0, 1.0, 1.0, 0.0)
            }
            None => Vec4::new(0.0, 0.0, 1.0, 0.0),
        }
    }

    pub fn set_diffuse(&mut self, texture: Texture) {
        self.diffuse = Some(texture);
    }

    pub fn set_normal_map(&mut self, texture: Texture) {
        self.normal_map = Some(texture);
    }
}

/// `foo.obj` + `_diffuse.tga` -> `foo_diffuse.tga`, loaded if it exists.
fn load_companion(obj_path: &Path, suffix: &str) -> Result<Option<Texture>, LoadError> {
    let Some(stem) = obj_path.file_stem() else {
        return Ok(None);
    };
    let mut name = stem.to_os_string();
    name.push(suffix);
    let path = obj_path.with_file_name(name);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(Texture::from_file(&path)?))
}
