//! Model import: turns files on disk into GPU-ready triangle or point data.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use glam::{DVec3, Vec3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file type: {0}")]
    Unsupported(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{0} contains no geometry")]
    Empty(PathBuf),
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Half the diagonal length, 0 for an empty box
    pub fn radius(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).length() * 0.5
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Points,
}

/// One drawable piece of a model
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle list; empty for point clouds
    pub indices: Vec<u32>,
    pub primitive: Primitive,
}

impl MeshData {
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for p in &self.positions {
            bounds.include(Vec3::from_array(*p).as_dvec3());
        }
        bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Fill `normals` with area-weighted vertex normals when they are missing
    fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() || self.primitive == Primitive::Points {
            return;
        }
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
            let n = (pb - pa).cross(pc - pa);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Z).to_array())
            .collect();
    }
}

/// Everything parsed from one file
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    pub bounds: Aabb,
}

impl LoadedModel {
    fn new(path: &Path, mut meshes: Vec<MeshData>) -> Result<Self, LoadError> {
        meshes.retain(|m| !m.positions.is_empty());
        if meshes.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }
        let mut bounds = Aabb::EMPTY;
        for mesh in &mut meshes {
            mesh.ensure_normals();
            bounds = bounds.union(&mesh.bounds());
        }
        Ok(Self {
            path: path.to_path_buf(),
            meshes,
            bounds,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Obj,
    Stl,
    Ply,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "obj" => Some(ModelFormat::Obj),
            "stl" => Some(ModelFormat::Stl),
            "ply" => Some(ModelFormat::Ply),
            _ => None,
        }
    }

    pub fn extensions() -> &'static [&'static str] {
        &["obj", "stl", "ply"]
    }
}

pub fn supports(path: &Path) -> bool {
    ModelFormat::from_path(path).is_some()
}

/// Parse a model file
pub fn load_model(path: &Path) -> Result<LoadedModel, LoadError> {
    let format =
        ModelFormat::from_path(path).ok_or_else(|| LoadError::Unsupported(path.to_path_buf()))?;
    let meshes = match format {
        ModelFormat::Obj => load_obj(path)?,
        ModelFormat::Stl => load_stl(path)?,
        ModelFormat::Ply => load_ply(path)?,
    };
    let model = LoadedModel::new(path, meshes)?;
    tracing::debug!(
        "Loaded {}: {} mesh(es), {} vertices, {} triangles",
        path.display(),
        model.meshes.len(),
        model.vertex_count(),
        model.triangle_count()
    );
    Ok(model)
}

fn load_obj(path: &Path) -> Result<Vec<MeshData>, LoadError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| LoadError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    // Geometry is still usable without its material library
    if let Err(e) = materials {
        tracing::debug!("No materials for {}: {e}", path.display());
    }

    Ok(models
        .into_iter()
        .map(|m| {
            let mesh = m.mesh;
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let normals = mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
            let primitive = if mesh.indices.is_empty() {
                Primitive::Points
            } else {
                Primitive::Triangles
            };
            MeshData {
                name: m.name,
                positions,
                normals,
                indices: mesh.indices,
                primitive,
            }
        })
        .collect())
}

fn load_stl(path: &Path) -> Result<Vec<MeshData>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
    let stl = stl_io::read_stl(&mut reader).map_err(io_err)?;

    let positions = stl
        .vertices
        .iter()
        .map(|v| [v[0], v[1], v[2]])
        .collect::<Vec<_>>();
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        if face.vertices.iter().any(|&i| i >= positions.len()) {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                message: "face references a missing vertex".to_string(),
            });
        }
        indices.extend(face.vertices.iter().map(|&i| i as u32));
    }

    Ok(vec![MeshData {
        name: stem(path),
        positions,
        normals: Vec::new(),
        indices,
        primitive: Primitive::Triangles,
    }])
}

fn load_ply(path: &Path) -> Result<Vec<MeshData>, LoadError> {
    let mut reader = BufReader::new(File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?);
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let parse_err = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    if let Some(vertices) = ply.payload.get("vertex") {
        for vertex in vertices {
            positions.push([
                scalar(vertex, "x").ok_or_else(|| parse_err("vertex without x".into()))?,
                scalar(vertex, "y").ok_or_else(|| parse_err("vertex without y".into()))?,
                scalar(vertex, "z").ok_or_else(|| parse_err("vertex without z".into()))?,
            ]);
            if let (Some(nx), Some(ny), Some(nz)) =
                (scalar(vertex, "nx"), scalar(vertex, "ny"), scalar(vertex, "nz"))
            {
                normals.push([nx, ny, nz]);
            }
        }
    }
    if normals.len() != positions.len() {
        normals.clear();
    }

    let mut indices = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        for face in faces {
            let polygon = face_indices(face).ok_or_else(|| parse_err("face without indices".into()))?;
            if polygon.iter().any(|&i| i as usize >= positions.len()) {
                return Err(parse_err("face references a missing vertex".into()));
            }
            // fan triangulation
            for i in 1..polygon.len().saturating_sub(1) {
                indices.extend([polygon[0], polygon[i], polygon[i + 1]]);
            }
        }
    }

    let primitive = if indices.is_empty() {
        Primitive::Points
    } else {
        Primitive::Triangles
    };
    Ok(vec![MeshData {
        name: stem(path),
        positions,
        normals,
        indices,
        primitive,
    }])
}

fn scalar(element: &DefaultElement, name: &str) -> Option<f32> {
    match element.get(name)? {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        Property::Int(v) => Some(*v as f32),
        Property::UInt(v) => Some(*v as f32),
        Property::Short(v) => Some(*v as f32),
        Property::UShort(v) => Some(*v as f32),
        _ => None,
    }
}

fn face_indices(element: &DefaultElement) -> Option<Vec<u32>> {
    match element.get("vertex_indices").or_else(|| element.get("vertex_index"))? {
        Property::ListInt(v) => Some(v.iter().map(|&i| i.max(0) as u32).collect()),
        Property::ListUInt(v) => Some(v.clone()),
        Property::ListUShort(v) => Some(v.iter().map(|&i| i as u32).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&i| i.max(0) as u32).collect()),
        _ => None,
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ModelFormat::from_path(Path::new("a.OBJ")), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path(Path::new("a.stl")), Some(ModelFormat::Stl));
        assert_eq!(ModelFormat::from_path(Path::new("a.ply")), Some(ModelFormat::Ply));
        assert_eq!(ModelFormat::from_path(Path::new("a.glb")), None);
        assert_eq!(ModelFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_obj_computes_normals() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let model = load_model(&path).unwrap();
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.meshes[0].normals.len(), 3);
        assert_eq!(model.meshes[0].normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(model.bounds.max, DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_load_ascii_stl() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "tri.stl",
            "solid t\n facet normal 0 0 1\n  outer loop\n   vertex 0 0 0\n   vertex 2 0 0\n   vertex 0 2 0\n  endloop\n endfacet\nendsolid t\n",
        );
        let model = load_model(&path).unwrap();
        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.bounds.center(), DVec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_load_ply_point_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "cloud.ply",
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n1 0 0\n0 0 4\n",
        );
        let model = load_model(&path).unwrap();
        assert_eq!(model.meshes[0].primitive, Primitive::Points);
        assert_eq!(model.vertex_count(), 3);
        assert!(model.meshes[0].normals.is_empty());
        assert_eq!(model.bounds.max.z, 4.0);
    }

    #[test]
    fn test_load_ply_quad_is_triangulated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "quad.ply",
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n",
        );
        let model = load_model(&path).unwrap();
        assert_eq!(model.triangle_count(), 2);
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_model(Path::new("scene.glb")),
            Err(LoadError::Unsupported(_))
        ));
        assert!(load_model(&dir.path().join("missing.stl")).is_err());
        let empty = write(&dir, "empty.obj", "# nothing\n");
        assert!(load_model(&empty).is_err());
    }

    #[test]
    fn test_aabb() {
        let mut b = Aabb::EMPTY;
        assert!(b.is_empty());
        assert_eq!(b.radius(), 0.0);
        assert_eq!(b.center(), DVec3::ZERO);
        b.include(DVec3::new(-1.0, -1.0, -1.0));
        b.include(DVec3::new(1.0, 1.0, 1.0));
        assert_eq!(b.center(), DVec3::ZERO);
        assert!((b.radius() - 3f64.sqrt()).abs() < 1e-12);
    }
}
