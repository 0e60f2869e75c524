use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::error::{Result, SceneError};

/// Per-shape vertex attribute pool as flat float arrays.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttributePool {
    /// `x, y, z` triples.
    pub positions: Vec<f32>,
    /// `u, v` pairs, empty when the shape has no texture coordinates.
    pub texcoords: Vec<f32>,
}

/// Faces of one shape as stored by the parser.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FaceList {
    /// Vertex count per face; empty means every face is a triangle.
    pub arities: Vec<u32>,
    pub position_indices: Vec<u32>,
    /// Parallel to `position_indices`, or empty.
    pub texcoord_indices: Vec<u32>,
    /// Parallel to `position_indices`: whether the corner was written with a
    /// texcoord. Empty means every stored texcoord index is trusted.
    pub texcoord_mask: Vec<bool>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedShape {
    pub name: String,
    pub pool: AttributePool,
    pub faces: FaceList,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    pub dissolve: f32,
    pub diffuse_texture: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedScene {
    pub shapes: Vec<ParsedShape>,
    pub materials: Vec<ParsedMaterial>,
}

/// Turns a scene file into shapes and materials.
///
/// Implementations must only fail when the file cannot be read as a scene at
/// all; partial damage (missing material libraries and such) is logged.
pub trait SceneParser {
    fn parse(&self, file_path: &Path, base_dir: &Path) -> Result<ParsedScene>;
}

/// Wavefront OBJ/MTL parser backed by `tobj`.
///
/// Faces are triangulated by `tobj`, positions and texcoords keep separate
/// index streams so shared positions with different uvs survive untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjParser;

impl ObjParser {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        }
    }
}

impl SceneParser for ObjParser {
    fn parse(&self, file_path: &Path, base_dir: &Path) -> Result<ParsedScene> {
        let parse_err = |source| SceneError::Parse {
            path: file_path.to_path_buf(),
            source,
        };
        let source = fs::read_to_string(file_path).map_err(|e| {
            log::error!("Scene file {:?} could not be read: {}", file_path, e);
            parse_err(match e.kind() {
                ErrorKind::InvalidData => tobj::LoadError::ReadError,
                _ => tobj::LoadError::OpenFileFailed,
            })
        })?;

        let (models, materials) =
            tobj::load_obj_buf(&mut source.as_bytes(), &Self::load_options(), |mtl_path| {
                let resolved: PathBuf = base_dir.join(mtl_path);
                log::debug!("Loading material library {:?}", resolved);
                tobj::load_mtl(&resolved)
            })
            .map_err(parse_err)?;

        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!(
                    "Material library of {:?} could not be loaded ({}), shapes fall back to white.",
                    file_path,
                    e
                );
                Vec::new()
            }
        };

        let mut shapes: Vec<ParsedShape> = models.into_iter().map(to_shape).collect();
        attach_texcoord_masks(&mut shapes, texcoord_mask(&source));
        let materials = materials.into_iter().map(to_material).collect();
        Ok(ParsedScene { shapes, materials })
    }
}

/// Per-corner "has a `vt`" flags of every face record, fan triangulated the
/// way `tobj` does it, in file order.
///
/// `tobj` fills a corner without a `vt` with the previous corner's texcoord,
/// so the flags are the only way to tell written from borrowed coordinates.
fn texcoord_mask(source: &str) -> Vec<bool> {
    let mut mask = Vec::new();
    for line in source.lines() {
        let mut words = line.split_whitespace();
        if !matches!(words.next(), Some("f") | Some("l")) {
            continue;
        }
        let corners: Vec<bool> = words
            .map(|corner| corner.split('/').nth(1).is_some_and(|vt| !vt.is_empty()))
            .collect();
        // points and lines are dropped by the loader
        if corners.len() < 3 {
            continue;
        }
        for i in 1..corners.len() - 1 {
            mask.extend([corners[0], corners[i], corners[i + 1]]);
        }
    }
    mask
}

/// Hands each shape its slice of `mask`. Shapes are contiguous runs of faces,
/// so the slices follow each other in shape order.
fn attach_texcoord_masks(shapes: &mut [ParsedShape], mask: Vec<bool>) {
    let expected: usize = shapes.iter().map(|s| s.faces.position_indices.len()).sum();
    if mask.len() != expected {
        log::debug!(
            "{} face corners scanned but {} loaded, keeping loader texcoords",
            mask.len(),
            expected
        );
        return;
    }
    let mut rest = mask.as_slice();
    for shape in shapes {
        let (own, tail) = rest.split_at(shape.faces.position_indices.len());
        if !shape.faces.texcoord_indices.is_empty() {
            shape.faces.texcoord_mask = own.to_vec();
        }
        rest = tail;
    }
}

fn to_shape(model: tobj::Model) -> ParsedShape {
    let mesh = model.mesh;
    ParsedShape {
        name: model.name,
        pool: AttributePool {
            positions: mesh.positions,
            texcoords: mesh.texcoords,
        },
        faces: FaceList {
            arities: mesh.face_arities,
            position_indices: mesh.indices,
            texcoord_indices: mesh.texcoord_indices,
            texcoord_mask: Vec::new(),
        },
        material: mesh.material_id,
    }
}

fn to_material(material: tobj::Material) -> ParsedMaterial {
    // `d` wins over `Tr`, tobj keeps the latter as an unknown parameter
    let dissolve = material.dissolve.unwrap_or_else(|| {
        material
            .unknown_param
            .get("Tr")
            .and_then(|tr| tr.trim().parse::<f32>().ok())
            .map_or(1.0, |tr| 1.0 - tr)
    });
    ParsedMaterial {
        diffuse: material.diffuse.unwrap_or([0.0; 3]),
        dissolve,
        diffuse_texture: material.diffuse_texture.filter(|t| !t.trim().is_empty()),
        name: material.name,
    }
}
