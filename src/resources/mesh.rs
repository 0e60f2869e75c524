use thiserror::Error;

use crate::resources::obj::ParsedShape;

/// Reasons a shape's face list cannot be replayed into a triangle stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("position index {index} out of range ({len} positions)")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("texcoord index {index} out of range ({len} texcoords)")]
    TexcoordOutOfRange { index: usize, len: usize },

    #[error("face list declares more vertices than the shape has indices")]
    TruncatedFaces,

    #[error("{vertices} vertices do not form whole triangles")]
    NotTriangles { vertices: usize },

    #[error("{positions} positions but {uvs} uvs")]
    UvCountMismatch { positions: usize, uvs: usize },
}

/// Flat, draw-ready vertex streams of one shape.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Expanded {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

/**
 * Replays the per-face vertex lists of a shape into flat position/uv streams.
 *
 * Each face of `n` vertices contributes `n` consecutive records in the order the
 * parser stored them, no re-triangulation happens here. An empty arity list means
 * every face is a triangle (which is what `tobj` hands out with `triangulate: true`).
 *
 * The v coordinate is flipped (`1 - v`) since images are stored top row first.
 * Vertices without a texcoord, or whose corner is masked out in
 * `texcoord_mask`, get `(0, 0)`.
 */
pub fn expand_faces(shape: &ParsedShape) -> Result<Expanded, MeshError> {
    let faces = &shape.faces;
    let pool = &shape.pool;
    let total = faces.position_indices.len();
    let arities: Vec<usize> = if faces.arities.is_empty() {
        vec![3; total.div_ceil(3)]
    } else {
        faces.arities.iter().map(|&n| n as usize).collect()
    };

    let mut expanded = Expanded {
        positions: Vec::with_capacity(total),
        uvs: Vec::with_capacity(total),
    };
    let mut offset = 0;
    for arity in arities {
        if offset + arity > total {
            return Err(MeshError::TruncatedFaces);
        }
        for k in offset..offset + arity {
            let index = faces.position_indices[k] as usize;
            let position = pool
                .positions
                .get(index * 3..index * 3 + 3)
                .ok_or(MeshError::PositionOutOfRange {
                    index,
                    len: pool.positions.len() / 3,
                })?;
            expanded.positions.push([position[0], position[1], position[2]]);

            let written = faces.texcoord_mask.get(k) != Some(&false);
            let uv = match faces.texcoord_indices.get(k) {
                Some(&t) if written => {
                    let t = t as usize;
                    let uv = pool.texcoords.get(t * 2..t * 2 + 2).ok_or(
                        MeshError::TexcoordOutOfRange {
                            index: t,
                            len: pool.texcoords.len() / 2,
                        },
                    )?;
                    [uv[0], 1.0 - uv[1]]
                }
                _ => [0.0, 0.0],
            };
            expanded.uvs.push(uv);
        }
        offset += arity;
    }

    if expanded.positions.len() % 3 != 0 {
        return Err(MeshError::NotTriangles {
            vertices: expanded.positions.len(),
        });
    }
    Ok(expanded)
}
