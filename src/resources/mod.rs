use std::{collections::HashSet, path::Path};

use crate::{
    data_structures::draw_unit::{DrawUnit, Material, Scene},
    device::GpuDevice,
    error::{Result, SceneError},
    resources::{
        mesh::expand_faces,
        obj::{ObjParser, ParsedMaterial, SceneParser},
        texture::{FileDecoder, ImageDecoder, TextureCache},
    },
};

/**
 * This module contains all logic for loading meshes, materials and textures from external files
 * and turning them into draw units.
 */
pub mod mesh;
pub mod obj;
pub mod texture;

/// Shape and material names that are never imported.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Exclusions {
    names: HashSet<String>,
}

impl Exclusions {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches against the shape name and the resolved material name.
    pub fn excludes(&self, shape: &str, material: Option<&str>) -> bool {
        self.names.contains(shape) || material.is_some_and(|m| self.names.contains(m))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Builds a [`Scene`] from a scene file.
///
/// Parsing and image decoding are pluggable so the importer can be driven
/// from memory in tests.
#[derive(Debug, Clone, Default)]
pub struct Importer<P = ObjParser, I = FileDecoder> {
    exclusions: Exclusions,
    parser: P,
    decoder: I,
}

impl Importer {
    pub fn new(exclusions: Exclusions) -> Self {
        Self {
            exclusions,
            parser: ObjParser,
            decoder: FileDecoder,
        }
    }
}

impl<P: SceneParser, I: ImageDecoder> Importer<P, I> {
    pub fn with_parser<Q: SceneParser>(self, parser: Q) -> Importer<Q, I> {
        Importer {
            exclusions: self.exclusions,
            parser,
            decoder: self.decoder,
        }
    }

    pub fn with_decoder<J: ImageDecoder>(self, decoder: J) -> Importer<P, J> {
        Importer {
            exclusions: self.exclusions,
            parser: self.parser,
            decoder,
        }
    }

    /// Parses `file_path` and uploads one draw unit per retained shape.
    ///
    /// Material libraries and textures are resolved relative to `base_dir`.
    /// Only an unparseable scene file is an error; broken shapes, materials
    /// and textures are logged and skipped or degraded.
    pub fn import<D: GpuDevice>(
        &self,
        file_path: &Path,
        base_dir: &Path,
        device: &mut D,
    ) -> Result<Scene<D>> {
        let parsed = self.parser.parse(file_path, base_dir)?;
        let mut textures = TextureCache::new(base_dir);
        let mut units = Vec::with_capacity(parsed.shapes.len());
        let mut excluded = 0;

        for shape in &parsed.shapes {
            let source: Option<&ParsedMaterial> = match shape.material {
                Some(idx) => {
                    let found = parsed.materials.get(idx);
                    if found.is_none() {
                        log::warn!(
                            "Shape {:?} references material {} but only {} are defined, using defaults.",
                            shape.name,
                            idx,
                            parsed.materials.len()
                        );
                    }
                    found
                }
                None => None,
            };

            if self
                .exclusions
                .excludes(&shape.name, source.map(|m| m.name.as_str()))
            {
                log::debug!("Excluding shape {:?}", shape.name);
                excluded += 1;
                continue;
            }

            let expanded = match expand_faces(shape) {
                Ok(expanded) => expanded,
                Err(source) => {
                    let e = SceneError::Mesh {
                        shape: shape.name.clone(),
                        source,
                    };
                    log::warn!("{}, skipping", e);
                    continue;
                }
            };
            if expanded.positions.is_empty() {
                log::debug!("Skipping empty shape {:?}", shape.name);
                continue;
            }

            let material = match source {
                Some(m) => Material {
                    base_color: m.diffuse,
                    opacity: m.dissolve,
                    texture: m
                        .diffuse_texture
                        .as_deref()
                        .and_then(|path| textures.resolve(path, &self.decoder, device)),
                },
                None => Material::default(),
            };

            match DrawUnit::new(device, &shape.name, expanded.positions, expanded.uvs, material) {
                Ok(unit) => units.push(unit),
                Err(source) => {
                    let e = SceneError::Mesh {
                        shape: shape.name.clone(),
                        source,
                    };
                    log::warn!("{}, skipping", e);
                }
            }
        }

        log::info!(
            "Imported {:?}: {} draw units, {} textures, {} excluded shapes",
            file_path,
            units.len(),
            textures.len(),
            excluded
        );
        Ok(Scene::new(units, textures))
    }
}
