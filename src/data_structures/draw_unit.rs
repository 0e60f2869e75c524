//! Draw units and the scene store that owns them.
//!
//! A [`DrawUnit`] is one shape of the source file: a triangle list that shares
//! a single material, uploaded to the GPU once at import. The [`Scene`] keeps
//! every unit in source order together with the [`TextureCache`] their
//! textures came from. Nothing in here changes after construction.

use std::rc::Rc;

use crate::{
    device::GpuDevice,
    resources::{mesh::MeshError, texture::TextureCache},
};

/// Opacity at or above which a unit is drawn in the opaque pass.
pub const OPAQUE_THRESHOLD: f32 = 0.999;

/// `true` when a unit with this opacity belongs to the blended pass.
pub fn is_transparent(opacity: f32) -> bool {
    opacity < OPAQUE_THRESHOLD
}

/// Per-batch uniform block, laid out like `MaterialUniform` in `scene.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 3],
    pub opacity: f32,
    pub use_texture: u32,
    pub _padding: [u32; 3],
}

/// Resolved surface attributes of one unit.
pub struct Material<D: GpuDevice> {
    pub base_color: [f32; 3],
    pub opacity: f32,
    pub texture: Option<Rc<D::Texture>>,
}

impl<D: GpuDevice> Default for Material<D> {
    /// White, fully opaque, untextured: what shapes without a material get.
    fn default() -> Self {
        Self {
            base_color: [1.0; 3],
            opacity: 1.0,
            texture: None,
        }
    }
}

impl<D: GpuDevice> Clone for Material<D> {
    fn clone(&self) -> Self {
        Self {
            base_color: self.base_color,
            opacity: self.opacity,
            texture: self.texture.clone(),
        }
    }
}

impl<D: GpuDevice> Material<D> {
    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            opacity: self.opacity,
            use_texture: self.texture.is_some() as u32,
            _padding: [0; 3],
        }
    }
}

pub struct DrawUnit<D: GpuDevice> {
    name: String,
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    material: Material<D>,
    mesh: D::Mesh,
}

impl<D: GpuDevice> DrawUnit<D> {
    /// Validates the vertex streams and uploads them right away.
    pub fn new(
        device: &mut D,
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        uvs: Vec<[f32; 2]>,
        material: Material<D>,
    ) -> Result<Self, MeshError> {
        if positions.len() != uvs.len() {
            return Err(MeshError::UvCountMismatch {
                positions: positions.len(),
                uvs: uvs.len(),
            });
        }
        if positions.len() % 3 != 0 {
            return Err(MeshError::NotTriangles {
                vertices: positions.len(),
            });
        }
        let name = name.into();
        let mesh = device.upload_mesh(&name, &positions, &uvs, &material.uniform());
        Ok(Self {
            name,
            positions,
            uvs,
            material,
            mesh,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn base_color(&self) -> [f32; 3] {
        self.material.base_color
    }

    pub fn opacity(&self) -> f32 {
        self.material.opacity
    }

    pub fn texture(&self) -> Option<&Rc<D::Texture>> {
        self.material.texture.as_ref()
    }

    pub fn has_texture(&self) -> bool {
        self.material.texture.is_some()
    }

    pub fn is_transparent(&self) -> bool {
        is_transparent(self.material.opacity)
    }

    pub fn material_uniform(&self) -> MaterialUniform {
        self.material.uniform()
    }

    pub fn mesh(&self) -> &D::Mesh {
        &self.mesh
    }
}

/// Every draw unit of the session plus the textures they reference.
pub struct Scene<D: GpuDevice> {
    // Declared before `textures` so units are dropped first.
    units: Vec<DrawUnit<D>>,
    textures: TextureCache<D>,
}

impl<D: GpuDevice> Scene<D> {
    pub fn new(units: Vec<DrawUnit<D>>, textures: TextureCache<D>) -> Self {
        Self { units, textures }
    }

    pub fn units(&self) -> &[DrawUnit<D>] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units of the opaque pass, in source order.
    pub fn opaque(&self) -> impl Iterator<Item = &DrawUnit<D>> {
        self.units.iter().filter(|u| !u.is_transparent())
    }

    /// Units of the blended pass, in source order (not depth sorted).
    pub fn transparent(&self) -> impl Iterator<Item = &DrawUnit<D>> {
        self.units.iter().filter(|u| u.is_transparent())
    }

    pub fn textures(&self) -> &TextureCache<D> {
        &self.textures
    }
}
