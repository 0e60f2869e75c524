//! GPU resource creation.
//!
//! The importer only ever talks to a [`GpuDevice`]: upload an image, upload a
//! mesh. [`WgpuDevice`] is the real implementation; tests plug in a recording
//! device to count uploads without a GPU.

use anyhow::bail;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{draw_unit::MaterialUniform, texture::Texture},
    resources::texture::{DecodedImage, material_layout, texture_layout},
};

/// Resource factory for textures and draw-unit meshes.
pub trait GpuDevice {
    /// Handle of an uploaded image, shared between draw units through `Rc`.
    type Texture;
    /// Vertex/UV buffers plus per-batch uniforms of one draw unit.
    type Mesh;

    /// Uploads `image` and drops the CPU copy.
    ///
    /// Fails when the device cannot hold the image, e.g. it is larger than
    /// the maximum 2D texture size.
    fn upload_texture(
        &mut self,
        label: &str,
        image: DecodedImage,
    ) -> anyhow::Result<Self::Texture>;

    /// Uploads the vertex streams and the batch uniform of one draw unit.
    fn upload_mesh(
        &mut self,
        label: &str,
        positions: &[[f32; 3]],
        uvs: &[[f32; 2]],
        material: &MaterialUniform,
    ) -> Self::Mesh;
}

/// A sampled texture together with the bind group it is drawn with.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct GpuMesh {
    pub positions: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    #[allow(unused)]
    pub material: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
    pub vertex_count: u32,
}

/// [`GpuDevice`] backed by a wgpu device and queue.
///
/// `wgpu::Device` and `wgpu::Queue` are reference counted internally, so
/// cloning them out of the [`Context`](crate::context::Context) is cheap.
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    fallback: GpuTexture,
}

impl WgpuDevice {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture_layout = texture_layout(device);
        let material_layout = material_layout(device);
        let white = Texture::create_white(device, queue);
        let fallback = bind_texture(device, &texture_layout, white, "white fallback");
        Self {
            device: device.clone(),
            queue: queue.clone(),
            texture_layout,
            material_layout,
            fallback,
        }
    }

    /// Bound in place of a texture for untextured draw units.
    pub fn fallback(&self) -> &GpuTexture {
        &self.fallback
    }
}

impl GpuDevice for WgpuDevice {
    type Texture = GpuTexture;
    type Mesh = GpuMesh;

    fn upload_texture(
        &mut self,
        label: &str,
        image: DecodedImage,
    ) -> anyhow::Result<GpuTexture> {
        let max = self.device.limits().max_texture_dimension_2d;
        if image.width > max || image.height > max {
            bail!(
                "{}x{} exceeds the device texture limit of {}",
                image.width,
                image.height,
                max
            );
        }
        let texture = Texture::from_image(&self.device, &self.queue, image, Some(label));
        Ok(bind_texture(&self.device, &self.texture_layout, texture, label))
    }

    fn upload_mesh(
        &mut self,
        label: &str,
        positions: &[[f32; 3]],
        uvs: &[[f32; 2]],
        material: &MaterialUniform,
    ) -> GpuMesh {
        let position_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Position Buffer", label)),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let uv_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} UV Buffer", label)),
                contents: bytemuck::cast_slice(uvs),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let material_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Material Buffer", label)),
                contents: bytemuck::cast_slice(&[*material]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{:?} material_bind_group", label)),
        });

        GpuMesh {
            positions: position_buffer,
            uvs: uv_buffer,
            material: material_buffer,
            material_bind_group,
            vertex_count: positions.len() as u32,
        }
    }
}

fn bind_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: Texture,
    label: &str,
) -> GpuTexture {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
        label: Some(&format!("{:?} texture_bind_group", label)),
    });
    GpuTexture {
        texture,
        bind_group,
    }
}
