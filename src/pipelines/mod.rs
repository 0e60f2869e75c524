//! Render pipelines for the two draw passes.
//!
//! Both passes share one shader and one pipeline layout; they only differ in
//! fixed-function state:
//!
//! - `basic`: opaque units, depth write on, blending off
//! - `transparent`: blended units, depth write off, depth test still on

pub mod basic;
pub mod transparent;

/// The two pipelines a frame switches between.
#[derive(Debug)]
pub struct Pipelines {
    pub opaque: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            opaque: basic::mk_basic_pipeline(device, config, camera_bind_group_layout),
            transparent: transparent::mk_transparent_pipeline(
                device,
                config,
                camera_bind_group_layout,
            ),
        }
    }
}
