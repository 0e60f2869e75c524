use crate::pipelines::basic::{mk_render_pipeline, mk_scene_layout, scene_shader, vertex_layouts};

/**
 * Pipeline of the blended pass.
 *
 * Standard `src_alpha, 1 - src_alpha` blending. Depth writes are off so
 * overlapping transparent units don't cut each other out, the depth test
 * stays on so they are still hidden behind opaque geometry.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = mk_scene_layout(device, camera_bind_group_layout);
    mk_render_pipeline(
        device,
        "Transparent Pipeline",
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        false,
        &vertex_layouts(),
        scene_shader(),
    )
}
