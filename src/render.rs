//! Per-frame draw sequence.
//!
//! A frame always walks the same three phases: compute and upload the MVP,
//! draw every opaque unit, then draw every transparent unit with depth writes
//! off. [`DrawTarget`] is the command sink; [`WgpuTarget`] records into a
//! `wgpu::RenderPass`, tests use a recorder.
//!
//! # Key types
//!
//! - [`PassState`] fixed-function state of a draw pass
//! - [`DrawCall`] everything a single unit needs to be drawn
//! - [`FrameInput`] the collaborator inputs consumed by [`render_frame`]

use cgmath::Matrix4;

use crate::{
    camera::{
        AngularRates, CameraResources, CameraSettings, OrbitState, Projection, compute_transform,
    },
    data_structures::draw_unit::{DrawUnit, MaterialUniform, Scene},
    device::{GpuDevice, GpuMesh, GpuTexture, WgpuDevice},
    pipelines::Pipelines,
};

/// Phases of a frame, always entered in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    ComputeTransform,
    DrawOpaque,
    DrawTransparent,
}

impl FramePhase {
    /// Pipeline state of a draw phase, `None` for `ComputeTransform`.
    pub fn pass_state(self) -> Option<PassState> {
        match self {
            FramePhase::ComputeTransform => None,
            FramePhase::DrawOpaque => Some(PassState::OPAQUE),
            FramePhase::DrawTransparent => Some(PassState::TRANSPARENT),
        }
    }
}

/// Depth and blend state of a draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
}

impl PassState {
    pub const OPAQUE: PassState = PassState {
        depth_test: true,
        depth_write: true,
        blend: false,
    };

    /// `src_alpha, 1 - src_alpha` blending, depth tested but not written.
    pub const TRANSPARENT: PassState = PassState {
        depth_test: true,
        depth_write: false,
        blend: true,
    };
}

/// One unit's draw: bind buffers, set uniforms, bind texture, draw.
pub struct DrawCall<'a, D: GpuDevice> {
    pub mesh: &'a D::Mesh,
    pub material: MaterialUniform,
    /// Only set when `material.use_texture == 1`.
    pub texture: Option<&'a D::Texture>,
    pub vertex_count: u32,
}

impl<'a, D: GpuDevice> DrawCall<'a, D> {
    pub fn for_unit(unit: &'a DrawUnit<D>) -> Self {
        Self {
            mesh: unit.mesh(),
            material: unit.material_uniform(),
            texture: unit.texture().map(|t| &**t),
            vertex_count: unit.vertex_count(),
        }
    }
}

/// Receives the ordered state and draw commands of a frame.
pub trait DrawTarget<D: GpuDevice> {
    /// Uploads the frame's `Projection * View * Model`.
    fn upload_transform(&mut self, mvp: &Matrix4<f32>);
    fn set_pass_state(&mut self, state: PassState);
    fn draw(&mut self, call: DrawCall<'_, D>);
}

/// Inputs owned by the viewport/input collaborators.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub dt: f32,
    pub rates: AngularRates,
    pub projection: &'a Projection,
    pub camera: &'a CameraSettings,
}

/// Issues the opaque pass, then the transparent pass, and restores the
/// opaque state afterwards.
pub fn draw_scene<D, T>(scene: &Scene<D>, target: &mut T)
where
    D: GpuDevice,
    T: DrawTarget<D>,
{
    draw_phase(scene, FramePhase::DrawOpaque, target);
    draw_phase(scene, FramePhase::DrawTransparent, target);
    target.set_pass_state(PassState::OPAQUE);
}

/// Sets the phase's pass state and draws the units that belong to it, in
/// stored order.
pub fn draw_phase<D, T>(scene: &Scene<D>, phase: FramePhase, target: &mut T)
where
    D: GpuDevice,
    T: DrawTarget<D>,
{
    let Some(state) = phase.pass_state() else {
        return;
    };
    target.set_pass_state(state);
    for unit in scene.units().iter().filter(|u| u.is_transparent() == state.blend) {
        target.draw(DrawCall::for_unit(unit));
    }
}

/// Runs all phases of one frame and returns the uploaded MVP.
pub fn render_frame<D, T>(
    scene: &Scene<D>,
    orbit: &mut OrbitState,
    input: FrameInput<'_>,
    target: &mut T,
) -> Matrix4<f32>
where
    D: GpuDevice,
    T: DrawTarget<D>,
{
    let mvp = compute_transform(orbit, input.rates, input.dt, input.projection, input.camera);
    target.upload_transform(&mvp);
    draw_scene(scene, target);
    mvp
}

/// [`DrawTarget`] recording into an open render pass.
pub struct WgpuTarget<'a, 'pass> {
    pub pass: &'a mut wgpu::RenderPass<'pass>,
    pub queue: &'a wgpu::Queue,
    pub camera: &'a mut CameraResources,
    pub pipelines: &'a Pipelines,
    pub fallback: &'a GpuTexture,
}

impl DrawTarget<WgpuDevice> for WgpuTarget<'_, '_> {
    fn upload_transform(&mut self, mvp: &Matrix4<f32>) {
        self.camera.uniform.update(mvp);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
        self.pass.set_bind_group(0, &self.camera.bind_group, &[]);
    }

    fn set_pass_state(&mut self, state: PassState) {
        let pipeline = if state.depth_write {
            &self.pipelines.opaque
        } else {
            &self.pipelines.transparent
        };
        self.pass.set_pipeline(pipeline);
    }

    fn draw(&mut self, call: DrawCall<'_, WgpuDevice>) {
        let mesh: &GpuMesh = call.mesh;
        if call.vertex_count == 0 {
            log::warn!("skipping draw unit without vertices");
            return;
        }
        self.pass.set_vertex_buffer(0, mesh.positions.slice(..));
        self.pass.set_vertex_buffer(1, mesh.uvs.slice(..));
        self.pass.set_bind_group(1, &mesh.material_bind_group, &[]);
        let texture = match call.texture {
            Some(texture) if call.material.use_texture == 1 => texture,
            _ => self.fallback,
        };
        self.pass.set_bind_group(2, &texture.bind_group, &[]);
        self.pass.draw(0..call.vertex_count, 0..1);
    }
}
