//! Application event loop.
//!
//! The viewer has exactly two stages:
//! 1. on `resumed`: create the window and GPU [`Context`], then import the
//!    scene once into a [`Scene`]
//! 2. on every `RedrawRequested`: advance the orbit by the elapsed time and
//!    record the opaque and transparent passes
//!
//! Arrow keys feed the [`OrbitController`], resizes reconfigure the surface
//! and projection. A failed import closes the window and is returned from
//! [`run`].

use std::{iter, sync::Arc};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    camera::{OrbitController, OrbitState},
    config::ViewerConfig,
    context::Context,
    data_structures::draw_unit::Scene,
    device::WgpuDevice,
    render::{FrameInput, WgpuTarget, render_frame},
    resources::Importer,
};

/// GPU context plus the imported scene.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Scene<WgpuDevice>,
    device: WgpuDevice,
    orbit: OrbitState,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config)
            .await
            .context("App initialization failed. Cannot create the main context")?;
        let mut device = WgpuDevice::new(&ctx.device, &ctx.queue);
        let scene = Importer::new(config.exclusions())
            .import(&config.scene_path, &config.base_dir, &mut device)
            .with_context(|| format!("could not import {:?}", config.scene_path))?;
        Ok(Self {
            ctx,
            scene,
            device,
            orbit: OrbitState::default(),
            is_surface_configured: true,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.is_surface_configured = self.ctx.resize(width, height);
    }

    fn render(&mut self, controller: &OrbitController, dt: f32) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            let mut target = WgpuTarget {
                pass: &mut render_pass,
                queue: &self.ctx.queue,
                camera: &mut self.ctx.camera,
                pipelines: &self.ctx.pipelines,
                fallback: self.device.fallback(),
            };
            let input = FrameInput {
                dt,
                rates: controller.rates(),
                projection: &self.ctx.projection,
                camera: &self.ctx.camera_settings,
            };
            render_frame(&self.scene, &mut self.orbit, input, &mut target);
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: ViewerConfig,
    state: Option<AppState>,
    controller: OrbitController,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        let controller = OrbitController::new(config.rotation_speed);
        Ok(Self {
            async_runtime,
            config,
            state: None,
            controller,
            last_time: Instant::now(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match self
            .async_runtime
            .block_on(AppState::new(window, &self.config))
        {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
                self.last_time = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        self.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed().as_secs_f32();
                self.last_time = Instant::now();

                match state.render(&self.controller, dt) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Opens the viewer window and blocks until it is closed.
///
/// Returns the import or GPU setup error if the scene never made it to the
/// screen.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
