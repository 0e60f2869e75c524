//! Orbit camera: key-driven rotation of the model around its center, seen
//! from a fixed eye.
//!
//! All per-frame state is owned by the caller ([`OrbitState`] and
//! [`OrbitController`]) so [`compute_transform`] is a pure function of its
//! inputs and can be driven with synthetic `dt` values.

use cgmath::{Deg, Matrix4, Point3, Rad, SquareMatrix, Vector3, perspective};
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// cgmath builds OpenGL clip space (z in -1..1), wgpu expects 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Fixed camera constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Model-space point moved to the origin before rotating.
    pub center: Vector3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 40.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            center: Vector3::new(0.0, 0.0, 10.52905),
            fovy: Deg(60.0),
            znear: 0.1,
            zfar: 200.0,
        }
    }
}

/// Accumulated model rotation in radians. Never wrapped, only its sine and
/// cosine are ever used.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub angle_x: f32,
    pub angle_y: f32,
}

/// Instantaneous rotation speeds in radians per second.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct AngularRates {
    pub pitch: f32,
    pub yaw: f32,
}

impl OrbitState {
    /// Euler step: `angle += rate * dt`.
    pub fn integrate(&mut self, rates: AngularRates, dt: f32) {
        self.angle_x += rates.pitch * dt;
        self.angle_y += rates.yaw * dt;
    }
}

/// Turns arrow key presses into [`AngularRates`].
#[derive(Debug, Clone, Copy)]
pub struct OrbitController {
    speed: f32,
    rates: AngularRates,
}

impl OrbitController {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            rates: AngularRates::default(),
        }
    }

    pub fn rates(&self) -> AngularRates {
        self.rates
    }

    /// Returns `true` when the key changed the rotation.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match (key, pressed) {
            (KeyCode::ArrowLeft, true) => self.rates.yaw = -self.speed,
            (KeyCode::ArrowRight, true) => self.rates.yaw = self.speed,
            (KeyCode::ArrowUp, true) => self.rates.pitch = -self.speed,
            (KeyCode::ArrowDown, true) => self.rates.pitch = self.speed,
            (KeyCode::ArrowLeft | KeyCode::ArrowRight, false) => self.rates.yaw = 0.0,
            (KeyCode::ArrowUp | KeyCode::ArrowDown, false) => self.rates.pitch = 0.0,
            _ => return false,
        }
        true
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.process_keyboard(*key, *state),
            _ => false,
        }
    }
}

/// Perspective projection whose aspect follows the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// `Translate(-center) * RotateX(angle_x) * RotateY(angle_y)`
pub fn model_matrix(orbit: &OrbitState, center: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(-center)
        * Matrix4::from_angle_x(Rad(orbit.angle_x))
        * Matrix4::from_angle_y(Rad(orbit.angle_y))
}

pub fn view_matrix(settings: &CameraSettings) -> Matrix4<f32> {
    Matrix4::look_at_rh(settings.eye, settings.target, settings.up)
}

/// The ComputeTransform phase of a frame.
///
/// Advances `orbit` by `rates * dt` and returns `Projection * View * Model`
/// in OpenGL clip space.
pub fn compute_transform(
    orbit: &mut OrbitState,
    rates: AngularRates,
    dt: f32,
    projection: &Projection,
    settings: &CameraSettings,
) -> Matrix4<f32> {
    orbit.integrate(rates, dt);
    projection.calc_matrix() * view_matrix(settings) * model_matrix(orbit, settings.center)
}

/// MVP as uploaded to the vertex shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    /// Stores `mvp` converted to wgpu clip space.
    pub fn update(&mut self, mvp: &Matrix4<f32>) {
        self.view_proj = (OPENGL_TO_WGPU_MATRIX * mvp).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera: uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    fn close(a: Vector4<f32>, b: Vector4<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn integrates_rates_over_dt() {
        let mut orbit = OrbitState::default();
        let rates = AngularRates {
            pitch: 1.5,
            yaw: -1.5,
        };
        orbit.integrate(rates, 0.5);
        orbit.integrate(rates, 0.5);
        assert!((orbit.angle_x - 1.5).abs() < 1e-6);
        assert!((orbit.angle_y + 1.5).abs() < 1e-6);
    }

    #[test]
    fn angles_accumulate_without_wrapping() {
        let mut orbit = OrbitState::default();
        let rates = AngularRates { pitch: 0.0, yaw: 10.0 };
        for _ in 0..10 {
            orbit.integrate(rates, 1.0);
        }
        assert!((orbit.angle_y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn model_moves_origin_to_negative_center() {
        let orbit = OrbitState {
            angle_x: 0.7,
            angle_y: -1.1,
        };
        let center = Vector3::new(0.0, 0.0, 10.52905);
        let origin = model_matrix(&orbit, center) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(close(origin, Vector4::new(0.0, 0.0, -10.52905, 1.0)));
    }

    #[test]
    fn yaw_is_applied_before_pitch() {
        // Model = Rx * Ry, so a point on +x is first yawed onto -z, then pitched.
        let orbit = OrbitState {
            angle_x: std::f32::consts::FRAC_PI_2,
            angle_y: std::f32::consts::FRAC_PI_2,
        };
        let p = model_matrix(&orbit, Vector3::new(0.0, 0.0, 0.0))
            * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(close(p, Vector4::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_dt_leaves_transform_unchanged() {
        let settings = CameraSettings::default();
        let projection = Projection::new(900, 700, settings.fovy, settings.znear, settings.zfar);
        let mut orbit = OrbitState::default();
        let rates = AngularRates { pitch: 3.0, yaw: 3.0 };
        let a = compute_transform(&mut orbit, rates, 0.0, &projection, &settings);
        let b = compute_transform(&mut orbit, rates, 0.0, &projection, &settings);
        assert_eq!(a, b);
        assert_eq!(orbit, OrbitState::default());
    }

    #[test]
    fn center_projects_to_screen_center() {
        // with no rotation the model origin lands on the view axis
        let settings = CameraSettings::default();
        let projection = Projection::new(900, 700, settings.fovy, settings.znear, settings.zfar);
        let mut orbit = OrbitState::default();
        let mvp = compute_transform(
            &mut orbit,
            AngularRates::default(),
            0.016,
            &projection,
            &settings,
        );
        let clip = mvp * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut projection = Projection::new(900, 700, Deg(60.0), 0.1, 200.0);
        assert!((projection.aspect() - 900.0 / 700.0).abs() < 1e-6);
        projection.resize(400, 200);
        assert_eq!(projection.aspect(), 2.0);
        projection.resize(400, 0);
        assert_eq!(projection.aspect(), 1.0);
    }

    #[test]
    fn arrow_keys_drive_rates() {
        let mut controller = OrbitController::new(1.5);
        assert!(controller.process_keyboard(KeyCode::ArrowLeft, ElementState::Pressed));
        assert!(controller.process_keyboard(KeyCode::ArrowDown, ElementState::Pressed));
        assert_eq!(
            controller.rates(),
            AngularRates {
                pitch: 1.5,
                yaw: -1.5
            }
        );
        controller.process_keyboard(KeyCode::ArrowRight, ElementState::Released);
        assert_eq!(controller.rates().yaw, 0.0);
        assert_eq!(controller.rates().pitch, 1.5);
        controller.process_keyboard(KeyCode::ArrowUp, ElementState::Released);
        assert_eq!(controller.rates(), AngularRates::default());
        assert!(!controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed));
    }
}
