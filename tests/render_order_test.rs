use aquarium_ngin::{
    camera::{AngularRates, CameraSettings, OrbitState, Projection},
    data_structures::draw_unit::{DrawUnit, Material, Scene},
    render::{FrameInput, PassState, draw_scene, render_frame},
    resources::texture::TextureCache,
};

use crate::common::test_utils::{Command, MockDecoder, MockDevice, RecordingTarget, rgba};

mod common;

fn triangle() -> (Vec<[f32; 3]>, Vec<[f32; 2]>) {
    (
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]],
    )
}

fn unit(
    device: &mut MockDevice,
    name: &str,
    material: Material<MockDevice>,
) -> DrawUnit<MockDevice> {
    let (positions, uvs) = triangle();
    DrawUnit::new(device, name, positions, uvs, material).expect("valid triangle")
}

fn with_opacity(opacity: f32) -> Material<MockDevice> {
    Material {
        opacity,
        ..Default::default()
    }
}

/// Source order: glass (transparent), rock (opaque), film (transparent), sand (opaque).
fn mixed_scene() -> Scene<MockDevice> {
    let mut device = MockDevice::default();
    let units = vec![
        unit(&mut device, "glass", with_opacity(0.5)),
        unit(&mut device, "rock", with_opacity(1.0)),
        unit(&mut device, "film", with_opacity(0.2)),
        unit(&mut device, "sand", with_opacity(0.999)),
    ];
    Scene::new(units, TextureCache::new("."))
}

#[test]
fn opaque_units_are_drawn_before_transparent_ones() {
    let scene = mixed_scene();
    let mut target = RecordingTarget::default();

    draw_scene(&scene, &mut target);

    let order: Vec<_> = target.draws().iter().map(|d| d.label.clone()).collect();
    assert_eq!(order, vec!["rock", "sand", "glass", "film"]);
}

#[test]
fn depth_writes_are_off_only_for_transparent_draws() {
    let scene = mixed_scene();
    let mut target = RecordingTarget::default();

    draw_scene(&scene, &mut target);

    for draw in target.draws() {
        let transparent = draw.opacity < 0.999;
        assert_eq!(draw.state.depth_write, !transparent, "{}", draw.label);
        assert_eq!(draw.state.blend, transparent, "{}", draw.label);
        assert!(draw.state.depth_test);
    }
}

#[test]
fn opaque_state_is_restored_after_the_frame() {
    let scene = mixed_scene();
    let mut target = RecordingTarget::default();

    draw_scene(&scene, &mut target);

    let states: Vec<_> = target
        .commands
        .iter()
        .filter_map(|c| match c {
            Command::State(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![PassState::OPAQUE, PassState::TRANSPARENT, PassState::OPAQUE]
    );
    assert_eq!(target.current_state(), PassState::OPAQUE);
}

#[test]
fn transform_is_uploaded_before_any_draw() {
    let scene = mixed_scene();
    let settings = CameraSettings::default();
    let projection = Projection::new(900, 700, settings.fovy, settings.znear, settings.zfar);
    let mut orbit = OrbitState::default();
    let mut target = RecordingTarget::default();

    let mvp = render_frame(
        &scene,
        &mut orbit,
        FrameInput {
            dt: 0.5,
            rates: AngularRates { pitch: 0.0, yaw: 1.5 },
            projection: &projection,
            camera: &settings,
        },
        &mut target,
    );

    assert_eq!(target.commands.first(), Some(&Command::Transform(mvp)));
    assert_eq!(target.draws().len(), 4);
    assert!((orbit.angle_y - 0.75).abs() < 1e-6);
}

#[test]
fn empty_scene_only_switches_state() {
    let scene = Scene::<MockDevice>::new(Vec::new(), TextureCache::new("."));
    let mut target = RecordingTarget::default();

    draw_scene(&scene, &mut target);

    assert!(target.draws().is_empty());
    assert_eq!(target.commands.len(), 3);
}

#[test]
fn textured_units_bind_their_texture() {
    let mut device = MockDevice::default();
    let decoder = MockDecoder::default().with_image("./shell.png", rgba(1, 1));
    let mut textures = TextureCache::new(".");
    let shell = textures.resolve("shell.png", &decoder, &mut device);
    assert!(shell.is_some());

    let units = vec![
        unit(
            &mut device,
            "shell",
            Material {
                texture: shell,
                ..Default::default()
            },
        ),
        unit(&mut device, "plain", Material::default()),
    ];
    let scene = Scene::new(units, textures);
    let mut target = RecordingTarget::default();

    draw_scene(&scene, &mut target);

    let draws = target.draws();
    assert_eq!(draws[0].use_texture, 1);
    assert_eq!(draws[0].texture.as_deref(), Some("shell.png"));
    assert_eq!(draws[1].use_texture, 0);
    assert_eq!(draws[1].texture, None);
}
