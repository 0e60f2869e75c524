//! Recording stand-ins for the GPU seams plus OBJ/MTL fixture helpers.
#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use aquarium_ngin::{
    Matrix4,
    data_structures::draw_unit::MaterialUniform,
    device::GpuDevice,
    render::{DrawCall, DrawTarget, PassState},
    resources::texture::{DecodedImage, ImageDecoder},
};
use tempfile::TempDir;

#[derive(Debug, PartialEq)]
pub(crate) struct MockTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

#[derive(Debug)]
pub(crate) struct MockMesh {
    pub label: String,
    pub vertex_count: usize,
    pub material: MaterialUniform,
}

/// Counts uploads instead of talking to a GPU.
#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    pub texture_uploads: Vec<String>,
    pub mesh_uploads: Vec<String>,
    /// Largest accepted texture side, unlimited when `None`.
    pub max_dimension: Option<u32>,
}

impl MockDevice {
    pub fn with_max_dimension(max: u32) -> Self {
        Self {
            max_dimension: Some(max),
            ..Default::default()
        }
    }
}

impl GpuDevice for MockDevice {
    type Texture = MockTexture;
    type Mesh = MockMesh;

    fn upload_texture(
        &mut self,
        label: &str,
        image: DecodedImage,
    ) -> anyhow::Result<MockTexture> {
        if let Some(max) = self.max_dimension {
            anyhow::ensure!(
                image.width <= max && image.height <= max,
                "{}x{} exceeds {}",
                image.width,
                image.height,
                max
            );
        }
        self.texture_uploads.push(label.to_string());
        Ok(MockTexture {
            label: label.to_string(),
            width: image.width,
            height: image.height,
            channels: image.channels,
        })
    }

    fn upload_mesh(
        &mut self,
        label: &str,
        positions: &[[f32; 3]],
        uvs: &[[f32; 2]],
        material: &MaterialUniform,
    ) -> MockMesh {
        assert_eq!(positions.len(), uvs.len());
        self.mesh_uploads.push(label.to_string());
        MockMesh {
            label: label.to_string(),
            vertex_count: positions.len(),
            material: *material,
        }
    }
}

/// In-memory images keyed by the full path the cache asks for.
#[derive(Debug, Default)]
pub(crate) struct MockDecoder {
    images: HashMap<PathBuf, DecodedImage>,
    calls: Cell<usize>,
}

impl MockDecoder {
    pub fn with_image(mut self, path: impl Into<PathBuf>, image: DecodedImage) -> Self {
        self.images.insert(path.into(), image);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ImageDecoder for MockDecoder {
    fn decode(&self, path: &Path) -> anyhow::Result<DecodedImage> {
        self.calls.set(self.calls.get() + 1);
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no image at {:?}", path))
    }
}

pub(crate) fn rgba(width: u32, height: u32) -> DecodedImage {
    DecodedImage {
        width,
        height,
        channels: 4,
        pixels: vec![255; (width * height * 4) as usize],
    }
}

pub(crate) fn rgb(width: u32, height: u32) -> DecodedImage {
    DecodedImage {
        width,
        height,
        channels: 3,
        pixels: vec![128; (width * height * 3) as usize],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedDraw {
    pub label: String,
    pub state: PassState,
    pub opacity: f32,
    pub use_texture: u32,
    pub texture: Option<String>,
    pub vertex_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Transform(Matrix4<f32>),
    State(PassState),
    Draw(RecordedDraw),
}

/// Remembers every command in order together with the pass state in effect.
#[derive(Debug)]
pub(crate) struct RecordingTarget {
    pub commands: Vec<Command>,
    state: PassState,
}

impl Default for RecordingTarget {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            state: PassState::OPAQUE,
        }
    }
}

impl RecordingTarget {
    pub fn draws(&self) -> Vec<&RecordedDraw> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn current_state(&self) -> PassState {
        self.state
    }
}

impl DrawTarget<MockDevice> for RecordingTarget {
    fn upload_transform(&mut self, mvp: &Matrix4<f32>) {
        self.commands.push(Command::Transform(*mvp));
    }

    fn set_pass_state(&mut self, state: PassState) {
        self.state = state;
        self.commands.push(Command::State(state));
    }

    fn draw(&mut self, call: DrawCall<'_, MockDevice>) {
        self.commands.push(Command::Draw(RecordedDraw {
            label: call.mesh.label.clone(),
            state: self.state,
            opacity: call.material.opacity,
            use_texture: call.material.use_texture,
            texture: call.texture.map(|t| t.label.clone()),
            vertex_count: call.vertex_count,
        }));
    }
}

/// A scene directory on disk, removed when dropped.
pub(crate) struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Writes a real PNG so the file decoder can be exercised.
    pub fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.dir.path().join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write png");
        path
    }
}

/// Two quads (`Glass`, `Water`) and a lone triangle (`Sand`).
pub(crate) const TANK_OBJ: &str = "\
mtllib tank.mtl
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
o Glass
usemtl glass
f 1/1 2/2 3/3 4/4
o Water
usemtl water
f 1/1 2/2 3/3 4/4
o Sand
usemtl sand
f 1/1 2/2 3/3
";

pub(crate) const TANK_MTL: &str = "\
newmtl glass
Kd 0.8 0.9 1.0
d 0.5
newmtl water
Kd 0.0 0.3 0.8
d 0.4
newmtl sand
Kd 0.9 0.8 0.6
map_Kd sand.png
";
