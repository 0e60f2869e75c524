use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{Context, ensure};

use crate::device::GpuDevice;

/// Upload layout picked from the decoded channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn from_channels(channels: u8) -> Self {
        if channels == 3 { Self::Rgb } else { Self::Rgba }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// CPU-side pixels as handed out by an [`ImageDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Tightly packed rows, `layout().bytes_per_pixel()` bytes per pixel.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn layout(&self) -> PixelLayout {
        PixelLayout::from_channels(self.channels)
    }

    fn check(&self) -> anyhow::Result<()> {
        ensure!(self.width > 0 && self.height > 0, "image has zero size");
        let expected =
            self.width as usize * self.height as usize * self.layout().bytes_per_pixel();
        ensure!(
            self.pixels.len() == expected,
            "pixel buffer holds {} bytes, {} expected",
            self.pixels.len(),
            expected
        );
        Ok(())
    }
}

/// Decoder service consumed by the [`TextureCache`].
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> anyhow::Result<DecodedImage>;
}

/// Reads images from disk and decodes them with the `image` crate.
///
/// RGB sources stay 3-channel, everything else (grey, grey+alpha, RGBA,
/// 16 bit, float) is converted to 8 bit RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> anyhow::Result<DecodedImage> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {:?}", path))?;
        let img = image::load_from_memory(&bytes).with_context(|| format!("decoding {:?}", path))?;
        let decoded = if img.color().channel_count() == 3 {
            let rgb = img.to_rgb8();
            DecodedImage {
                width: rgb.width(),
                height: rgb.height(),
                channels: 3,
                pixels: rgb.into_raw(),
            }
        } else {
            let rgba = img.to_rgba8();
            DecodedImage {
                width: rgba.width(),
                height: rgba.height(),
                channels: 4,
                pixels: rgba.into_raw(),
            }
        };
        Ok(decoded)
    }
}

/// Deduplicates texture uploads by the path string written in the material file.
///
/// Entries are keyed by the raw string, so `a.png` and `./a.png` are two
/// entries. Decoding happens relative to `root`. Failed loads are not cached.
pub struct TextureCache<D: GpuDevice> {
    root: PathBuf,
    entries: HashMap<String, Rc<D::Texture>>,
}

impl<D: GpuDevice> TextureCache<D> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
        }
    }

    /// Returns the texture for `path`, decoding and uploading it on first use.
    ///
    /// `None` means the image could not be loaded; the caller renders with
    /// its base colour instead.
    pub fn resolve(
        &mut self,
        path: &str,
        decoder: &impl ImageDecoder,
        device: &mut D,
    ) -> Option<Rc<D::Texture>> {
        if let Some(texture) = self.entries.get(path) {
            return Some(Rc::clone(texture));
        }

        let full_path = self.root.join(path);
        let image = match decoder
            .decode(&full_path)
            .and_then(|image| image.check().map(|_| image))
        {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Failed to load texture {:?}: {:#}", full_path, e);
                return None;
            }
        };
        log::debug!(
            "Uploading texture {} ({}x{}, {:?})",
            path,
            image.width,
            image.height,
            image.layout()
        );
        let texture = match device.upload_texture(path, image) {
            Ok(texture) => Rc::new(texture),
            Err(e) => {
                log::warn!("Failed to upload texture {:?}: {:#}", full_path, e);
                return None;
            }
        };
        self.entries.insert(path.to_string(), Rc::clone(&texture));
        Some(texture)
    }

    pub fn get(&self, path: &str) -> Option<&Rc<D::Texture>> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("diffuse texture_bind_group_layout"),
    })
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("material_bind_group_layout"),
    })
}
