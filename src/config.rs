//! Viewer configuration.
//!
//! Everything the viewer needs to know before the window opens. The defaults
//! describe the saltwater aquarium reference scene; the `aquarium` binary
//! overrides them from the command line.

use std::path::PathBuf;

use crate::{camera::CameraSettings, resources::Exclusions};

pub const DEFAULT_SCENE: &str = "12987_Saltwater_Aquarium_v1_l1.obj";
pub const DEFAULT_EXCLUDES: [&str; 2] = ["Water", "water"];

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub scene_path: PathBuf,
    /// Directory material libraries and textures are resolved against.
    pub base_dir: PathBuf,
    pub excluded_names: Vec<String>,
    pub window_title: String,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
    pub camera: CameraSettings,
    /// Radians per second while an arrow key is held.
    pub rotation_speed: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene_path: PathBuf::from(DEFAULT_SCENE),
            base_dir: PathBuf::from("./"),
            excluded_names: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            window_title: "Aquarium".to_string(),
            width: 900,
            height: 700,
            clear_colour: wgpu::Color::WHITE,
            camera: CameraSettings::default(),
            rotation_speed: 1.5,
        }
    }
}

impl ViewerConfig {
    pub fn exclusions(&self) -> Exclusions {
        Exclusions::from_names(self.excluded_names.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Point3};

    #[test]
    fn defaults_describe_reference_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.width, 900);
        assert_eq!(config.height, 700);
        assert_eq!(config.rotation_speed, 1.5);
        assert_eq!(config.camera.eye, Point3::new(0.0, 0.0, 40.0));
        assert_eq!(config.camera.center.z, 10.52905);
        assert_eq!(config.camera.fovy, Deg(60.0));
        assert_eq!(config.clear_colour, wgpu::Color::WHITE);
    }

    #[test]
    fn default_exclusions_drop_water() {
        let exclusions = ViewerConfig::default().exclusions();
        assert!(exclusions.excludes("Water", None));
        assert!(exclusions.excludes("glass", Some("water")));
        assert!(!exclusions.excludes("Glass", None));
    }

    #[test]
    fn empty_exclusion_list_keeps_everything() {
        let config = ViewerConfig {
            excluded_names: Vec::new(),
            ..Default::default()
        };
        assert!(config.exclusions().is_empty());
    }
}
