//! Spins an OBJ/MTL scene with the arrow keys.
//!
//! ```text
//! aquarium [SCENE] [--base-dir DIR] [--exclude NAME]... [--no-default-excludes]
//! ```

use std::path::{Path, PathBuf};

use aquarium_ngin::{config::ViewerConfig, flow};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "aquarium", version, about = "Two-pass OBJ/MTL scene viewer")]
struct Args {
    /// Scene file to load
    scene: Option<PathBuf>,

    /// Directory material libraries and textures are resolved against,
    /// defaults to the scene file's directory
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Shape or material name to skip, may be repeated
    #[arg(long = "exclude", value_name = "NAME")]
    excludes: Vec<String>,

    /// Do not skip the `Water`/`water` shapes
    #[arg(long)]
    no_default_excludes: bool,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

impl Args {
    fn into_config(self) -> ViewerConfig {
        let mut config = ViewerConfig::default();
        if let Some(scene) = self.scene {
            config.base_dir = scene_dir(&scene);
            config.scene_path = scene;
        }
        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if self.no_default_excludes {
            config.excluded_names.clear();
        }
        config.excluded_names.extend(self.excludes);
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        config
    }
}

/// Directory of `scene`, `./` for a bare file name.
fn scene_dir(scene: &Path) -> PathBuf {
    match scene.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("./"),
    }
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    if let Err(e) = builder.try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Args::parse().into_config();
    log::info!(
        "Loading {:?} (materials and textures from {:?})",
        config.scene_path,
        config.base_dir
    );
    flow::run(config)
}
