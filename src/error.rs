//! Typed errors for the scene import path.
//!
//! Only unparsable scene files are fatal. Everything else (broken textures,
//! malformed shapes) degrades a single draw unit and is logged instead of
//! being returned.

use std::path::PathBuf;

use thiserror::Error;

use crate::resources::mesh::MeshError;

pub type Result<T> = std::result::Result<T, SceneError>;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("[scene] could not parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("[scene] shape {shape:?}: {source}")]
    Mesh {
        shape: String,
        #[source]
        source: MeshError,
    },
}
