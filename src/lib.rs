//! aquarium-ngin
//!
//! Loads a textured Wavefront OBJ/MTL scene, turns every shape into a GPU
//! resident batch grouped by material and renders the result with the
//! classic two-pass order: opaque batches first, then alpha-blended batches
//! with depth writes switched off.
//!
//! High-level modules
//! - `camera`: orbit state, key-driven rates and the per-frame MVP transform
//! - `config`: viewer configuration (scene path, exclusions, camera constants)
//! - `context`: window/surface/device context that owns the render pipelines
//! - `data_structures`: draw units, the scene store and GPU texture wrappers
//! - `device`: the resource-creation seam and its wgpu implementation
//! - `error`: typed import errors
//! - `flow`: winit event loop that drives import and the frame loop
//! - `pipelines`: opaque and transparent render pipelines
//! - `resources`: OBJ parsing, face expansion, texture cache and the importer
//! - `render`: the per-frame draw-pass state machine
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod device;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::{Deg, Matrix4, Point3, Vector3};
pub use winit::event::WindowEvent;
pub use winit::keyboard::KeyCode;
