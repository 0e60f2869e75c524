//! Engine data structures: draw units, the scene store and GPU textures.
//!
//! - `draw_unit` holds the per-material triangle batches and the [`draw_unit::Scene`] that owns them
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod draw_unit;
pub mod texture;
