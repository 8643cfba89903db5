//! Viewer data structures: scene, models, transforms and textures.
//!
//! - `scene_graph` holds the scene, its lights and the placed model instances
//! - `model` contains the CPU-side asset data produced by the loader
//! - `instance` is the per-node transformation and its GPU layout
//! - `bounds` computes bounding boxes and describes the debug box helper
//! - `texture` wraps GPU textures

pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
