//! aviary
//!
//! A small glTF scene viewer for the desktop and the browser. It mounts a
//! drawing surface into a container, loads a few models asynchronously,
//! plays their first animation clip and lets the user orbit around them.
//!
//! High-level modules
//! - `viewer`: the application context tying scene, camera, loads and renderer together
//! - `frame_loop`: per-frame ticking with a stop handle
//! - `flow`: winit event loop and window/canvas setup
//! - `config`: the startup configuration and its defaults
//! - `camera` / `controls`: perspective camera and orbit navigation
//! - `animation`: drivers playing a clip on a model
//! - `data_structures`: scene, models, transforms, bounds and textures
//! - `resources`: loading glTF files, their buffers, images and animations
//! - `render` / `context` / `pipelines`: the wgpu renderer
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod flow;
pub mod frame_loop;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::{AssetSpec, ViewerConfig};
pub use flow::run;
pub use viewer::Viewer;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
