//! Render pipelines and the uniforms they read.
//!
//! - `basic`: lit, textured glTF meshes
//! - `bounds`: yellow wireframe boxes for bounds helpers
//! - `light`: directional and hemisphere light uniform

pub mod basic;
pub mod bounds;
pub mod light;
