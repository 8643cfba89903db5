//! CPU-side model data as produced by the loader.
//!
//! Nothing in here touches the GPU: a [`LoadedAsset`] can be created, placed
//! and animated without a device. The renderer uploads it lazily the first
//! time it is drawn.

use std::sync::Arc;

use crate::{data_structures::instance::Instance, resources::animation::AnimationClip};

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub colour: [f32; 4],
}

impl Default for ModelVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 1.0, 0.0],
            tex_coords: [0.0; 2],
            colour: [1.0; 4],
        }
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// A single draw call worth of geometry.
#[derive(Clone, Debug, Default)]
pub struct Primitive {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Position offsets per morph target, one entry per vertex.
    pub morph_targets: Vec<Vec<[f32; 3]>>,
    pub material: Option<usize>,
}

impl Primitive {
    /// Vertices with the morph targets blended in using `weights`.
    pub fn morphed_vertices(&self, weights: &[f32]) -> Vec<ModelVertex> {
        let mut vertices = self.vertices.clone();
        for (target, &weight) in self.morph_targets.iter().zip(weights) {
            if weight == 0.0 {
                continue;
            }
            for (vertex, offset) in vertices.iter_mut().zip(target) {
                vertex.position[0] += offset[0] * weight;
                vertex.position[1] += offset[1] * weight;
                vertex.position[2] += offset[2] * weight;
            }
        }
        vertices
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
    /// Morph weights used when no animation drives them.
    pub default_weights: Vec<f32>,
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub base_colour: [f32; 4],
    pub base_colour_texture: Option<Arc<image::RgbaImage>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_colour: [1.0; 4],
            base_colour_texture: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: Option<String>,
    /// Local transform as authored.
    pub rest: Instance,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// The payload of a successful load: a scene graph fragment plus its animations.
#[derive(Clone, Debug, Default)]
pub struct LoadedAsset {
    pub name: String,
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl LoadedAsset {
    /// Visits every node reachable from the roots, parents before children.
    pub fn walk(&self, mut visit: impl FnMut(usize, Option<usize>)) {
        let mut stack: Vec<(usize, Option<usize>)> =
            self.roots.iter().rev().map(|&root| (root, None)).collect();
        while let Some((idx, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(idx) else {
                log::warn!("{}: node {} does not exist", self.name, idx);
                continue;
            };
            visit(idx, parent);
            stack.extend(node.children.iter().rev().map(|&child| (child, Some(idx))));
        }
    }
}
