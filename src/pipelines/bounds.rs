use crate::{
    data_structures::{bounds::BoundsHelper, model::Vertex, texture::Texture},
    pipelines::basic::{PipelineTarget, mk_render_pipeline},
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Line list for all helpers: two vertices per box edge.
pub fn line_vertices(helpers: &[BoundsHelper]) -> Vec<LineVertex> {
    helpers
        .iter()
        .flat_map(|helper| {
            helper.aabb.edges().into_iter().flat_map(move |(from, to)| {
                [from, to].map(|point| LineVertex {
                    position: point.into(),
                    colour: helper.colour,
                })
            })
        })
        .collect()
}

pub fn mk_bounds_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Bounds Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Bounds Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("bounds.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        PipelineTarget {
            color_format: config.format,
            depth_format: Some(Texture::DEPTH_FORMAT),
            sample_count,
        },
        wgpu::PrimitiveTopology::LineList,
        None,
        &[LineVertex::desc()],
        shader,
    )
}
