//! Drawing the scene.
//!
//! The [`Renderer`] trait is the seam between the viewer and the GPU: the
//! viewer only ever asks for a new size or for a frame. [`WgpuRenderer`] is
//! the real implementation; tests substitute a recording one.
//!
//! GPU copies of models are created lazily, the first frame a model shows
//! up in the scene, and kept per [`ModelId`]. Node transforms are rewritten
//! every frame, morphed vertex data only when the model's pose changed.

use std::{collections::HashMap, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{CameraResources, PerspectiveCamera},
    config::{RendererSettings, clear_colour},
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{LoadedAsset, Material},
        scene_graph::{ModelId, ModelInstance, Scene},
        texture::Texture,
    },
    pipelines::{
        basic::{MaterialUniform, material_layout, mk_model_pipeline},
        bounds::{line_vertices, mk_bounds_pipeline},
        light::{LightResources, LightUniform},
    },
    viewport::ViewportSize,
};

/// Owns the output surface and draws a scene through a camera.
pub trait Renderer {
    /// Resizes the drawing buffer to `size` logical pixels.
    fn set_size(&mut self, size: ViewportSize);

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()>;
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    material: Option<usize>,
    morphs: bool,
}

struct GpuModel {
    materials: Vec<GpuMaterial>,
    default_material: GpuMaterial,
    /// Indexed like `LoadedAsset::meshes`.
    meshes: Vec<Vec<GpuPrimitive>>,
    /// One `InstanceRaw` per node.
    instances: wgpu::Buffer,
    revision: u64,
}

impl GpuModel {
    fn material(&self, idx: Option<usize>) -> &GpuMaterial {
        idx.and_then(|idx| self.materials.get(idx))
            .unwrap_or(&self.default_material)
    }
}

struct HelperLines {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    helper_count: usize,
}

pub struct WgpuRenderer {
    ctx: Context,
    depth_texture: Texture,
    msaa_target: Option<Texture>,
    camera: CameraResources,
    light: LightResources,
    model_pipeline: wgpu::RenderPipeline,
    bounds_pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    white: Arc<Texture>,
    models: HashMap<ModelId, GpuModel>,
    helpers: Option<HelperLines>,
    is_surface_configured: bool,
}

impl WgpuRenderer {
    /// Sets up the GPU for `window`.
    ///
    /// Nothing is drawn before the first [`Renderer::set_size`].
    pub async fn new(window: Arc<Window>, settings: &RendererSettings) -> anyhow::Result<Self> {
        let ctx = Context::new(window, settings).await?;

        let camera = CameraResources::new(&ctx.device);
        let light = LightResources::new(&ctx.device, LightUniform::from_lights(&[]));
        let material_layout = material_layout(&ctx.device);

        let model_pipeline = mk_model_pipeline(
            &ctx.device,
            &ctx.config,
            ctx.sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let bounds_pipeline = mk_bounds_pipeline(
            &ctx.device,
            &ctx.config,
            ctx.sample_count,
            &camera.bind_group_layout,
        );

        let depth_texture = Texture::create_depth_texture(
            &ctx.device,
            [ctx.config.width, ctx.config.height],
            ctx.sample_count,
            "depth_texture",
        );
        let msaa_target = (ctx.sample_count > 1)
            .then(|| Texture::create_msaa_target(&ctx.device, &ctx.config, ctx.sample_count));
        let white = Arc::new(Texture::solid(
            &ctx.device,
            &ctx.queue,
            [255, 255, 255, 255],
            "white",
        ));

        Ok(Self {
            ctx,
            depth_texture,
            msaa_target,
            camera,
            light,
            model_pipeline,
            bounds_pipeline,
            material_layout,
            white,
            models: HashMap::new(),
            helpers: None,
            is_surface_configured: false,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn window(&self) -> &Window {
        &self.ctx.window
    }

    fn recreate_targets(&mut self) {
        self.depth_texture = Texture::create_depth_texture(
            &self.ctx.device,
            [self.ctx.config.width, self.ctx.config.height],
            self.ctx.sample_count,
            "depth_texture",
        );
        if self.ctx.sample_count > 1 {
            self.msaa_target = Some(Texture::create_msaa_target(
                &self.ctx.device,
                &self.ctx.config,
                self.ctx.sample_count,
            ));
        }
    }

    fn upload_material(&self, material: &Material, label: &str) -> GpuMaterial {
        let device = &self.ctx.device;
        let texture = match &material.base_colour_texture {
            Some(image) => Arc::new(Texture::from_rgba(device, &self.ctx.queue, image, label)),
            None => self.white.clone(),
        };
        let sampler = match &texture.sampler {
            Some(sampler) => sampler.clone(),
            None => crate::data_structures::texture::create_default_sampler(device),
        };
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} material", label)),
            contents: bytemuck::cast_slice(&[MaterialUniform {
                base_colour: material.base_colour,
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            label: Some(label),
        });
        GpuMaterial { bind_group }
    }

    fn upload_model(&self, model: &ModelInstance) -> GpuModel {
        let device = &self.ctx.device;
        let asset: &LoadedAsset = model.asset();
        log::debug!("uploading {} ({} meshes)", model.source, asset.meshes.len());

        let materials = asset
            .materials
            .iter()
            .map(|material| self.upload_material(material, &material.name))
            .collect();
        let default_material = self.upload_material(&Material::default(), "default");

        let meshes = asset
            .meshes
            .iter()
            .enumerate()
            .map(|(mesh_idx, mesh)| {
                let weights = model
                    .pose()
                    .morph_weights
                    .get(mesh_idx)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                mesh.primitives
                    .iter()
                    .map(|primitive| {
                        let morphs = !primitive.morph_targets.is_empty();
                        let vertices = primitive.morphed_vertices(weights);
                        let mut usage = wgpu::BufferUsages::VERTEX;
                        if morphs {
                            usage |= wgpu::BufferUsages::COPY_DST;
                        }
                        GpuPrimitive {
                            vertex_buffer: device.create_buffer_init(
                                &wgpu::util::BufferInitDescriptor {
                                    label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
                                    contents: bytemuck::cast_slice(&vertices),
                                    usage,
                                },
                            ),
                            index_buffer: device.create_buffer_init(
                                &wgpu::util::BufferInitDescriptor {
                                    label: Some(&format!("{:?} Index Buffer", mesh.name)),
                                    contents: bytemuck::cast_slice(&primitive.indices),
                                    usage: wgpu::BufferUsages::INDEX,
                                },
                            ),
                            num_indices: primitive.indices.len() as u32,
                            material: primitive.material,
                            morphs,
                        }
                    })
                    .collect()
            })
            .collect();

        let instance_data = instance_data(model);
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        GpuModel {
            materials,
            default_material,
            meshes,
            instances,
            revision: model.revision(),
        }
    }

    /// Brings the GPU copies in line with the scene.
    fn sync(&mut self, scene: &Scene) {
        for model in scene.models() {
            if !self.models.contains_key(&model.id()) {
                let gpu = self.upload_model(model);
                self.models.insert(model.id(), gpu);
                continue;
            }
            let Some(gpu) = self.models.get_mut(&model.id()) else {
                continue;
            };
            if !model.asset().nodes.is_empty() {
                self.ctx.queue.write_buffer(
                    &gpu.instances,
                    0,
                    bytemuck::cast_slice(&instance_data(model)),
                );
            }
            if gpu.revision != model.revision() {
                gpu.revision = model.revision();
                for (mesh_idx, mesh) in model.asset().meshes.iter().enumerate() {
                    let weights = model
                        .pose()
                        .morph_weights
                        .get(mesh_idx)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    for (primitive, uploaded) in mesh.primitives.iter().zip(&gpu.meshes[mesh_idx]) {
                        if uploaded.morphs {
                            self.ctx.queue.write_buffer(
                                &uploaded.vertex_buffer,
                                0,
                                bytemuck::cast_slice(&primitive.morphed_vertices(weights)),
                            );
                        }
                    }
                }
            }
        }

        let helpers = scene.helpers();
        let stale = self
            .helpers
            .as_ref()
            .is_none_or(|lines| lines.helper_count != helpers.len());
        if stale && !helpers.is_empty() {
            let vertices = line_vertices(helpers);
            let buffer = self
                .ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Bounds Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            self.helpers = Some(HelperLines {
                buffer,
                vertex_count: vertices.len() as u32,
                helper_count: helpers.len(),
            });
        }

        self.light
            .update(&self.ctx.queue, LightUniform::from_lights(scene.lights()));
    }

    fn draw(
        &self,
        scene: &Scene,
        view: &wgpu::TextureView,
    ) -> wgpu::CommandBuffer {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let (target, resolve_target) = match &self.msaa_target {
            Some(msaa) => (&msaa.view, Some(view)),
            None => (view, None),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour(scene.background)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.model_pipeline);
            render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.light.bind_group, &[]);

            let stride = std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
            for model in scene.models() {
                let Some(gpu) = self.models.get(&model.id()) else {
                    continue;
                };
                let mut in_scene = Vec::new();
                model.asset().walk(|idx, _| in_scene.push(idx));
                for node_idx in in_scene {
                    let node = &model.asset().nodes[node_idx];
                    let Some(primitives) = node.mesh.and_then(|mesh| gpu.meshes.get(mesh)) else {
                        continue;
                    };
                    let offset = node_idx as wgpu::BufferAddress * stride;
                    render_pass.set_vertex_buffer(1, gpu.instances.slice(offset..offset + stride));
                    for primitive in primitives {
                        render_pass.set_bind_group(
                            0,
                            &gpu.material(primitive.material).bind_group,
                            &[],
                        );
                        render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            primitive.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..primitive.num_indices, 0, 0..1);
                    }
                }
            }

            if let Some(lines) = &self.helpers {
                render_pass.set_pipeline(&self.bounds_pipeline);
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
                render_pass.draw(0..lines.vertex_count, 0..1);
            }
        }

        encoder.finish()
    }
}

impl Renderer for WgpuRenderer {
    fn set_size(&mut self, size: ViewportSize) {
        let [width, height] = self.ctx.resize(size);
        log::debug!(
            "drawing buffer {}x{} for a {}x{} viewport",
            width,
            height,
            size.width,
            size.height
        );
        self.recreate_targets();
        self.is_surface_configured = true;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.camera.update(&self.ctx.queue, camera);
        self.sync(scene);

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let commands = self.draw(scene, &view);
        self.ctx.queue.submit(std::iter::once(commands));
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

/// World matrices of every node, ready for upload.
fn instance_data(model: &ModelInstance) -> Vec<InstanceRaw> {
    model
        .world_matrices()
        .into_iter()
        .map(|world| InstanceRaw::from_world(world.unwrap_or_else(Matrix4::identity)))
        .collect()
}
