use std::sync::Arc;

use anyhow::{Context, bail};
use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    data_structures::model::{LoadedAsset, Material, Mesh, ModelVertex, Node, Primitive},
    resources::{
        animation::{AnimationClip, Channel, Interpolation, Keyframes},
        texture::{decode_image, load_binary, sibling_path},
    },
};

/**
 * This module contains all logic for loading models and their textures and
 * animations from external files.
 */
pub mod animation;
pub mod queue;
pub mod texture;

/// Something that turns an asset path into a loaded model, eventually.
///
/// Every call is independent: there is no ordering between two loads and no
/// way to cancel one once issued.
pub trait ModelLoader {
    fn load(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>>;
}

/// Loads `.glb` and `.gltf` files from the assets root.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfLoader;

impl ModelLoader for GltfLoader {
    fn load(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>> {
        let path = path.to_string();
        async move { load_model_gltf(&path).await }.boxed_local()
    }
}

pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<LoadedAsset> {
    let bytes = load_binary(file_name).await?;
    parse_gltf(file_name, &bytes)
        .await
        .with_context(|| format!("{} is not a valid glTF file", file_name))
}

fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Parses glTF JSON or binary glTF. External buffers and images are fetched
/// relative to `file_name`.
pub async fn parse_gltf(file_name: &str, bytes: &[u8]) -> anyhow::Result<LoadedAsset> {
    let mut gltf = gltf::Gltf::from_slice(bytes)?;

    // Load buffers
    let embedded_only = gltf.buffers().all(|buffer| match buffer.source() {
        gltf::buffer::Source::Bin => true,
        gltf::buffer::Source::Uri(uri) => is_data_uri(uri),
    });
    let buffer_data: Vec<Vec<u8>> = if embedded_only {
        gltf::import_buffers(&gltf.document, None, gltf.blob.take())?
            .into_iter()
            .map(|data| data.0)
            .collect()
    } else {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                    Some(blob) => buffer_data.push(blob.to_vec()),
                    None => bail!("buffer {} refers to a missing binary chunk", buffer.index()),
                },
                gltf::buffer::Source::Uri(uri) if is_data_uri(uri) => {
                    bail!("mixing embedded and external buffers is not supported")
                }
                gltf::buffer::Source::Uri(uri) => {
                    let bin = load_binary(&sibling_path(file_name, uri)).await?;
                    buffer_data.push(bin);
                }
            }
        }
        buffer_data
    };

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let texture = match pbr.base_color_texture() {
            Some(info) => load_material_texture(file_name, info.texture().source().source(), &buffer_data)
                .await
                .unwrap_or_else(|e| {
                    log::warn!("{}: base colour texture dropped: {:#}", file_name, e);
                    None
                }),
            None => None,
        };
        materials.push(Material {
            name: material.name().unwrap_or("unnamed_material").to_string(),
            base_colour: pbr.base_color_factor(),
            base_colour_texture: texture.map(Arc::new),
        });
    }

    let meshes = gltf
        .meshes()
        .map(|mesh| to_mesh(mesh, &buffer_data))
        .collect();

    let nodes = gltf
        .nodes()
        .map(|node| Node {
            name: node.name().map(str::to_string),
            rest: node.transform().into(),
            mesh: node.mesh().map(|mesh| mesh.index()),
            children: node.children().map(|child| child.index()).collect(),
        })
        .collect();

    let roots = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .map(|scene| scene.nodes().map(|node| node.index()).collect())
        .unwrap_or_default();

    let clips = gltf
        .animations()
        .enumerate()
        .map(|(idx, animation)| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Animation {}", idx));
            let channels = animation
                .channels()
                .filter_map(|channel| to_channel(channel, &buffer_data))
                .collect();
            Arc::new(AnimationClip::new(name, channels))
        })
        .collect();

    Ok(LoadedAsset {
        name: file_name.to_string(),
        nodes,
        roots,
        meshes,
        materials,
        clips,
    })
}

async fn load_material_texture(
    file_name: &str,
    source: gltf::image::Source<'_>,
    buffer_data: &[Vec<u8>],
) -> anyhow::Result<Option<image::RgbaImage>> {
    match source {
        gltf::image::Source::View { view, mime_type } => {
            let start = view.offset();
            let end = start + view.length();
            let bytes = buffer_data
                .get(view.buffer().index())
                .and_then(|buffer| buffer.get(start..end))
                .context("image view points outside its buffer")?;
            decode_image(bytes, Some(mime_type)).map(Some)
        }
        gltf::image::Source::Uri { uri, .. } if is_data_uri(uri) => {
            log::warn!("{}: embedded data-uri images are not supported", file_name);
            Ok(None)
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            let bytes = load_binary(&sibling_path(file_name, uri)).await?;
            decode_image(&bytes, mime_type).map(Some)
        }
    }
}

fn to_mesh(mesh: gltf::Mesh, buffer_data: &[Vec<u8>]) -> Mesh {
    let name = mesh.name().unwrap_or("unknown_mesh").to_string();
    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "{}: skipping primitive {} with unsupported mode {:?}",
                name,
                primitive.index(),
                primitive.mode()
            );
            continue;
        }
        let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

        let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
            Some(positions) => positions
                .map(|position| ModelVertex {
                    position,
                    ..Default::default()
                })
                .collect(),
            None => {
                log::warn!("{}: primitive {} has no positions", name, primitive.index());
                continue;
            }
        };
        if let Some(normals) = reader.read_normals() {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
        }
        if let Some(tex_coords) = reader.read_tex_coords(0) {
            vertices
                .iter_mut()
                .zip(tex_coords.into_f32())
                .for_each(|(vertex, tex_coords)| vertex.tex_coords = tex_coords);
        }
        if let Some(colours) = reader.read_colors(0) {
            vertices
                .iter_mut()
                .zip(colours.into_rgba_f32())
                .for_each(|(vertex, colour)| vertex.colour = colour);
        }

        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };

        let morph_targets = reader
            .read_morph_targets()
            .map(|(positions, _, _)| match positions {
                Some(positions) => positions.collect(),
                None => vec![[0.0; 3]; vertices.len()],
            })
            .collect();

        primitives.push(Primitive {
            vertices,
            indices,
            morph_targets,
            material: primitive.material().index(),
        });
    }

    let target_count = primitives
        .iter()
        .map(|primitive| primitive.morph_targets.len())
        .max()
        .unwrap_or(0);
    let default_weights = match mesh.weights() {
        Some(weights) => weights.to_vec(),
        None => vec![0.0; target_count],
    };

    Mesh {
        name,
        primitives,
        default_weights,
    }
}

fn to_channel(channel: gltf::animation::Channel, buffer_data: &[Vec<u8>]) -> Option<Channel> {
    let node = channel.target().node().index();
    let interpolation: Interpolation = channel.sampler().interpolation().into();
    let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let timestamps: Vec<f32> = match reader.read_inputs() {
        Some(inputs) => inputs.collect(),
        None => {
            log::warn!("No timestamps found in channel {}", channel.index());
            return None;
        }
    };
    let keyframes = match reader.read_outputs() {
        Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
            Keyframes::Translation(translations.map(Into::into).collect())
        }
        Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
            rotations
                .into_f32()
                .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                .collect(),
        ),
        Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
            Keyframes::Scale(scales.map(Into::into).collect())
        }
        Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(weights)) => {
            let weights: Vec<f32> = weights.into_f32().collect();
            let frames = match interpolation {
                Interpolation::CubicSpline => timestamps.len() * 3,
                _ => timestamps.len(),
            };
            if frames == 0 || weights.len() % frames != 0 {
                log::warn!("Morph weights of channel {} do not line up with its keys", channel.index());
                return None;
            }
            let per_frame = weights.len() / frames;
            Keyframes::MorphWeights(
                weights
                    .chunks(per_frame.max(1))
                    .map(<[f32]>::to_vec)
                    .collect(),
            )
        }
        None => {
            log::warn!("No keyframes found in channel {}", channel.index());
            return None;
        }
    };
    Some(Channel {
        node,
        timestamps,
        keyframes,
        interpolation,
    })
}
