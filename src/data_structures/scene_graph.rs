//! The scene: what gets drawn every frame.
//!
//! A [`Scene`] owns the background colour, the lights, every model that
//! finished loading and the debug helpers. Models are never removed; they are
//! addressed through the [`ModelId`] handed out on insertion.

use std::sync::Arc;

use cgmath::{Matrix4, Vector3};

use crate::{
    config::{LightingConfig, linear_rgb},
    data_structures::{
        bounds::BoundsHelper,
        instance::Instance,
        model::LoadedAsset,
    },
    resources::animation::{AnimationClip, Sample},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u32);

impl ModelId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Directional {
        colour: [f32; 3],
        intensity: f32,
        position: Vector3<f32>,
    },
    Hemisphere {
        sky: [f32; 3],
        ground: [f32; 3],
        intensity: f32,
    },
}

impl Light {
    /// The rig every scene starts with: one sun-like directional light and a
    /// hemisphere light for ambient fill.
    pub fn rig(config: &LightingConfig) -> [Light; 2] {
        [
            Light::Directional {
                colour: linear_rgb(config.directional_colour),
                intensity: config.directional_intensity,
                position: config.directional_position.into(),
            },
            Light::Hemisphere {
                sky: linear_rgb(config.sky_colour),
                ground: linear_rgb(config.ground_colour),
                intensity: config.hemisphere_intensity,
            },
        ]
    }
}

/// The animated state of a model: local transforms per node and morph weights per mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    pub locals: Vec<Instance>,
    pub morph_weights: Vec<Vec<f32>>,
}

impl Pose {
    pub fn rest(asset: &LoadedAsset) -> Self {
        Self {
            locals: asset.nodes.iter().map(|node| node.rest.clone()).collect(),
            morph_weights: asset
                .meshes
                .iter()
                .map(|mesh| mesh.default_weights.clone())
                .collect(),
        }
    }
}

/// One loaded asset placed in the scene.
#[derive(Clone, Debug)]
pub struct ModelInstance {
    id: ModelId,
    pub source: String,
    pub transform: Instance,
    asset: Arc<LoadedAsset>,
    pose: Pose,
    /// Bumped whenever the pose changes so the renderer knows when to re-upload.
    revision: u64,
}

impl ModelInstance {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn asset(&self) -> &LoadedAsset {
        &self.asset
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Poses the model at `time` seconds into `clip`.
    pub fn apply_clip(&mut self, clip: &AnimationClip, time: f32) {
        for channel in &clip.channels {
            let Some(sample) = channel.sample(time) else {
                continue;
            };
            match sample {
                Sample::MorphWeights(weights) => {
                    let mesh = self
                        .asset
                        .nodes
                        .get(channel.node)
                        .and_then(|node| node.mesh);
                    if let Some(target) = mesh.and_then(|mesh| self.pose.morph_weights.get_mut(mesh)) {
                        *target = weights;
                    }
                }
                sample => {
                    if let Some(local) = self.pose.locals.get_mut(channel.node) {
                        sample.apply_to(local);
                    }
                }
            }
        }
        self.revision += 1;
    }

    /// World matrix of every node, indexed like `asset().nodes`. Nodes the
    /// scene roots never reach are `None` and are not drawn.
    pub fn world_matrices(&self) -> Vec<Option<Matrix4<f32>>> {
        let root = self.transform.to_matrix();
        let mut worlds = vec![None; self.asset.nodes.len()];
        self.asset.walk(|idx, parent| {
            let local = self.pose.locals[idx].to_matrix();
            let base = parent.and_then(|parent| worlds[parent]).unwrap_or(root);
            worlds[idx] = Some(base * local);
        });
        worlds
    }
}

pub struct Scene {
    pub background: u32,
    lights: Vec<Light>,
    models: Vec<ModelInstance>,
    helpers: Vec<BoundsHelper>,
    next_id: u32,
}

impl Scene {
    pub fn new(background: u32) -> Self {
        Self {
            background,
            lights: Vec::new(),
            models: Vec::new(),
            helpers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Takes ownership of a loaded asset and returns the id of the new instance.
    pub fn add_model(
        &mut self,
        source: impl Into<String>,
        asset: Arc<LoadedAsset>,
        transform: Instance,
    ) -> ModelId {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        let pose = Pose::rest(&asset);
        self.models.push(ModelInstance {
            id,
            source: source.into(),
            transform,
            asset,
            pose,
            revision: 0,
        });
        id
    }

    pub fn model(&self, id: ModelId) -> Option<&ModelInstance> {
        self.models.iter().find(|model| model.id == id)
    }

    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut ModelInstance> {
        self.models.iter_mut().find(|model| model.id == id)
    }

    pub fn models(&self) -> &[ModelInstance] {
        &self.models
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn add_helper(&mut self, helper: BoundsHelper) {
        self.helpers.push(helper);
    }

    pub fn helpers(&self) -> &[BoundsHelper] {
        &self.helpers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::Node;

    fn node(position: [f32; 3], mesh: Option<usize>, children: Vec<usize>) -> Node {
        Node {
            name: None,
            rest: Instance {
                position: position.into(),
                ..Instance::new()
            },
            mesh,
            children,
        }
    }

    #[test]
    fn children_inherit_the_placement() {
        let asset = LoadedAsset {
            nodes: vec![node([1.0, 0.0, 0.0], None, vec![1]), node([0.0, 2.0, 0.0], Some(0), vec![])],
            roots: vec![0],
            ..Default::default()
        };
        let mut scene = Scene::new(0);
        let id = scene.add_model(
            "a",
            Arc::new(asset),
            Instance::placed(Vector3::new(0.0, 0.0, 3.0), 1.0),
        );

        let worlds = scene.model(id).unwrap().world_matrices();
        assert_eq!(worlds[0].unwrap().w.truncate(), Vector3::new(1.0, 0.0, 3.0));
        assert_eq!(worlds[1].unwrap().w.truncate(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn nodes_outside_the_scene_have_no_world_matrix() {
        // node 1 carries a mesh but no root reaches it
        let asset = LoadedAsset {
            nodes: vec![node([0.0; 3], None, vec![]), node([5.0, 0.0, 0.0], Some(0), vec![])],
            roots: vec![0],
            ..Default::default()
        };
        let mut scene = Scene::new(0);
        let id = scene.add_model("a", Arc::new(asset), Instance::new());

        let worlds = scene.model(id).unwrap().world_matrices();
        assert!(worlds[0].is_some());
        assert_eq!(worlds[1], None);
    }
}
