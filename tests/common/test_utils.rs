use std::{cell::RefCell, collections::HashMap, sync::Arc};

use aviary::{
    camera::PerspectiveCamera,
    data_structures::{
        instance::Instance,
        model::{LoadedAsset, Mesh, ModelVertex, Node, Primitive},
        scene_graph::Scene,
    },
    render::Renderer,
    resources::{
        ModelLoader,
        animation::{AnimationClip, Channel, Interpolation, Keyframes},
    },
    viewport::{Container, ViewportSize},
};
use futures::{
    FutureExt,
    channel::oneshot,
    future::LocalBoxFuture,
};

/// A loader whose loads finish only when the test says so.
///
/// Every `load` call parks a oneshot sender under the requested path;
/// [`FakeLoader::succeed`] and [`FakeLoader::fail`] complete it.
#[derive(Default)]
pub struct FakeLoader {
    pending: RefCell<HashMap<String, oneshot::Sender<anyhow::Result<LoadedAsset>>>>,
    requested: RefCell<Vec<String>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths in the order they were requested.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    pub fn succeed(&self, path: &str, asset: LoadedAsset) {
        self.complete(path, Ok(asset));
    }

    pub fn fail(&self, path: &str, reason: &str) {
        self.complete(path, Err(anyhow::anyhow!("{}", reason.to_string())));
    }

    fn complete(&self, path: &str, result: anyhow::Result<LoadedAsset>) {
        let sender = self
            .pending
            .borrow_mut()
            .remove(path)
            .unwrap_or_else(|| panic!("{} was never requested or already completed", path));
        assert!(sender.send(result).is_ok(), "the viewer dropped the load of {}", path);
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedAsset>> {
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().insert(path.to_string(), sender);
        self.requested.borrow_mut().push(path.to_string());
        let path = path.to_string();
        receiver
            .map(move |result| {
                result.unwrap_or_else(|_| Err(anyhow::anyhow!("load of {} was abandoned", path)))
            })
            .boxed_local()
    }
}

/// What the viewer asked the renderer to do.
#[derive(Default)]
pub struct RecordingRenderer {
    pub sizes: Vec<ViewportSize>,
    pub frames: usize,
    /// Model count seen by the latest frame.
    pub models_drawn: usize,
    pub helpers_drawn: usize,
    pub last_aspect: Option<f32>,
    /// Makes every render call fail.
    pub broken: bool,
}

impl Renderer for RecordingRenderer {
    fn set_size(&mut self, size: ViewportSize) {
        self.sizes.push(size);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> anyhow::Result<()> {
        self.frames += 1;
        self.models_drawn = scene.model_count();
        self.helpers_drawn = scene.helpers().len();
        self.last_aspect = Some(camera.aspect);
        if self.broken {
            anyhow::bail!("device lost");
        }
        Ok(())
    }
}

/// A container of a fixed size; `None` behaves like a missing element.
pub struct FixedContainer(pub Option<(u32, u32)>);

impl FixedContainer {
    pub fn sized(width: u32, height: u32) -> Self {
        Self(Some((width, height)))
    }
}

impl Container for FixedContainer {
    fn client_size(&self) -> Option<(u32, u32)> {
        self.0
    }
}

/// A one-node asset holding a single triangle.
pub fn triangle_asset(name: &str) -> LoadedAsset {
    let vertex = |position: [f32; 3]| ModelVertex {
        position,
        ..Default::default()
    };
    LoadedAsset {
        name: name.to_string(),
        nodes: vec![Node {
            name: Some("body".to_string()),
            rest: Instance::new(),
            mesh: Some(0),
            children: vec![],
        }],
        roots: vec![0],
        meshes: vec![Mesh {
            name: "triangle".to_string(),
            primitives: vec![Primitive {
                vertices: vec![
                    vertex([0.0, 0.0, 0.0]),
                    vertex([1.0, 0.0, 0.0]),
                    vertex([0.0, 1.0, 0.0]),
                ],
                indices: vec![0, 1, 2],
                morph_targets: vec![],
                material: None,
            }],
            default_weights: vec![],
        }],
        materials: vec![],
        clips: vec![],
    }
}

/// A clip moving node 0 from the origin to x = 2 over `duration` seconds.
pub fn slide_clip(name: &str, duration: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![Channel {
            node: 0,
            timestamps: vec![0.0, duration],
            keyframes: Keyframes::Translation(vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(2.0, 0.0, 0.0),
            ]),
            interpolation: Interpolation::Linear,
        }],
    )
}

/// [`triangle_asset`] with `clips` one-second slide clips.
pub fn animated_asset(name: &str, clips: usize) -> LoadedAsset {
    let mut asset = triangle_asset(name);
    asset.clips = (0..clips)
        .map(|idx| Arc::new(slide_clip(&format!("clip {}", idx), 1.0)))
        .collect();
    asset
}

/// Binary glTF with one triangle node and, optionally, a linear translation
/// animation from (0, 0, 0) at t = 0 to (2, 0, 0) at t = 1.
pub fn triangle_glb(animated: bool) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    // positions: 36 bytes at 0
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    // indices: 6 bytes at 36, padded to 44
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    // key times: 8 bytes at 44
    for value in [0.0f32, 1.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    // translations: 24 bytes at 52
    for value in [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    assert_eq!(bin.len(), 76);

    let animations = if animated {
        r#","animations":[{"name":"Fly","channels":[{"sampler":0,"target":{"node":0,"path":"translation"}}],"samplers":[{"input":2,"output":3,"interpolation":"LINEAR"}]}]"#
    } else {
        ""
    };
    let json = format!(
        concat!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],"#,
            r#""nodes":[{{"mesh":0,"name":"bird"}}],"#,
            r#""meshes":[{{"name":"triangle","primitives":[{{"attributes":{{"POSITION":0}},"indices":1}}]}}],"#,
            r#""buffers":[{{"byteLength":76}}],"#,
            r#""bufferViews":["#,
            r#"{{"buffer":0,"byteOffset":0,"byteLength":36}},"#,
            r#"{{"buffer":0,"byteOffset":36,"byteLength":6}},"#,
            r#"{{"buffer":0,"byteOffset":44,"byteLength":8}},"#,
            r#"{{"buffer":0,"byteOffset":52,"byteLength":24}}],"#,
            r#""accessors":["#,
            r#"{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]}},"#,
            r#"{{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}},"#,
            r#"{{"bufferView":2,"componentType":5126,"count":2,"type":"SCALAR","min":[0],"max":[1]}},"#,
            r#"{{"bufferView":3,"componentType":5126,"count":2,"type":"VEC3"}}]"#,
            "{}}}"
        ),
        animations
    );

    let mut json = json.into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}
