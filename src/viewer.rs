//! The viewer: everything the frame loop and the load handlers work on.
//!
//! A [`Viewer`] is created once by [`Viewer::bootstrap`] and then passed
//! around by `&mut`. It owns the scene, the camera, the orbit controls, the
//! animation drivers, the pending loads and the renderer.
//!
//! ```text
//! bootstrap: camera -> lights -> issue loads -> controls -> renderer size
//! tick(dt):  finished loads -> advance drivers -> render
//! ```

use std::sync::Arc;

use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    animation::AnimationDriver,
    camera::PerspectiveCamera,
    config::{AssetSpec, ViewerConfig},
    controls::OrbitControls,
    data_structures::{
        bounds::{Aabb, BoundsHelper},
        instance::Instance,
        model::LoadedAsset,
        scene_graph::{Light, ModelId, Scene},
    },
    render::Renderer,
    resources::{ModelLoader, queue::LoadQueue},
    viewport::{Container, ViewportSize},
};

/// Colour of the bounding box helpers (`0xffff00`).
pub const BOUNDS_COLOUR: [f32; 3] = [1.0, 1.0, 0.0];

pub struct Viewer<R: Renderer> {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    drivers: Vec<AnimationDriver>,
    loads: LoadQueue,
    renderer: R,
    viewport: ViewportSize,
}

impl<R: Renderer> Viewer<R> {
    /// Sets up the scene and issues one load per configured asset.
    ///
    /// Fails if `container` is missing or has no area. The loads are only
    /// queued here; they finish during later calls to [`Viewer::tick`].
    pub fn bootstrap(
        config: &ViewerConfig,
        container: &dyn Container,
        loader: &dyn ModelLoader,
        mut renderer: R,
    ) -> anyhow::Result<Self> {
        let viewport = ViewportSize::of(container)?;

        let mut camera = PerspectiveCamera::new(&config.camera, viewport);

        let mut scene = Scene::new(config.background);
        for light in Light::rig(&config.lighting) {
            scene.add_light(light);
        }

        let mut loads = LoadQueue::new();
        for spec in &config.assets {
            log::info!("loading {}", spec.path);
            loads.issue(spec.clone(), loader.load(&spec.path));
        }

        let controls = OrbitControls::new(&mut camera, viewport);
        renderer.set_size(viewport);

        Ok(Self {
            scene,
            camera,
            controls,
            drivers: Vec::new(),
            loads,
            renderer,
            viewport,
        })
    }

    /// Handles the outcome of one load.
    ///
    /// A successful load is placed and inserted into the scene; if it carries
    /// animations a driver for its first clip is started. A failure is logged
    /// and otherwise ignored.
    pub fn on_model_loaded(
        &mut self,
        spec: &AssetSpec,
        result: anyhow::Result<LoadedAsset>,
    ) -> Option<ModelId> {
        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("failed to load {}: {:#}", spec.path, e);
                return None;
            }
        };

        if spec.show_bounds {
            match Aabb::of_asset(&asset) {
                Some(aabb) => self.scene.add_helper(BoundsHelper {
                    aabb,
                    colour: BOUNDS_COLOUR,
                }),
                None => log::warn!("{} has no geometry to bound", spec.path),
            }
        }

        let transform = match spec.placement {
            Some(placement) => Instance::placed(placement.position, placement.scale),
            None => Instance::new(),
        };
        let first_clip = asset.clips.first().cloned();
        let id = self
            .scene
            .add_model(spec.path.clone(), Arc::new(asset), transform);

        match first_clip {
            Some(clip) => {
                log::info!(
                    "{} loaded, playing {:?} ({:.2}s)",
                    spec.path,
                    clip.name,
                    clip.duration()
                );
                let mut driver = AnimationDriver::new(id, clip);
                driver.play();
                self.drivers.push(driver);
            }
            None => log::info!("{} loaded", spec.path),
        }
        Some(id)
    }

    /// Delivers every load that finished by now.
    pub fn poll_loads(&mut self) {
        if self.loads.is_empty() {
            return;
        }
        for outcome in self.loads.drain_completed() {
            self.on_model_loaded(&outcome.spec, outcome.result);
        }
    }

    /// Advances every driver by `dt` and poses its model.
    pub fn advance(&mut self, dt: Duration) {
        for driver in &mut self.drivers {
            driver.advance(dt);
            driver.apply(&mut self.scene);
        }
    }

    /// One frame: finished loads, then animation, then drawing.
    pub fn tick(&mut self, dt: Duration) -> anyhow::Result<()> {
        self.poll_loads();
        self.advance(dt);
        self.renderer.render(&self.scene, &self.camera)
    }

    /// Follows a new container size. Leaves models and drivers alone.
    pub fn resize(&mut self, size: ViewportSize) {
        self.viewport = size;
        self.camera.set_viewport(size);
        self.controls.set_viewport(size);
        self.renderer.set_size(size);
    }

    /// Re-reads the size of `container`; a collapsed container is ignored.
    pub fn resize_to(&mut self, container: &dyn Container) {
        match ViewportSize::of(container) {
            Ok(size) => self.resize(size),
            Err(e) => log::debug!("ignoring resize: {}", e),
        }
    }

    /// Forwards pointer input to the orbit controls. Returns `true` when the camera moved.
    pub fn handle_input(&mut self, event: &WindowEvent) -> bool {
        self.controls.handle_window_event(event, &mut self.camera)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn drivers(&self) -> &[AnimationDriver] {
        &self.drivers
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Number of loads that have not finished yet.
    pub fn pending_loads(&self) -> usize {
        self.loads.len()
    }
}
