//! Viewer configuration.
//!
//! Everything the viewer needs to know up front lives in [`ViewerConfig`]. The
//! `Default` implementation describes the stock scene: a sky-blue backdrop, a
//! 35° camera, one directional plus one hemisphere light and the bird models.

use cgmath::Vector3;

/// Placement applied to a model once it finished loading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vector3<f32>,
    pub scale: f32,
}

impl Placement {
    pub fn new(position: impl Into<Vector3<f32>>, scale: f32) -> Self {
        Self {
            position: position.into(),
            scale,
        }
    }
}

/// One model file to load at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetSpec {
    /// Path relative to the assets root (`./assets` natively, `<origin>/assets` on the web).
    pub path: String,
    /// `None` keeps the transform authored in the file.
    pub placement: Option<Placement>,
    /// Adds a bounding box helper showing the extents of the model as authored.
    pub show_bounds: bool,
}

/// Uniform scale applied to the bird models, which are authored in centimetres.
pub const BIRD_SCALE: f32 = 0.05;

impl AssetSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            placement: None,
            show_bounds: false,
        }
    }

    pub fn placed(mut self, position: impl Into<Vector3<f32>>, scale: f32) -> Self {
        self.placement = Some(Placement::new(position, scale));
        self
    }

    pub fn with_bounds(mut self) -> Self {
        self.show_bounds = true;
        self
    }

    pub fn face_mesh() -> Self {
        Self::new("models/face_mesh.glb").with_bounds()
    }

    pub fn parrot() -> Self {
        Self::new("models/Parrot.glb").placed([0.0, 0.0, 2.5], BIRD_SCALE)
    }

    pub fn flamingo() -> Self {
        Self::new("models/Flamingo.glb").placed([7.5, 0.0, -10.0], BIRD_SCALE)
    }

    pub fn stork() -> Self {
        Self::new("models/Stork.glb").placed([0.0, -2.5, -10.0], BIRD_SCALE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 35.0,
            near: 0.1,
            far: 1000.0,
            eye: [1.5, 1.5, 10.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub directional_colour: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub sky_colour: u32,
    pub ground_colour: u32,
    pub hemisphere_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            directional_colour: 0xffffff,
            directional_intensity: 5.0,
            directional_position: [10.0, 10.0, 10.0],
            sky_colour: 0xddeeff,
            ground_colour: 0x202020,
            hemisphere_intensity: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RendererSettings {
    /// Enables 4x MSAA when the surface format supports it.
    pub antialias: bool,
    /// Overrides the device pixel ratio. `None` takes the ratio of the window at startup.
    pub pixel_ratio: Option<f64>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            pixel_ratio: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Id of the DOM element the canvas is mounted into (web only).
    pub container_id: String,
    pub background: u32,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub assets: Vec<AssetSpec>,
    pub renderer: RendererSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            container_id: "scene-container".to_string(),
            // css `skyblue`
            background: 0x87ceeb,
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            assets: vec![
                AssetSpec::face_mesh(),
                AssetSpec::flamingo(),
                AssetSpec::stork(),
            ],
            renderer: RendererSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_assets(mut self, assets: Vec<AssetSpec>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_background(mut self, background: u32) -> Self {
        self.background = background;
        self
    }

    pub fn with_renderer(mut self, renderer: RendererSettings) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Splits a `0xRRGGBB` value into linear RGB components.
///
/// Colours are authored in sRGB; the render surface is sRGB as well, so the
/// shaders have to work on linear values.
pub fn linear_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Clear colour for a `0xRRGGBB` background.
pub fn clear_colour(hex: u32) -> wgpu::Color {
    let [r, g, b] = linear_rgb(hex);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
