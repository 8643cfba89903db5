use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{config::RendererSettings, data_structures::texture::Texture, viewport::ViewportSize};

/// Samples per pixel when anti-aliasing is on and the adapter allows it.
const MSAA_SAMPLES: u32 = 4;

/// The GPU side of the window: surface, device and queue plus the surface configuration.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// 1 or [`MSAA_SAMPLES`]; fixed for the lifetime of the context.
    pub sample_count: u32,
    /// Physical pixels per logical pixel, captured once at startup.
    pub pixel_ratio: f64,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &RendererSettings) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let pixel_ratio = settings.pixel_ratio.unwrap_or_else(|| window.scale_factor());

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("cannot create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("cannot open the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders work in linear space and rely on an sRGB surface to encode
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let sample_count = if settings.antialias
            && supports_samples(&adapter, surface_format, MSAA_SAMPLES)
            && supports_samples(&adapter, Texture::DEPTH_FORMAT, MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            if settings.antialias {
                log::warn!(
                    "{:?} does not support {}x MSAA, rendering without anti-aliasing",
                    surface_format,
                    MSAA_SAMPLES
                );
            }
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "surface {:?} {}x{}, {} sample(s), pixel ratio {}",
            config.format,
            config.width,
            config.height,
            sample_count,
            pixel_ratio
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            pixel_ratio,
        })
    }

    /// Physical size of the drawing buffer for a viewport of `size` logical pixels.
    pub fn physical_size(&self, size: ViewportSize) -> [u32; 2] {
        let scale = |logical: u32| ((logical as f64 * self.pixel_ratio).round() as u32).max(1);
        [scale(size.width), scale(size.height)]
    }

    /// Reconfigures the surface for `size` logical pixels. Returns the new physical size.
    pub fn resize(&mut self, size: ViewportSize) -> [u32; 2] {
        let [width, height] = self.physical_size(size);
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        [width, height]
    }

    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn supports_samples(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, count: u32) -> bool {
    adapter
        .get_texture_format_features(format)
        .flags
        .sample_count_supported(count)
}
