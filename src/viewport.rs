//! The element the viewer is mounted into and its current size.

use anyhow::bail;

/// Non-zero size of the viewport in logical (CSS) pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        if width == 0 || height == 0 {
            bail!("viewport has no area ({}x{})", width, height);
        }
        Ok(Self { width, height })
    }

    /// Reads the current size of `container`.
    ///
    /// Fails when the container is gone or collapsed, which makes the aspect
    /// ratio undefined.
    pub fn of(container: &dyn Container) -> anyhow::Result<Self> {
        match container.client_size() {
            Some((width, height)) => Self::new(width, height),
            None => bail!("the scene container is not available"),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Anything that can report the size of the area the scene is drawn into.
pub trait Container {
    /// Width and height in logical pixels, or `None` if the container does not exist.
    fn client_size(&self) -> Option<(u32, u32)>;
}

impl Container for winit::window::Window {
    fn client_size(&self) -> Option<(u32, u32)> {
        let size = self.inner_size().to_logical::<f64>(self.scale_factor());
        Some((size.width.round() as u32, size.height.round() as u32))
    }
}

/// A DOM element, e.g. `#scene-container`.
#[cfg(target_arch = "wasm32")]
pub struct ElementContainer(pub web_sys::Element);

#[cfg(target_arch = "wasm32")]
impl ElementContainer {
    pub fn find(id: &str) -> Option<Self> {
        web_sys::window()?
            .document()?
            .get_element_by_id(id)
            .map(Self)
    }
}

#[cfg(target_arch = "wasm32")]
impl Container for ElementContainer {
    fn client_size(&self) -> Option<(u32, u32)> {
        Some((self.0.client_width() as u32, self.0.client_height() as u32))
    }
}
