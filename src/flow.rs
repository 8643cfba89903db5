//! Application event loop.
//!
//! Glues winit to the [`Viewer`]: the window (a canvas inside the scene
//! container on the web) is created on `resumed`, the GPU is set up
//! asynchronously, and from then on every redraw steps the frame loop.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and starts the GPU setup
//! 2. the finished setup arrives as [`ViewerEvent::Initialized`] on the web,
//!    natively it is awaited right away
//! 3. window events are forwarded to the viewer: resizes, pointer input and
//!    redraws
//! 4. closing the window triggers the frame loop's stop handle

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    frame_loop::{FrameLoop, WallClock},
    render::WgpuRenderer,
    resources::GltfLoader,
    viewer::Viewer,
    viewport::Container,
};

#[cfg(target_arch = "wasm32")]
use crate::viewport::ElementContainer;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum ViewerEvent {
    Initialized(anyhow::Result<Viewer<WgpuRenderer>>),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerEvent::Initialized(result) => f
                .debug_tuple("Initialized")
                .field(&result.as_ref().map(|_| "viewer"))
                .finish(),
        }
    }
}

/// Sets up the renderer for `window` and boots the viewer in it.
async fn init_viewer(
    window: Arc<Window>,
    config: ViewerConfig,
) -> anyhow::Result<Viewer<WgpuRenderer>> {
    let renderer = WgpuRenderer::new(window.clone(), &config.renderer).await?;

    #[cfg(target_arch = "wasm32")]
    let element = {
        use anyhow::Context;
        ElementContainer::find(&config.container_id)
            .with_context(|| format!("no element with id {:?}", config.container_id))?
    };
    #[cfg(target_arch = "wasm32")]
    let container: &dyn Container = &element;
    #[cfg(not(target_arch = "wasm32"))]
    let container: &dyn Container = &*window;

    Viewer::bootstrap(&config, container, &GltfLoader, renderer)
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(unused)]
    proxy: winit::event_loop::EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    viewer: Option<Viewer<WgpuRenderer>>,
    frame_loop: FrameLoop<WallClock>,
    started: bool,
    /// First fatal error; reported by [`run`] once the event loop exits.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            config,
            viewer: None,
            frame_loop: FrameLoop::wall_clock(),
            started: false,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("viewer failed to start: {:#}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn start(&mut self, viewer: Viewer<WgpuRenderer>) {
        // measure the first frame from now, not from process start
        self.frame_loop = FrameLoop::wall_clock();
        viewer.renderer().window().request_redraw();
        self.viewer = Some(viewer);
        log::info!("viewer running");
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("aviary");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            match mount_canvas(&self.config.container_id) {
                Ok(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas)),
                Err(e) => return self.fail(event_loop, e),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let init_future = init_viewer(window, self.config.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(init_future);
            match result {
                Ok(viewer) => self.start(viewer),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = init_future.await;
                if proxy.send_event(ViewerEvent::Initialized(result)).is_err() {
                    log::error!("event loop closed before the viewer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            ViewerEvent::Initialized(Ok(viewer)) => self.start(viewer),
            ViewerEvent::Initialized(Err(e)) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let viewer = match &mut self.viewer {
            Some(viewer) => viewer,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.frame_loop.stop_handle().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                #[cfg(target_arch = "wasm32")]
                {
                    match ElementContainer::find(&self.config.container_id) {
                        Some(container) => viewer.resize_to(&container),
                        None => log::warn!("scene container disappeared"),
                    }
                }
                #[cfg(not(target_arch = "wasm32"))]
                {
                    let window = viewer.renderer().context().window.clone();
                    viewer.resize_to(&*window);
                }
            }
            WindowEvent::RedrawRequested => {
                // pending file reads run on the tokio blocking pool
                #[cfg(not(target_arch = "wasm32"))]
                let _guard = self.async_runtime.enter();

                if self.frame_loop.step(viewer).is_break() {
                    event_loop.exit();
                    return;
                }
                viewer.renderer().window().request_redraw();
            }
            event => {
                if viewer.handle_input(&event) {
                    viewer.renderer().window().request_redraw();
                }
            }
        }
    }
}

/// Creates a canvas filling the element `container_id` and appends it there.
#[cfg(target_arch = "wasm32")]
fn mount_canvas(container_id: &str) -> anyhow::Result<web_sys::HtmlCanvasElement> {
    use anyhow::Context;
    use wasm_bindgen::JsCast;

    let container = ElementContainer::find(container_id)
        .with_context(|| format!("no element with id {:?}", container_id))?;
    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no document")?;
    let canvas = document
        .create_element("canvas")
        .map_err(|_| anyhow::anyhow!("cannot create a canvas"))?;
    canvas
        .set_attribute("style", "width: 100%; height: 100%; display: block;")
        .map_err(|_| anyhow::anyhow!("cannot style the canvas"))?;
    container
        .0
        .append_child(&canvas)
        .map_err(|_| anyhow::anyhow!("cannot append the canvas to {:?}", container_id))?;
    Ok(canvas.unchecked_into())
}

/// Opens the viewer and runs it until the window is closed.
///
/// In the browser the event loop is handed to the page and this returns
/// right away; startup errors are then only logged.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let app = App::new(&event_loop, config)?;
    launch(event_loop, app)
}

#[cfg(not(target_arch = "wasm32"))]
fn launch(event_loop: EventLoop<ViewerEvent>, mut app: App) -> anyhow::Result<()> {
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
fn launch(event_loop: EventLoop<ViewerEvent>, app: App) -> anyhow::Result<()> {
    use winit::platform::web::EventLoopExtWebSys;

    event_loop.spawn_app(app);
    Ok(())
}
