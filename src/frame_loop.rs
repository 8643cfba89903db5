//! Driving the viewer frame by frame.
//!
//! On the desktop and in the browser the winit event loop calls
//! [`FrameLoop::step`] once per redraw. [`FrameLoop::run`] is the blocking
//! variant for headless use; both stop once the [`StopHandle`] is triggered.

use std::{
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use instant::{Duration, Instant};

use crate::{render::Renderer, viewer::Viewer};

/// Source of the time between two frames.
pub trait FrameClock {
    /// Time passed since the previous call. The first call measures from
    /// the creation of the clock.
    fn delta(&mut self) -> Duration;
}

/// Measures real time with `instant`, which also works in the browser.
#[derive(Debug)]
pub struct WallClock {
    last_time: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            last_time: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last_time;
        self.last_time = now;
        dt
    }
}

/// Stops a [`FrameLoop`]. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct FrameLoop<C: FrameClock> {
    clock: C,
    stop: StopHandle,
    frames: u64,
}

impl FrameLoop<WallClock> {
    pub fn wall_clock() -> Self {
        Self::new(WallClock::new())
    }
}

impl<C: FrameClock> FrameLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            stop: StopHandle::default(),
            frames: 0,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Ticks the viewer once unless the loop was stopped.
    ///
    /// A failed frame is logged; the loop keeps going.
    pub fn step<R: Renderer>(&mut self, viewer: &mut Viewer<R>) -> ControlFlow<()> {
        if self.stop.is_stopped() {
            return ControlFlow::Break(());
        }
        let dt = self.clock.delta();
        if let Err(e) = viewer.tick(dt) {
            log::error!("frame {} failed: {:#}", self.frames, e);
        }
        self.frames += 1;
        ControlFlow::Continue(())
    }

    /// Steps until the stop handle is triggered.
    pub fn run<R: Renderer>(&mut self, viewer: &mut Viewer<R>) {
        while self.step(viewer).is_continue() {}
        log::info!("frame loop stopped after {} frames", self.frames);
    }
}
