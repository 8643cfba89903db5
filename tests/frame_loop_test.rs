use std::collections::VecDeque;

use aviary::{
    AssetSpec, Viewer, ViewerConfig,
    frame_loop::{FrameClock, FrameLoop, WallClock},
};
use instant::Duration;

use crate::common::test_utils::{FakeLoader, FixedContainer, RecordingRenderer, animated_asset};

mod common;

/// Hands out preset deltas, then zero.
struct ScriptedClock(VecDeque<Duration>);

impl FrameClock for ScriptedClock {
    fn delta(&mut self) -> Duration {
        self.0.pop_front().unwrap_or(Duration::ZERO)
    }
}

fn loaded_viewer(loader: &FakeLoader) -> Viewer<RecordingRenderer> {
    let config =
        ViewerConfig::default().with_assets(vec![AssetSpec::flamingo(), AssetSpec::stork()]);
    let mut viewer = Viewer::bootstrap(
        &config,
        &FixedContainer::sized(800, 600),
        loader,
        RecordingRenderer::default(),
    )
    .unwrap();
    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    loader.succeed("models/Stork.glb", animated_asset("stork", 1));
    viewer.poll_loads();
    viewer
}

#[test]
fn drivers_accumulate_frame_deltas() {
    let loader = FakeLoader::new();
    let mut viewer = loaded_viewer(&loader);
    let deltas = [
        Duration::from_millis(16),
        Duration::from_millis(33),
        Duration::from_millis(250),
    ];
    let mut frame_loop = FrameLoop::new(ScriptedClock(deltas.into_iter().collect()));

    for _ in 0..deltas.len() {
        assert!(frame_loop.step(&mut viewer).is_continue());
    }

    let total: Duration = deltas.iter().sum();
    assert_eq!(viewer.drivers().len(), 2);
    for driver in viewer.drivers() {
        assert_eq!(driver.elapsed(), total);
    }
    assert_eq!(viewer.renderer().frames, 3);
    assert_eq!(frame_loop.frames(), 3);
}

#[test]
fn animation_moves_the_model() {
    let loader = FakeLoader::new();
    let mut viewer = loaded_viewer(&loader);

    viewer.advance(Duration::from_millis(500));
    // the slide clip reaches x = 1 halfway through its one second
    for model in viewer.scene().models() {
        let x = model.pose().locals[0].position.x;
        assert!((x - 1.0).abs() < 1e-5, "x = {}", x);
    }

    // 1.25s wraps around to 0.25s
    viewer.advance(Duration::from_millis(750));
    for model in viewer.scene().models() {
        let x = model.pose().locals[0].position.x;
        assert!((x - 0.5).abs() < 1e-4, "x = {}", x);
    }
}

#[test]
fn stop_handle_ends_the_loop() {
    let loader = FakeLoader::new();
    let mut viewer = loaded_viewer(&loader);
    let mut frame_loop = FrameLoop::new(ScriptedClock(VecDeque::new()));
    let stop = frame_loop.stop_handle();

    assert!(frame_loop.step(&mut viewer).is_continue());
    stop.clone().stop();
    assert!(stop.is_stopped());
    assert!(frame_loop.step(&mut viewer).is_break());
    assert_eq!(viewer.renderer().frames, 1);

    // run returns right away once stopped
    frame_loop.run(&mut viewer);
    assert_eq!(frame_loop.frames(), 1);
}

#[test]
fn run_stops_from_another_thread() {
    let loader = FakeLoader::new();
    let mut viewer = loaded_viewer(&loader);
    let mut frame_loop = FrameLoop::new(WallClock::new());
    let stop = frame_loop.stop_handle();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        stop.stop();
    });
    frame_loop.run(&mut viewer);
    stopper.join().unwrap();

    assert!(frame_loop.frames() > 0);
    assert_eq!(viewer.renderer().frames as u64, frame_loop.frames());
}

#[test]
fn render_failures_do_not_stop_the_loop() {
    let loader = FakeLoader::new();
    let mut viewer = loaded_viewer(&loader);
    viewer.renderer_mut().broken = true;
    let mut frame_loop = FrameLoop::new(ScriptedClock(VecDeque::new()));

    assert!(frame_loop.step(&mut viewer).is_continue());
    assert!(frame_loop.step(&mut viewer).is_continue());
    assert_eq!(viewer.renderer().frames, 2);
}

#[test]
fn wall_clock_moves_forward() {
    let mut clock = WallClock::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(clock.delta() >= Duration::from_millis(2));
}
