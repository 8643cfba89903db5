use aviary::{AssetSpec, Viewer, ViewerConfig, viewport::ViewportSize};

use crate::common::test_utils::{FakeLoader, FixedContainer, RecordingRenderer, animated_asset};

mod common;

fn boot(loader: &FakeLoader, width: u32, height: u32) -> Viewer<RecordingRenderer> {
    let config =
        ViewerConfig::default().with_assets(vec![AssetSpec::flamingo(), AssetSpec::stork()]);
    Viewer::bootstrap(
        &config,
        &FixedContainer::sized(width, height),
        loader,
        RecordingRenderer::default(),
    )
    .unwrap()
}

#[test]
fn aspect_tracks_the_container() {
    let loader = FakeLoader::new();
    let mut viewer = boot(&loader, 800, 600);
    assert_eq!(viewer.camera().aspect, 800.0 / 600.0);

    viewer.resize(ViewportSize::new(400, 300).unwrap());
    assert_eq!(viewer.camera().aspect, 400.0 / 300.0);
    assert_eq!(
        viewer.renderer().sizes.last(),
        Some(&ViewportSize::new(400, 300).unwrap())
    );
    assert_eq!(viewer.viewport(), ViewportSize::new(400, 300).unwrap());

    // the next frame is drawn through the resized camera
    viewer.tick(instant::Duration::from_millis(16)).unwrap();
    assert_eq!(viewer.renderer().last_aspect, Some(400.0 / 300.0));
}

#[test]
fn projection_is_recomputed_on_resize() {
    let loader = FakeLoader::new();
    let mut viewer = boot(&loader, 800, 600);
    let before = viewer.camera().projection();

    viewer.resize(ViewportSize::new(1200, 400).unwrap());
    let after = viewer.camera().projection();
    assert_ne!(before, after);
    // x scale is 1 / (aspect * tan(fov / 2)), y scale is unaffected by the aspect
    assert_eq!(before.y.y, after.y.y);
    assert!((after.x.x * 3.0 - after.y.y).abs() < 1e-5);
}

#[test]
fn resize_keeps_models_and_drivers() {
    let loader = FakeLoader::new();
    let mut viewer = boot(&loader, 800, 600);

    // before anything loaded
    viewer.resize(ViewportSize::new(1024, 768).unwrap());
    assert_eq!(viewer.scene().model_count(), 0);

    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    viewer.poll_loads();
    // with a partial scene
    viewer.resize(ViewportSize::new(640, 480).unwrap());
    assert_eq!(viewer.scene().model_count(), 1);
    assert_eq!(viewer.drivers().len(), 1);

    loader.succeed("models/Stork.glb", animated_asset("stork", 1));
    viewer.poll_loads();
    viewer.resize(ViewportSize::new(333, 777).unwrap());
    assert_eq!(viewer.scene().model_count(), 2);
    assert_eq!(viewer.drivers().len(), 2);
    assert_eq!(viewer.camera().aspect, 333.0 / 777.0);
}

#[test]
fn collapsed_container_is_ignored() {
    let loader = FakeLoader::new();
    let mut viewer = boot(&loader, 800, 600);

    viewer.resize_to(&FixedContainer::sized(0, 600));
    assert_eq!(viewer.camera().aspect, 800.0 / 600.0);
    assert_eq!(viewer.renderer().sizes.len(), 1);

    viewer.resize_to(&FixedContainer::sized(500, 250));
    assert_eq!(viewer.camera().aspect, 2.0);
    assert_eq!(viewer.renderer().sizes.len(), 2);
}

#[test]
fn zero_sized_viewport_is_rejected() {
    assert!(ViewportSize::new(0, 10).is_err());
    assert!(ViewportSize::new(10, 0).is_err());
    assert!(ViewportSize::new(1, 1).is_ok());
}
