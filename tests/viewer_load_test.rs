use aviary::{
    AssetSpec, Viewer, ViewerConfig,
    cgmath::Vector3,
    data_structures::scene_graph::Light,
    viewer::BOUNDS_COLOUR,
};

use crate::common::test_utils::{
    FakeLoader, FixedContainer, RecordingRenderer, animated_asset, triangle_asset,
};

mod common;

fn boot(assets: Vec<AssetSpec>, loader: &FakeLoader) -> Viewer<RecordingRenderer> {
    let config = ViewerConfig::default().with_assets(assets);
    Viewer::bootstrap(
        &config,
        &FixedContainer::sized(800, 600),
        loader,
        RecordingRenderer::default(),
    )
    .unwrap()
}

#[test]
fn bootstrap_sets_up_camera_lights_and_loads() {
    let loader = FakeLoader::new();
    let viewer = boot(ViewerConfig::default().assets, &loader);

    let camera = viewer.camera();
    assert_eq!(camera.fovy.0, 35.0);
    assert_eq!(camera.znear, 0.1);
    assert_eq!(camera.zfar, 1000.0);
    assert_eq!(camera.position, [1.5, 1.5, 10.0].into());
    assert_eq!(camera.aspect, 800.0 / 600.0);

    let lights = viewer.scene().lights();
    assert_eq!(lights.len(), 2);
    assert!(matches!(
        lights[0],
        Light::Directional { intensity, position, .. }
            if intensity == 5.0 && position == Vector3::new(10.0, 10.0, 10.0)
    ));
    assert!(matches!(lights[1], Light::Hemisphere { intensity, .. } if intensity == 5.0));
    assert_eq!(viewer.scene().background, 0x87ceeb);

    assert_eq!(
        loader.requested(),
        vec![
            "models/face_mesh.glb",
            "models/Flamingo.glb",
            "models/Stork.glb"
        ]
    );
    assert_eq!(viewer.pending_loads(), 3);
    assert_eq!(viewer.scene().model_count(), 0);
    assert!(viewer.drivers().is_empty());
    assert_eq!(viewer.renderer().sizes.len(), 1);
}

#[test]
fn bootstrap_fails_without_a_container() {
    let loader = FakeLoader::new();
    let result = Viewer::bootstrap(
        &ViewerConfig::default(),
        &FixedContainer(None),
        &loader,
        RecordingRenderer::default(),
    );
    assert!(result.is_err());

    let result = Viewer::bootstrap(
        &ViewerConfig::default(),
        &FixedContainer::sized(800, 0),
        &loader,
        RecordingRenderer::default(),
    );
    assert!(result.is_err());
}

#[test]
fn counts_follow_successful_loads() {
    let assets = vec![
        AssetSpec::new("models/a.glb"),
        AssetSpec::new("models/b.glb"),
        AssetSpec::new("models/c.glb"),
        AssetSpec::new("models/d.glb"),
    ];
    let loader = FakeLoader::new();
    let mut viewer = boot(assets, &loader);

    loader.succeed("models/a.glb", animated_asset("a", 2));
    loader.succeed("models/b.glb", triangle_asset("b"));
    loader.fail("models/c.glb", "404 Not Found");
    loader.succeed("models/d.glb", animated_asset("d", 1));
    viewer.poll_loads();

    assert_eq!(viewer.pending_loads(), 0);
    assert_eq!(viewer.scene().model_count(), 3);
    assert_eq!(viewer.drivers().len(), 2);
    assert!(viewer.drivers().iter().all(|driver| driver.is_playing()));
    // bound to the first clip
    let a = viewer
        .scene()
        .models()
        .iter()
        .find(|model| model.source == "models/a.glb")
        .unwrap();
    let driver = viewer
        .drivers()
        .iter()
        .find(|driver| driver.model() == a.id())
        .unwrap();
    assert_eq!(driver.clip().name, "clip 0");
}

#[test]
fn loads_arrive_between_ticks() {
    let loader = FakeLoader::new();
    let mut viewer = boot(
        vec![AssetSpec::flamingo(), AssetSpec::stork()],
        &loader,
    );

    viewer.tick(instant::Duration::from_millis(16)).unwrap();
    assert_eq!(viewer.scene().model_count(), 0);
    assert_eq!(viewer.renderer().frames, 1);

    loader.succeed("models/Stork.glb", animated_asset("stork", 1));
    viewer.tick(instant::Duration::from_millis(16)).unwrap();
    assert_eq!(viewer.scene().model_count(), 1);
    assert_eq!(viewer.renderer().models_drawn, 1);
    assert_eq!(viewer.pending_loads(), 1);

    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    viewer.tick(instant::Duration::from_millis(16)).unwrap();
    assert_eq!(viewer.scene().model_count(), 2);
    assert_eq!(viewer.drivers().len(), 2);
    assert_eq!(viewer.pending_loads(), 0);
}

#[test]
fn failure_first_does_not_block_a_later_success() {
    let loader = FakeLoader::new();
    let mut viewer = boot(vec![AssetSpec::stork(), AssetSpec::flamingo()], &loader);

    loader.fail("models/Stork.glb", "corrupt file");
    viewer.poll_loads();
    assert_eq!(viewer.scene().model_count(), 0);

    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    viewer.poll_loads();
    assert_eq!(viewer.scene().model_count(), 1);
    assert_eq!(viewer.drivers().len(), 1);
    assert_eq!(viewer.scene().models()[0].source, "models/Flamingo.glb");
}

#[test]
fn success_first_survives_a_later_failure() {
    let loader = FakeLoader::new();
    let mut viewer = boot(vec![AssetSpec::stork(), AssetSpec::flamingo()], &loader);

    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    viewer.poll_loads();
    loader.fail("models/Stork.glb", "corrupt file");
    viewer.poll_loads();

    assert_eq!(viewer.scene().model_count(), 1);
    assert_eq!(viewer.drivers().len(), 1);
    assert_eq!(viewer.pending_loads(), 0);
}

#[test]
fn unanimated_and_animated_models_side_by_side() {
    let loader = FakeLoader::new();
    let mut viewer = boot(vec![AssetSpec::parrot(), AssetSpec::flamingo()], &loader);

    loader.succeed("models/Parrot.glb", triangle_asset("parrot"));
    loader.succeed("models/Flamingo.glb", animated_asset("flamingo", 1));
    viewer.poll_loads();

    let models = viewer.scene().models();
    assert_eq!(models.len(), 2);

    let parrot = models.iter().find(|m| m.source == "models/Parrot.glb").unwrap();
    let flamingo = models.iter().find(|m| m.source == "models/Flamingo.glb").unwrap();
    assert_eq!(parrot.transform.position, Vector3::new(0.0, 0.0, 2.5));
    assert_eq!(flamingo.transform.position, Vector3::new(7.5, 0.0, -10.0));
    assert_eq!(flamingo.transform.scale, Vector3::new(0.05, 0.05, 0.05));

    assert_eq!(viewer.drivers().len(), 1);
    assert_eq!(viewer.drivers()[0].model(), flamingo.id());
}

#[test]
fn failed_load_is_not_retried() {
    let loader = FakeLoader::new();
    let mut viewer = boot(vec![AssetSpec::stork()], &loader);

    loader.fail("models/Stork.glb", "network down");
    for _ in 0..3 {
        viewer.tick(instant::Duration::from_millis(16)).unwrap();
    }
    assert_eq!(loader.requested(), vec!["models/Stork.glb"]);
    assert_eq!(viewer.scene().model_count(), 0);
    assert_eq!(viewer.pending_loads(), 0);
}

#[test]
fn bounds_helper_only_where_asked_for() {
    let loader = FakeLoader::new();
    let mut viewer = boot(vec![AssetSpec::face_mesh(), AssetSpec::stork()], &loader);

    loader.succeed("models/face_mesh.glb", triangle_asset("face"));
    loader.succeed("models/Stork.glb", triangle_asset("stork"));
    viewer.poll_loads();

    let helpers = viewer.scene().helpers();
    assert_eq!(helpers.len(), 1);
    assert_eq!(helpers[0].colour, BOUNDS_COLOUR);
    assert_eq!(helpers[0].aabb.min, [0.0, 0.0, 0.0].into());
    assert_eq!(helpers[0].aabb.max, [1.0, 1.0, 0.0].into());

    viewer.tick(instant::Duration::from_millis(16)).unwrap();
    assert_eq!(viewer.renderer().helpers_drawn, 1);
    assert_eq!(viewer.renderer().models_drawn, 2);

    // the face mesh keeps the transform authored in the file
    let face = viewer
        .scene()
        .models()
        .iter()
        .find(|m| m.source == "models/face_mesh.glb")
        .unwrap();
    assert_eq!(face.transform.scale, Vector3::new(1.0, 1.0, 1.0));
}

#[test]
fn render_errors_are_reported_per_frame() {
    let loader = FakeLoader::new();
    let config = ViewerConfig::default().with_assets(vec![]);
    let mut viewer = Viewer::bootstrap(
        &config,
        &FixedContainer::sized(640, 480),
        &loader,
        RecordingRenderer {
            broken: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert!(viewer.tick(instant::Duration::from_millis(16)).is_err());
    viewer.renderer_mut().broken = false;
    assert!(viewer.tick(instant::Duration::from_millis(16)).is_ok());
    assert_eq!(viewer.renderer().frames, 2);
}
