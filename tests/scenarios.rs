#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use propagis::classifier::{Environment, ModelKind, RecordingSink};
use propagis::config::{ModelConfig, SceneConfig};
use propagis::fading::RiceRayleighFading;
use propagis::ground::{FreeSpacePathLoss, PlanarProjection, TwoRayInterference};
use propagis::math::{Point3, Vector3};
use propagis::stats::{db_loss_to_linear, db_to_linear};
use propagis::{EnvironmentClassifier, LinkContext, RoadContext, Scene};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const F: f64 = 5.89e9;

const SCENE: &str = r#"
    [[obstacle-types]]
    id = "building"
    db-per-cut = 9.0
    db-per-meter = 0.4

    [[obstacles]]
    id = "b1"
    type = "building"
    shape = [[20.0, -10.0], [30.0, -10.0], [30.0, 10.0], [20.0, 10.0]]

    [[floor-types]]
    id = "general"
    att-factor = 1.0

    [[floor-segments]]
    id = "deck"
    type = "general"
    shape = [[200.0, 0.0, 3.0], [240.0, 0.0, 3.0], [240.0, 20.0, 3.0], [200.0, 20.0, 3.0]]

    [[tunnels]]
    id = "t1"
    shape = [[0.0, 100.0], [200.0, 100.0]]
"#;

const MODELS: &str = r#"
    [ground]
    model = "two-ray"
    epsilon-r = 5.0

    [fading]
    k-factor = 10.0
    interval = 0.25
    seed = 3
"#;

fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn classifier() -> EnvironmentClassifier {
    init_tracing();
    let model = ModelConfig::from_toml_str(MODELS).unwrap();
    let scene = Scene::from_config(&SceneConfig::from_toml_str(SCENE).unwrap(), &model).unwrap();
    EnvironmentClassifier::from_config(scene, &model, None, Box::new(PlanarProjection)).unwrap()
}

fn p(x: f64, y: f64, z: f64) -> Point3 {
    Point3::new(x, y, z)
}

fn street(road: &str) -> RoadContext {
    RoadContext::road(road).with_street_width(50.0)
}

fn outdoor() -> LinkContext {
    LinkContext::new(street("main"), street("main"))
}

fn free_space(a: &Point3, b: &Point3) -> f64 {
    FreeSpacePathLoss::new(F).attenuation(a, b)
}

// ── outdoor ──

#[test]
fn building_blocks_line_of_sight() {
    let mut c = classifier();
    let (a, b) = (p(0.0, 0.0, 1.5), p(50.0, 0.0, 1.5));
    let out = c.classify_and_attenuate(&a, &b, &outdoor());
    assert_eq!(out.environment, Environment::Outdoor);
    // 2 cuts at 9 dB, 10 m inside at 0.4 dB/m.
    assert_relative_eq!(
        out.factor,
        free_space(&a, &b) * db_loss_to_linear(22.0),
        max_relative = 1e-9
    );
    assert_eq!(out.stats.unwrap().num_cuts, 2);
}

#[test]
fn clear_path_uses_two_ray() {
    let mut c = classifier();
    let (a, b) = (p(0.0, 50.0, 1.5), p(100.0, 50.0, 1.5));
    let out = c.classify_and_attenuate(&a, &b, &outdoor());
    let expected = TwoRayInterference::new(F, 5.0).attenuation(&a, &b, 1.0);
    assert_relative_eq!(out.factor, expected, max_relative = 1e-9);
    assert!(out.component(ModelKind::TwoRay).is_some());
}

#[test]
fn deck_overhead_suppresses_ground_reflection() {
    let mut c = classifier();
    let (a, b) = (p(190.0, 10.0, 1.5), p(250.0, 10.0, 1.5));
    assert!(c.scene().ground_floors_between(&a, &b));
    let out = c.classify_and_attenuate(&a, &b, &outdoor());
    assert_relative_eq!(out.factor, free_space(&a, &b), max_relative = 1e-9);
    assert!(out.component(ModelKind::TwoRay).is_none());
}

#[test]
fn narrow_street_falls_back_to_free_space() {
    let mut c = classifier();
    let (a, b) = (p(0.0, 50.0, 1.5), p(100.0, 50.0, 1.5));
    let link = LinkContext::new(
        RoadContext::road("alley").with_street_width(12.0),
        street("main"),
    );
    let out = c.classify_and_attenuate(&a, &b, &link);
    assert_relative_eq!(out.factor, free_space(&a, &b), max_relative = 1e-9);
}

#[test]
fn removing_an_obstacle_restores_attenuation() {
    let mut c = classifier();
    let (a, b) = (p(0.0, 50.0, 1.5), p(100.0, 50.0, 1.5));
    let before = c.classify_and_attenuate(&a, &b, &outdoor()).factor;

    let handle = c
        .scene_mut()
        .add_obstacle(
            "b2",
            vec![p(40.0, 45.0, 0.0), p(60.0, 45.0, 0.0), p(60.0, 55.0, 0.0), p(40.0, 55.0, 0.0)],
            0.0,
            "building",
        )
        .unwrap();
    let blocked = c.classify_and_attenuate(&a, &b, &outdoor()).factor;
    assert!(blocked < before);

    c.scene_mut().remove_obstacle(handle).unwrap();
    let after = c.classify_and_attenuate(&a, &b, &outdoor()).factor;
    assert_relative_eq!(after, before, max_relative = 1e-12);
}

#[test]
fn sink_receives_components_and_stats() {
    let mut c = classifier();
    let mut sink = RecordingSink::new();
    let (a, b) = (p(0.0, 0.0, 1.5), p(50.0, 0.0, 1.5));
    let out = c.apply(&a, &b, &outdoor(), &mut sink);
    assert_relative_eq!(sink.total(), out.factor, max_relative = 1e-12);
    assert_eq!(sink.stats.len(), 1);
    assert_eq!(sink.stats[0].num_cuts, 2);
}

// ── garage ──

fn garage() -> LinkContext {
    LinkContext::new(
        RoadContext::road("ramp").in_garage("g"),
        RoadContext::road("level1").in_garage("g"),
    )
}

#[test]
fn garage_floor_between_levels() {
    let mut c = classifier();
    let (a, b) = (p(220.0, 10.0, 1.5), p(220.0, 10.0, 4.5));
    let out = c.classify_and_attenuate(&a, &b, &garage());
    assert_eq!(out.environment, Environment::Garage);
    assert_relative_eq!(
        out.factor,
        free_space(&a, &b) * db_to_linear(-25.8),
        max_relative = 1e-9
    );
    assert!(out.component(ModelKind::Fading).is_none());
}

#[test]
fn garage_same_level_fades() {
    let mut c = classifier();
    let (a, b) = (p(205.0, 5.0, 4.0), p(235.0, 15.0, 4.0));
    let link = garage()
        .with_velocities(Vector3::new(10.0, 0.0, 0.0), Vector3::new(-5.0, 0.0, 0.0))
        .at(1.3);
    let out = c.classify_and_attenuate(&a, &b, &link);

    let fading = RiceRayleighFading::from_seed(F, 8, 10.0, 0.25, 3).unwrap();
    let expected = fading.value(15.0, 10.0, 1.3);
    assert_relative_eq!(
        out.component(ModelKind::Fading).unwrap(),
        expected,
        max_relative = 1e-12
    );
    assert_relative_eq!(out.factor, free_space(&a, &b) * expected, max_relative = 1e-9);
}

#[test]
fn different_garages_are_outdoor() {
    let mut c = classifier();
    let link = LinkContext::new(
        street("a").in_garage("g"),
        street("b").in_garage("h"),
    );
    let out = c.classify_and_attenuate(&p(0.0, 50.0, 1.5), &p(100.0, 50.0, 1.5), &link);
    assert_eq!(out.environment, Environment::Outdoor);
}

// ── tunnel ──

#[test]
fn link_inside_tunnel_is_free_space() {
    let mut c = classifier();
    let (a, b) = (p(20.0, 100.0, 1.5), p(150.0, 100.0, 1.5));
    let link = LinkContext::new(
        RoadContext::road("t-road").in_tunnel("t1"),
        RoadContext::road("t-road").in_tunnel("t1"),
    );
    let out = c.classify_and_attenuate(&a, &b, &link);
    assert_eq!(out.environment, Environment::Tunnel);
    assert_relative_eq!(out.factor, free_space(&a, &b), max_relative = 1e-9);
    assert!(out.component(ModelKind::Tunnel).is_none());
}

#[test]
fn link_through_tunnel_wall_is_blocked() {
    let mut c = classifier();
    let (a, b) = (p(50.0, 100.0, 1.5), p(50.0, 130.0, 1.5));
    let link = LinkContext::new(RoadContext::road("t-road").in_tunnel("t1"), street("main"));
    let out = c.classify_and_attenuate(&a, &b, &link);
    assert_eq!(out.environment, Environment::Tunnel);
    assert!(out.factor.abs() < f64::EPSILON);
}
