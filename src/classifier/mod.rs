//! Per-link dispatch: decides whether a transmission happens inside a
//! garage, involves a tunnel or runs outdoors, and combines the matching
//! models into one linear attenuation factor.

mod context;
mod models;
mod sink;

pub use context::{Environment, LinkContext, RoadContext};
pub use models::{Diffraction, Model, ModelKind, NoDiffraction};
pub use sink::{RecordingSink, SignalSink};

use tracing::{debug, warn};

use crate::config::{GroundModelKind, ModelConfig};
use crate::error::{ConfigError, ModelError, Result};
use crate::fading::{relative_speed, RiceRayleighFading, REDUCED_K_FACTOR};
use crate::ground::{
    ElevationSource, FreeSpacePathLoss, GeoProjection, NRayGroundInterference, StreetWidthMemo,
    TwoRayInterference,
};
use crate::math::{close_f64, Point3};
use crate::scene::Scene;
use crate::stats::SignalStats;

/// Result of classifying and attenuating one link.
#[derive(Debug, Clone, PartialEq)]
pub struct Attenuation {
    /// Product of all components.
    pub factor: f64,
    /// Obstacle diagnostics, present when outdoor shadowing was evaluated.
    pub stats: Option<SignalStats>,
    pub environment: Environment,
    /// Individual contributions in evaluation order.
    pub components: Vec<(ModelKind, f64)>,
}

impl Attenuation {
    fn new(environment: Environment) -> Self {
        Self {
            factor: 1.0,
            stats: None,
            environment,
            components: Vec::new(),
        }
    }

    fn push(&mut self, kind: ModelKind, factor: f64) {
        self.factor *= factor;
        self.components.push((kind, factor));
    }

    /// Contribution of `kind`, if it was evaluated.
    #[must_use]
    pub fn component(&self, kind: ModelKind) -> Option<f64> {
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, f)| *f)
    }
}

/// Chooses and combines propagation models per link.
#[derive(Debug)]
pub struct EnvironmentClassifier {
    scene: Scene,
    free_space: FreeSpacePathLoss,
    two_ray: Option<TwoRayInterference>,
    n_ray: Option<NRayGroundInterference>,
    fading: Option<RiceRayleighFading>,
    diffraction: Box<dyn Diffraction>,
    street_widths: StreetWidthMemo,
}

impl EnvironmentClassifier {
    /// Creates a classifier over `scene` from a set of models.
    ///
    /// A model registered twice replaces the earlier one. Without a
    /// diffraction model, [`NoDiffraction`] is used.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingDependency`] if no free-space model is
    /// given.
    pub fn new(scene: Scene, models: Vec<Model>) -> Result<Self> {
        let mut free_space = None;
        let mut two_ray = None;
        let mut n_ray = None;
        let mut fading = None;
        let mut diffraction: Option<Box<dyn Diffraction>> = None;

        for model in models {
            let kind = model.kind();
            let replaced = match model {
                Model::FreeSpace(m) => free_space.replace(m).is_some(),
                Model::TwoRay(m) => two_ray.replace(m).is_some(),
                Model::NRay(m) => n_ray.replace(m).is_some(),
                Model::Fading(m) => fading.replace(m).is_some(),
                Model::Diffraction(m) => diffraction.replace(m).is_some(),
            };
            if replaced {
                warn!(?kind, "model registered twice, keeping the last one");
            }
        }

        let free_space = free_space.ok_or(ModelError::MissingDependency {
            model: "EnvironmentClassifier",
            dependency: "a free-space path loss model",
        })?;

        debug!(
            two_ray = two_ray.is_some(),
            n_ray = n_ray.is_some(),
            fading = fading.is_some(),
            "classifier ready"
        );
        Ok(Self {
            scene,
            free_space,
            two_ray,
            n_ray,
            fading,
            diffraction: diffraction.unwrap_or_else(|| Box::new(NoDiffraction)),
            street_widths: StreetWidthMemo::new(),
        })
    }

    /// Creates a classifier with the models described by `config`.
    ///
    /// `terrain` and `projection` feed the N-ray model and are ignored by
    /// the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for parameters rejected by
    /// [`ModelConfig::validate`], [`ConfigError::MissingParameter`] for an
    /// N-ray model without a sample spacing, and the construction errors of
    /// each model.
    pub fn from_config(
        scene: Scene,
        config: &ModelConfig,
        terrain: Option<Box<dyn ElevationSource>>,
        projection: Box<dyn GeoProjection>,
    ) -> Result<Self> {
        config.validate()?;
        let frequency = config.carrier_frequency;
        let mut models = vec![Model::FreeSpace(FreeSpacePathLoss::with_exponent(
            frequency,
            config.path_loss_exponent,
        ))];

        if let Some(ground) = &config.ground {
            match ground.model {
                GroundModelKind::TwoRay => {
                    models.push(Model::TwoRay(TwoRayInterference::new(frequency, ground.epsilon_r)));
                }
                GroundModelKind::NRay => {
                    let spacing = ground
                        .spacing
                        .ok_or_else(|| ConfigError::MissingParameter("spacing".to_owned()))?;
                    models.push(Model::NRay(NRayGroundInterference::new(
                        frequency,
                        ground.epsilon_r,
                        spacing,
                        terrain,
                        projection,
                    )?));
                }
            }
        }

        if let Some(f) = &config.fading {
            models.push(Model::Fading(RiceRayleighFading::from_seed(
                frequency,
                f.num_paths,
                f.k_factor,
                f.interval,
                f.seed,
            )?));
        }

        Self::new(scene, models)
    }

    /// Replaces the diffraction model.
    #[must_use]
    pub fn with_diffraction(mut self, diffraction: Box<dyn Diffraction>) -> Self {
        self.diffraction = diffraction;
        self
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access. Cached obstacle results are dropped by the
    /// stores themselves when obstacles change.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Forgets remembered street widths.
    pub fn reset_street_widths(&mut self) {
        self.street_widths.reset();
    }

    /// Classifies the link and returns its total attenuation.
    pub fn classify_and_attenuate(
        &mut self,
        sender: &Point3,
        receiver: &Point3,
        link: &LinkContext,
    ) -> Attenuation {
        let environment = Environment::of(link);
        debug!(?environment, "dispatching link");
        let mut out = Attenuation::new(environment);
        match environment {
            Environment::Garage => self.garage(sender, receiver, link, &mut out),
            Environment::Tunnel => self.tunnel(sender, receiver, link, &mut out),
            Environment::Outdoor => self.outdoor(sender, receiver, link, &mut out),
        }
        out
    }

    /// Runs [`classify_and_attenuate`](Self::classify_and_attenuate) and
    /// hands every contribution and the obstacle stats to `sink`.
    pub fn apply<S: SignalSink + ?Sized>(
        &mut self,
        sender: &Point3,
        receiver: &Point3,
        link: &LinkContext,
        sink: &mut S,
    ) -> Attenuation {
        let out = self.classify_and_attenuate(sender, receiver, link);
        for (kind, factor) in &out.components {
            sink.record_attenuation(*kind, *factor);
        }
        if let Some(stats) = out.stats {
            sink.record_stats(stats);
        }
        out
    }

    fn garage(&mut self, sender: &Point3, receiver: &Point3, link: &LinkContext, out: &mut Attenuation) {
        out.push(ModelKind::FreeSpace, self.free_space.attenuation(sender, receiver));
        let floor = self.scene.floors_mut().attenuate(sender, receiver);
        out.push(ModelKind::Floor, floor);
        if !close_f64(floor, 1.0) {
            return;
        }

        let diffraction = self.diffraction.attenuation(sender, receiver, true);
        out.push(ModelKind::Diffraction, diffraction);
        let walls = self.scene.inner_walls_mut().attenuate(sender, receiver).factor;
        out.push(ModelKind::InnerWallShadowing, walls);

        if let Some(fading) = &self.fading {
            let k = if close_f64(diffraction, 1.0) && close_f64(walls, 1.0) {
                fading.k_factor()
            } else {
                REDUCED_K_FACTOR
            };
            let speed = relative_speed(&link.sender_velocity, &link.receiver_velocity);
            out.push(ModelKind::Fading, fading.value(speed, k, link.time));
        }
    }

    fn tunnel(&self, sender: &Point3, receiver: &Point3, link: &LinkContext, out: &mut Attenuation) {
        out.push(ModelKind::FreeSpace, self.free_space.attenuation(sender, receiver));
        let (tx, rx) = (link.sender.tunnel_id(), link.receiver.tunnel_id());
        if tx != rx {
            let factor = self
                .scene
                .tunnels()
                .calculate_attenuation(sender, receiver, tx, rx);
            out.push(ModelKind::Tunnel, factor);
        }
    }

    fn outdoor(&mut self, sender: &Point3, receiver: &Point3, link: &LinkContext, out: &mut Attenuation) {
        let floor = self.scene.floors_mut().attenuate(sender, receiver);
        out.push(ModelKind::Floor, floor);
        let mut nlos = floor;
        if close_f64(floor, 1.0) {
            let diffraction = self.diffraction.attenuation(sender, receiver, false);
            out.push(ModelKind::Diffraction, diffraction);
            let stats = self.scene.obstacles_mut().attenuate(sender, receiver);
            out.push(ModelKind::ObstacleShadowing, stats.factor);
            out.stats = Some(stats);
            nlos *= diffraction * stats.factor;
        }

        if !close_f64(nlos, 1.0) || (self.two_ray.is_none() && self.n_ray.is_none()) {
            out.push(ModelKind::FreeSpace, self.free_space.attenuation(sender, receiver));
            return;
        }

        if self.scene.ground_floors_between(sender, receiver) {
            debug!("elevated floor between endpoints, no ground reflection");
            out.push(ModelKind::FreeSpace, self.free_space.attenuation(sender, receiver));
            return;
        }

        let scaling = self.street_widths.scaling(
            (link.sender.road_id.as_str(), link.sender.street_width),
            (link.receiver.road_id.as_str(), link.receiver.street_width),
        );
        if close_f64(scaling, 0.0) {
            out.push(ModelKind::FreeSpace, self.free_space.attenuation(sender, receiver));
        } else if let Some(n_ray) = &self.n_ray {
            out.push(ModelKind::NRay, n_ray.attenuation(sender, receiver, scaling));
        } else if let Some(two_ray) = &self.two_ray {
            out.push(ModelKind::TwoRay, two_ray.attenuation(sender, receiver, scaling));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{FadingConfig, GroundConfig};
    use crate::error::PropagisError;
    use crate::ground::{FlatTerrain, PlanarProjection};
    use crate::obstacle::INNER_WALL_TYPE;
    use crate::scene::GENERAL_FLOOR_TYPE;

    const F: f64 = 5.89e9;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.define_obstacle_type("building", 9.0, 0.4);
        scene.define_obstacle_type(INNER_WALL_TYPE, 10.0, 0.0);
        scene.define_floor_type(GENERAL_FLOOR_TYPE, 1.0);
        scene
    }

    fn outdoor(road: &str, width: f64) -> LinkContext {
        LinkContext::new(
            RoadContext::road(road).with_street_width(width),
            RoadContext::road(road).with_street_width(width),
        )
    }

    #[derive(Debug)]
    struct Fixed(f64);

    impl Diffraction for Fixed {
        fn attenuation(&self, _: &Point3, _: &Point3, _: bool) -> f64 {
            self.0
        }
    }

    // ── construction ──

    #[test]
    fn free_space_is_required() {
        let err = EnvironmentClassifier::new(scene(), vec![Model::TwoRay(TwoRayInterference::new(F, 5.0))]);
        assert!(matches!(
            err,
            Err(PropagisError::Model(ModelError::MissingDependency { .. }))
        ));
    }

    #[test]
    fn later_registration_wins() {
        let mut c = EnvironmentClassifier::new(
            scene(),
            vec![
                Model::FreeSpace(FreeSpacePathLoss::with_exponent(F, 3.0)),
                Model::FreeSpace(FreeSpacePathLoss::new(F)),
            ],
        )
        .unwrap();
        let (a, b) = (p(0.0, 0.0, 1.5), p(100.0, 0.0, 1.5));
        let out = c.classify_and_attenuate(&a, &b, &outdoor("r", 30.0));
        let expected = FreeSpacePathLoss::new(F).attenuation(&a, &b);
        assert!((out.factor - expected).abs() < 1e-18);
    }

    #[test]
    fn n_ray_needs_spacing() {
        let config = ModelConfig {
            ground: Some(GroundConfig {
                model: GroundModelKind::NRay,
                epsilon_r: 5.0,
                spacing: None,
            }),
            ..ModelConfig::default()
        };
        let err = EnvironmentClassifier::from_config(
            scene(),
            &config,
            Some(Box::new(FlatTerrain { height: 0.0 })),
            Box::new(PlanarProjection),
        );
        assert!(matches!(
            err,
            Err(PropagisError::Config(ConfigError::MissingParameter(_)))
        ));
    }

    #[test]
    fn n_ray_needs_terrain() {
        let config = ModelConfig {
            ground: Some(GroundConfig {
                model: GroundModelKind::NRay,
                epsilon_r: 5.0,
                spacing: Some(1.0),
            }),
            ..ModelConfig::default()
        };
        let err = EnvironmentClassifier::from_config(scene(), &config, None, Box::new(PlanarProjection));
        assert!(matches!(
            err,
            Err(PropagisError::Model(ModelError::MissingDependency { .. }))
        ));
    }

    #[test]
    fn permittivity_below_air_is_rejected() {
        let config = ModelConfig {
            ground: Some(GroundConfig {
                model: GroundModelKind::TwoRay,
                epsilon_r: 0.5,
                spacing: None,
            }),
            ..ModelConfig::default()
        };
        let err = EnvironmentClassifier::from_config(scene(), &config, None, Box::new(PlanarProjection));
        assert!(matches!(
            err,
            Err(PropagisError::Config(ConfigError::InvalidValue { parameter: "epsilon_r", .. }))
        ));
    }

    #[test]
    fn zero_frequency_is_rejected() {
        let config = ModelConfig {
            carrier_frequency: 0.0,
            ..ModelConfig::default()
        };
        let err = EnvironmentClassifier::from_config(scene(), &config, None, Box::new(PlanarProjection));
        assert!(matches!(
            err,
            Err(PropagisError::Config(ConfigError::InvalidValue {
                parameter: "carrier_frequency",
                ..
            }))
        ));
    }

    // ── outdoor ──

    #[test]
    fn obstacle_replaces_ground_reflection() {
        let mut scene = scene();
        scene
            .add_obstacle(
                "house",
                vec![p(40.0, -5.0, 0.0), p(60.0, -5.0, 0.0), p(60.0, 5.0, 0.0), p(40.0, 5.0, 0.0)],
                0.0,
                "building",
            )
            .unwrap();
        let mut c = EnvironmentClassifier::new(
            scene,
            vec![
                Model::FreeSpace(FreeSpacePathLoss::new(F)),
                Model::TwoRay(TwoRayInterference::new(F, 5.0)),
            ],
        )
        .unwrap();
        let (a, b) = (p(0.0, 0.0, 1.5), p(100.0, 0.0, 1.5));
        let out = c.classify_and_attenuate(&a, &b, &outdoor("r", 40.0));
        assert_eq!(out.environment, Environment::Outdoor);
        let stats = out.stats.unwrap();
        assert_eq!(stats.num_cuts, 2);
        assert!(out.component(ModelKind::TwoRay).is_none());
        let fs = FreeSpacePathLoss::new(F).attenuation(&a, &b);
        assert!((out.factor - fs * stats.factor).abs() < 1e-18);
    }

    #[test]
    fn narrow_street_disables_reflection() {
        let mut c = EnvironmentClassifier::new(
            scene(),
            vec![
                Model::FreeSpace(FreeSpacePathLoss::new(F)),
                Model::TwoRay(TwoRayInterference::new(F, 5.0)),
            ],
        )
        .unwrap();
        let (a, b) = (p(0.0, 0.0, 1.5), p(100.0, 0.0, 1.5));
        let narrow = c.classify_and_attenuate(&a, &b, &outdoor("alley", 10.0));
        assert!(narrow.component(ModelKind::FreeSpace).is_some());
        assert!(narrow.component(ModelKind::TwoRay).is_none());

        let wide = c.classify_and_attenuate(&a, &b, &outdoor("avenue", 50.0));
        let expected = TwoRayInterference::new(F, 5.0).attenuation(&a, &b, 1.0);
        assert!((wide.factor - expected).abs() < 1e-18);
    }

    #[test]
    fn diffraction_counts_as_obstruction() {
        let mut c = EnvironmentClassifier::new(
            scene(),
            vec![
                Model::FreeSpace(FreeSpacePathLoss::new(F)),
                Model::TwoRay(TwoRayInterference::new(F, 5.0)),
                Model::Diffraction(Box::new(Fixed(0.5))),
            ],
        )
        .unwrap();
        let (a, b) = (p(0.0, 0.0, 1.5), p(100.0, 0.0, 1.5));
        let out = c.classify_and_attenuate(&a, &b, &outdoor("r", 50.0));
        let fs = FreeSpacePathLoss::new(F).attenuation(&a, &b);
        assert!((out.factor - 0.5 * fs).abs() < 1e-18);
    }

    // ── garage ──

    #[test]
    fn inner_wall_reduces_k_factor() {
        let mut scene = scene();
        scene
            .add_obstacle("w", vec![p(5.0, -5.0, 0.0), p(5.0, 5.0, 0.0)], 0.0, INNER_WALL_TYPE)
            .unwrap();
        let config = ModelConfig {
            fading: Some(FadingConfig {
                num_paths: 8,
                k_factor: 10.0,
                interval: 0.25,
                seed: 0,
            }),
            ..ModelConfig::default()
        };
        let mut c =
            EnvironmentClassifier::from_config(scene, &config, None, Box::new(PlanarProjection)).unwrap();
        let link = LinkContext::new(
            RoadContext::road("ramp").in_garage("g1"),
            RoadContext::road("deck").in_garage("g1"),
        )
        .with_velocities(crate::math::Vector3::new(10.0, 0.0, 0.0), crate::math::Vector3::zeros())
        .at(0.3);

        let (a, b) = (p(0.0, 0.0, 1.5), p(10.0, 0.0, 1.5));
        let out = c.classify_and_attenuate(&a, &b, &link);
        assert_eq!(out.environment, Environment::Garage);
        assert!((out.component(ModelKind::InnerWallShadowing).unwrap() - 0.1).abs() < 1e-12);
        let fading = RiceRayleighFading::from_seed(F, 8, 10.0, 0.25, 0).unwrap();
        let expected = fading.value(10.0, REDUCED_K_FACTOR, 0.3);
        assert!((out.component(ModelKind::Fading).unwrap() - expected).abs() < 1e-12);
        assert!(out.stats.is_none());
    }

    // ── sink ──

    #[test]
    fn apply_records_components() {
        let mut c =
            EnvironmentClassifier::new(scene(), vec![Model::FreeSpace(FreeSpacePathLoss::new(F))]).unwrap();
        let mut sink = RecordingSink::new();
        let (a, b) = (p(0.0, 0.0, 1.5), p(100.0, 0.0, 1.5));
        let out = c.apply(&a, &b, &outdoor("r", 50.0), &mut sink);
        assert!((sink.total() - out.factor).abs() < 1e-18);
        assert_eq!(sink.stats.len(), 1);
        assert_eq!(sink.attenuations.len(), out.components.len());
    }
}
