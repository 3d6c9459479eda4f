//! Scene and model descriptions, loaded from TOML.
//!
//! Field names follow the attribute names of the usual scene files
//! (`db-per-cut`, `att-factor`, `spread-type`, ...).

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::fading::RECOMMENDED_NUM_PATHS;
use crate::floor::DEFAULT_DEDUPE_TOLERANCE;
use crate::ground::DEFAULT_PATH_LOSS_EXPONENT;
use crate::math::Point3;
use crate::obstacle::{DEFAULT_CACHE_CAPACITY, DEFAULT_CELL_SIZE};
use crate::tunnel::{SpreadType, DEFAULT_LANE_WIDTH};

/// Carrier frequency of IEEE 802.11p channel 178, in Hz.
pub const DEFAULT_CARRIER_FREQUENCY: f64 = 5.89e9;

/// Geometry and material tables of a scene.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SceneConfig {
    pub obstacle_types: Vec<ObstacleTypeConfig>,
    pub obstacles: Vec<ObstacleConfig>,
    pub floor_types: Vec<FloorTypeConfig>,
    pub floor_segments: Vec<FloorSegmentConfig>,
    pub lanes: Vec<LaneConfig>,
    pub tunnels: Vec<TunnelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObstacleTypeConfig {
    pub id: String,
    pub db_per_cut: f64,
    pub db_per_meter: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObstacleConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub shape: Vec<Vec<f64>>,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FloorTypeConfig {
    pub id: String,
    pub att_factor: f64,
}

/// A junction or any other explicit floor outline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FloorSegmentConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub shape: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LaneConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub shape: Vec<Vec<f64>>,
    #[serde(default = "default_lane_width")]
    pub width: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TunnelConfig {
    pub id: String,
    pub shape: Vec<Vec<f64>>,
    /// Number of lanes through the tunnel.
    #[serde(default = "default_lane_count")]
    pub lanes: usize,
    /// Explicit widths of the first lanes; the rest are
    /// [`DEFAULT_LANE_WIDTH`] wide.
    #[serde(default)]
    pub lane_widths: Vec<f64>,
    #[serde(default)]
    pub spread_type: SpreadType,
}

impl TunnelConfig {
    /// Per-lane widths, `None` where the default applies.
    #[must_use]
    pub fn per_lane_widths(&self) -> Vec<Option<f64>> {
        let count = self.lanes.max(self.lane_widths.len());
        (0..count).map(|i| self.lane_widths.get(i).copied()).collect()
    }
}

/// Which ground reflection model the outdoor path uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroundModelKind {
    TwoRay,
    NRay,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GroundConfig {
    pub model: GroundModelKind,
    /// Relative permittivity of the ground.
    pub epsilon_r: f64,
    /// Distance between terrain samples, required by the N-ray model.
    pub spacing: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FadingConfig {
    #[serde(default = "default_num_paths")]
    pub num_paths: usize,
    /// Linear K factor; 0 gives Rayleigh fading.
    pub k_factor: f64,
    /// Sample spacing over a reception, in seconds.
    pub interval: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FloorModelConfig {
    /// Standard deviation in dB of the noise added to floor losses.
    pub std_dev: f64,
    pub dedupe_tolerance: f64,
    pub seed: u64,
}

impl Default for FloorModelConfig {
    fn default() -> Self {
        Self {
            std_dev: 0.0,
            dedupe_tolerance: DEFAULT_DEDUPE_TOLERANCE,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ObstacleIndexConfig {
    pub cell_size: f64,
    /// Cached position pairs; 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for ObstacleIndexConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Propagation model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ModelConfig {
    pub carrier_frequency: f64,
    pub path_loss_exponent: f64,
    pub ground: Option<GroundConfig>,
    pub fading: Option<FadingConfig>,
    pub floors: FloorModelConfig,
    pub obstacles: ObstacleIndexConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            carrier_frequency: DEFAULT_CARRIER_FREQUENCY,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
            ground: None,
            fading: None,
            floors: FloorModelConfig::default(),
            obstacles: ObstacleIndexConfig::default(),
        }
    }
}

fn default_lane_width() -> f64 {
    DEFAULT_LANE_WIDTH
}

fn default_lane_count() -> usize {
    1
}

fn default_num_paths() -> usize {
    RECOMMENDED_NUM_PATHS
}

impl SceneConfig {
    /// Parses a scene description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a scene description file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] for malformed TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }
}

impl ModelConfig {
    /// Parses and validates model parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and the errors of
    /// [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a model parameter file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] for malformed TOML and the errors of
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the parameters the propagation formulas cannot take.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a carrier frequency that is
    /// not positive, a ground permittivity below that of air, or a grid cell
    /// size that is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.carrier_frequency.is_finite() || self.carrier_frequency <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "carrier_frequency",
                value: self.carrier_frequency,
                reason: "must be a positive frequency in Hz",
            });
        }
        if let Some(ground) = &self.ground {
            if !ground.epsilon_r.is_finite() || ground.epsilon_r < 1.0 {
                return Err(ConfigError::InvalidValue {
                    parameter: "epsilon_r",
                    value: ground.epsilon_r,
                    reason: "relative permittivity cannot be below 1",
                });
            }
        }
        let cell_size = self.obstacles.cell_size;
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "cell_size",
                value: cell_size,
                reason: "must be a positive, finite distance",
            });
        }
        Ok(())
    }
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Converts `[x, y]` or `[x, y, z]` tuples to points.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for a coordinate with another
/// number of components.
#[allow(clippy::cast_precision_loss)]
pub fn parse_shape(shape: &[Vec<f64>]) -> Result<Vec<Point3>, ConfigError> {
    shape
        .iter()
        .map(|c| match c.as_slice() {
            [x, y] => Ok(Point3::new(*x, *y, 0.0)),
            [x, y, z] => Ok(Point3::new(*x, *y, *z)),
            _ => Err(ConfigError::InvalidValue {
                parameter: "shape",
                value: c.len() as f64,
                reason: "coordinates need two or three components",
            }),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [[obstacle-types]]
        id = "building"
        db-per-cut = 9.0
        db-per-meter = 0.4

        [[obstacles]]
        id = "b1"
        type = "building"
        shape = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]
        height = 12.0

        [[floor-types]]
        id = "general"
        att-factor = 1.0

        [[lanes]]
        id = "ramp"
        type = "general"
        shape = [[0.0, 0.0, 0.0], [40.0, 0.0, 4.0]]

        [[tunnels]]
        id = "t1"
        shape = [[0.0, 50.0], [200.0, 50.0]]
        lanes = 2
        lane-widths = [3.5]
        spread-type = "center"
    "#;

    #[test]
    fn parses_scene() {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.obstacle_types[0].id, "building");
        assert!((scene.obstacles[0].height - 12.0).abs() < f64::EPSILON);
        assert_eq!(scene.obstacles[0].kind, "building");
        assert!((scene.lanes[0].width - DEFAULT_LANE_WIDTH).abs() < f64::EPSILON);
        assert_eq!(scene.tunnels[0].spread_type, SpreadType::Center);
        assert_eq!(scene.tunnels[0].per_lane_widths(), vec![Some(3.5), None]);
        assert!(scene.floor_segments.is_empty());
    }

    #[test]
    fn model_defaults() {
        let model = ModelConfig::from_toml_str("").unwrap();
        assert!((model.carrier_frequency - DEFAULT_CARRIER_FREQUENCY).abs() < f64::EPSILON);
        assert!(model.ground.is_none());
        assert_eq!(model.obstacles.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!((model.floors.dedupe_tolerance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn model_sections() {
        let model = ModelConfig::from_toml_str(
            r#"
            carrier-frequency = 5.9e9
            [ground]
            model = "n-ray"
            epsilon-r = 1.02
            spacing = 5.0
            [fading]
            k-factor = 4.0
            interval = 0.001
            "#,
        )
        .unwrap();
        let ground = model.ground.unwrap();
        assert_eq!(ground.model, GroundModelKind::NRay);
        assert!(ground.spacing.is_some_and(|s| (s - 5.0).abs() < f64::EPSILON));
        let fading = model.fading.unwrap();
        assert_eq!(fading.num_paths, RECOMMENDED_NUM_PATHS);
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(
            ModelConfig::from_toml_str("carrier-frequency = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SceneConfig::load(Path::new("/nonexistent/scene.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn shapes() {
        let pts = parse_shape(&[vec![1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
        assert!((pts[0].z).abs() < f64::EPSILON);
        assert!((pts[1].z - 5.0).abs() < f64::EPSILON);
        assert!(parse_shape(&[vec![1.0]]).is_err());
    }

    #[test]
    fn permittivity_below_air_is_rejected() {
        let err = ModelConfig::from_toml_str(
            r#"
            [ground]
            model = "two-ray"
            epsilon-r = 0.5
            "#,
        );
        assert!(matches!(
            err,
            Err(ConfigError::InvalidValue { parameter: "epsilon_r", .. })
        ));
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        for text in ["carrier-frequency = 0.0", "carrier-frequency = -5.9e9"] {
            assert!(matches!(
                ModelConfig::from_toml_str(text),
                Err(ConfigError::InvalidValue { parameter: "carrier_frequency", .. })
            ));
        }
    }

    #[test]
    fn tiny_or_zero_cell_size() {
        assert!(matches!(
            ModelConfig::from_toml_str("[obstacles]\ncell-size = 0.0"),
            Err(ConfigError::InvalidValue { parameter: "cell_size", .. })
        ));
        assert!(ModelConfig::from_toml_str("[obstacles]\ncell-size = 1e-6").is_ok());
    }
}
