use serde::Deserialize;

use crate::error::ConfigError;
use crate::floor::FloorSegment;
use crate::math::{close_f64, Point3};
use crate::obstacle::Obstacle;
use crate::offset::lane_quads;

/// Width assumed for a lane without an explicit width, in meters.
pub const DEFAULT_LANE_WIDTH: f64 = 3.2;

/// Height of the ceiling above the tunnel floor, in meters.
pub const CEILING_HEIGHT: f64 = 5.0;

/// Factor applied to the road width to get the tunnel width.
const WIDTH_SCALE: f64 = 1.2;

/// Per-cut loss of a tunnel wall; nothing gets through.
#[allow(clippy::cast_lossless)]
const WALL_LOSS_DB: f64 = i32::MAX as f64;

/// Obstacle type given to tunnel walls.
pub const TUNNEL_TYPE: &str = "tunnel";

/// How a tunnel's walls are laid out around its centerline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadType {
    /// The centerline is the right road edge, so the tunnel is widened to
    /// cover the lanes on its left.
    #[default]
    Right,
    /// The centerline runs down the middle of the road.
    Center,
}

/// Sum of the lane widths of a road, using [`DEFAULT_LANE_WIDTH`] for lanes
/// without one.
#[must_use]
pub fn road_width(lanes: &[Option<f64>]) -> f64 {
    lanes.iter().map(|w| w.unwrap_or(DEFAULT_LANE_WIDTH)).sum()
}

/// A tunnel: two walls per straight stretch plus floor and ceiling slabs.
#[derive(Debug, Clone)]
pub struct Tunnel {
    id: String,
    walls: Vec<Obstacle>,
    surfaces: Vec<FloorSegment>,
}

impl Tunnel {
    /// Builds the tunnel around `centerline` for a road `width` meters wide.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] if the centerline has fewer
    /// than two distinct points.
    pub fn new(
        id: impl Into<String>,
        centerline: &[Point3],
        width: f64,
        spread: SpreadType,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let mut width = width * WIDTH_SCALE;
        if spread == SpreadType::Right {
            width *= 2.0;
        }
        let quads = lane_quads(centerline, width);
        if quads.is_empty() {
            return Err(ConfigError::TooFewVertices {
                entity: id,
                min: 2,
                got: centerline.len(),
            });
        }

        let mut walls = Vec::with_capacity(quads.len() * 2);
        let mut surfaces = Vec::with_capacity(quads.len() * 2);
        for (i, quad) in quads.iter().enumerate() {
            surfaces.push(FloorSegment::new(
                format!("{id}#floor{i}"),
                TUNNEL_TYPE,
                0.0,
                quad.to_vec(),
            )?);
            let ceiling = quad
                .iter()
                .map(|c| Point3::new(c.x, c.y, c.z + CEILING_HEIGHT))
                .collect();
            surfaces.push(FloorSegment::new(
                format!("{id}#ceiling{i}"),
                TUNNEL_TYPE,
                0.0,
                ceiling,
            )?);
            for (side, (a, b)) in [(quad[0], quad[1]), (quad[2], quad[3])].into_iter().enumerate() {
                walls.push(Obstacle::new(
                    format!("{id}#wall{i}.{side}"),
                    TUNNEL_TYPE,
                    vec![a, b],
                    0.0,
                    WALL_LOSS_DB,
                    0.0,
                )?);
            }
        }
        Ok(Self {
            id,
            walls,
            surfaces,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn walls(&self) -> &[Obstacle] {
        &self.walls
    }

    /// Floor and ceiling slabs, alternating.
    #[must_use]
    pub fn surfaces(&self) -> &[FloorSegment] {
        &self.surfaces
    }

    /// Returns `true` if the path leaves the tunnel through a wall, the floor
    /// or the ceiling.
    #[must_use]
    pub fn intersects_with(&self, sender: &Point3, receiver: &Point3) -> bool {
        self.walls
            .iter()
            .any(|w| !close_f64(w.shadowing(sender, receiver).factor, 1.0))
            || self
                .surfaces
                .iter()
                .any(|s| s.intersect(sender, receiver).is_some())
    }
}
