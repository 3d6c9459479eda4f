//! The geometry of a scenario: buildings, inner walls, floors and tunnels,
//! plus the material tables they are built from.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{parse_shape, ModelConfig, SceneConfig};
use crate::error::{ConfigError, Result};
use crate::floor::{FloorIndex, FloorSegment, FloorSegmentId};
use crate::geometry::Triangle;
use crate::math::Point3;
use crate::obstacle::{Obstacle, ObstacleId, ObstacleStore};
use crate::tunnel::{road_width, SpreadType, TunnelRegistry};

/// Floor type used when a segment's own type is unknown.
pub const GENERAL_FLOOR_TYPE: &str = "general";

/// Attenuation parameters of an obstacle type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleType {
    /// Loss per boundary crossing, in dB.
    pub db_per_cut: f64,
    /// Loss per meter inside the obstacle, in dB.
    pub db_per_meter: f64,
}

/// Where an added obstacle lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleHandle {
    /// In the outdoor store, shadowing every outdoor link.
    Outdoor(ObstacleId),
    /// In the inner-wall store, shadowing links within a garage.
    InnerWall(ObstacleId),
}

#[derive(Debug)]
pub struct Scene {
    obstacle_types: HashMap<String, ObstacleType>,
    floor_types: HashMap<String, f64>,
    obstacles: ObstacleStore,
    inner_walls: ObstacleStore,
    floors: FloorIndex,
    tunnels: TunnelRegistry,
}

impl Default for Scene {
    fn default() -> Self {
        Self::with_stores(ObstacleStore::new(), FloorIndex::new())
    }
}

impl Scene {
    /// Creates an empty scene with default store settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scene around preconfigured stores.
    ///
    /// Inner walls share the grid cell size of `obstacles` but are never
    /// cached.
    #[must_use]
    pub fn with_stores(obstacles: ObstacleStore, floors: FloorIndex) -> Self {
        let inner_walls = obstacles.empty_like(0);
        Self {
            obstacle_types: HashMap::new(),
            floor_types: HashMap::new(),
            obstacles,
            inner_walls,
            floors,
            tunnels: TunnelRegistry::new(),
        }
    }

    /// Builds a scene from its description.
    ///
    /// Types are registered first, then obstacles, floors, lanes and
    /// tunnels. The first invalid entry aborts the load.
    ///
    /// # Errors
    ///
    /// Returns the configuration or scene error of the first invalid entry.
    pub fn from_config(scene: &SceneConfig, model: &ModelConfig) -> Result<Self> {
        let obstacles =
            ObstacleStore::with_settings(model.obstacles.cell_size, model.obstacles.cache_capacity)?;
        let floors = FloorIndex::with_settings(
            model.floors.std_dev,
            model.floors.dedupe_tolerance,
            model.floors.seed,
        )?;
        let mut out = Self::with_stores(obstacles, floors);

        for t in &scene.obstacle_types {
            out.define_obstacle_type(&t.id, t.db_per_cut, t.db_per_meter);
        }
        for t in &scene.floor_types {
            out.define_floor_type(&t.id, t.att_factor);
        }
        for o in &scene.obstacles {
            out.add_obstacle(&o.id, parse_shape(&o.shape)?, o.height, &o.kind)?;
        }
        for f in &scene.floor_segments {
            out.add_floor_segment(&f.id, parse_shape(&f.shape)?, &f.kind)?;
        }
        for lane in &scene.lanes {
            out.add_floor_lane(&lane.id, &lane.kind, &parse_shape(&lane.shape)?, lane.width)?;
        }
        for t in &scene.tunnels {
            let width = road_width(&t.per_lane_widths());
            out.add_tunnel(&t.id, &parse_shape(&t.shape)?, width, t.spread_type)?;
        }

        info!(
            obstacles = out.obstacles.len(),
            inner_walls = out.inner_walls.len(),
            floor_segments = out.floors.len(),
            tunnels = out.tunnels.len(),
            "scene loaded"
        );
        Ok(out)
    }

    /// Registers or replaces an obstacle type.
    pub fn define_obstacle_type(&mut self, id: &str, db_per_cut: f64, db_per_meter: f64) {
        self.obstacle_types.insert(
            id.to_owned(),
            ObstacleType {
                db_per_cut,
                db_per_meter,
            },
        );
    }

    /// Registers or replaces a floor type.
    pub fn define_floor_type(&mut self, id: &str, att_factor: f64) {
        self.floor_types.insert(id.to_owned(), att_factor);
    }

    #[must_use]
    pub fn obstacle_type(&self, id: &str) -> Option<&ObstacleType> {
        self.obstacle_types.get(id)
    }

    fn require_obstacle_type(&self, kind: &str) -> std::result::Result<ObstacleType, ConfigError> {
        self.obstacle_types
            .get(kind)
            .copied()
            .ok_or_else(|| ConfigError::UnknownType {
                kind: "obstacle",
                name: kind.to_owned(),
            })
    }

    /// Attenuation factor of a floor type, falling back to
    /// [`GENERAL_FLOOR_TYPE`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] if neither type is defined.
    pub fn floor_factor(&self, kind: &str) -> std::result::Result<f64, ConfigError> {
        self.floor_types
            .get(kind)
            .or_else(|| self.floor_types.get(GENERAL_FLOOR_TYPE))
            .copied()
            .ok_or_else(|| ConfigError::UnknownType {
                kind: "floor",
                name: kind.to_owned(),
            })
    }

    /// Adds an obstacle of a registered type given its footprint.
    ///
    /// Obstacles of type [`INNER_WALL_TYPE`](crate::obstacle::INNER_WALL_TYPE) go to the inner-wall store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for an unregistered type and the
    /// obstacle's own validation errors.
    pub fn add_obstacle(
        &mut self,
        id: &str,
        shape: Vec<Point3>,
        height: f64,
        kind: &str,
    ) -> Result<ObstacleHandle> {
        let t = self.require_obstacle_type(kind)?;
        let obstacle = Obstacle::new(id, kind, shape, height, t.db_per_cut, t.db_per_meter)?;
        Ok(self.place(obstacle))
    }

    /// Adds an obstacle of a registered type given as a triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for an unregistered type and
    /// [`ConfigError::TooFewVertices`] for an empty mesh.
    pub fn add_obstacle_mesh(
        &mut self,
        id: &str,
        kind: &str,
        mesh: Vec<Triangle>,
    ) -> Result<ObstacleHandle> {
        let t = self.require_obstacle_type(kind)?;
        let obstacle = Obstacle::from_mesh(id, kind, mesh, t.db_per_cut, t.db_per_meter)?;
        Ok(self.place(obstacle))
    }

    fn place(&mut self, obstacle: Obstacle) -> ObstacleHandle {
        if obstacle.is_inner_wall() {
            debug!(id = obstacle.id(), "inner wall added");
            ObstacleHandle::InnerWall(self.inner_walls.add(obstacle))
        } else {
            ObstacleHandle::Outdoor(self.obstacles.add(obstacle))
        }
    }

    /// Removes an obstacle from whichever store holds it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`](crate::error::SceneError::EntityNotFound) for an unknown handle.
    pub fn remove_obstacle(&mut self, handle: ObstacleHandle) -> Result<Obstacle> {
        let removed = match handle {
            ObstacleHandle::Outdoor(id) => self.obstacles.remove(id),
            ObstacleHandle::InnerWall(id) => self.inner_walls.remove(id),
        };
        Ok(removed?)
    }

    /// Adds a junction or other floor outline of three or four corners.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] if neither `kind` nor
    /// [`GENERAL_FLOOR_TYPE`] is defined, and the corner count errors of
    /// [`FloorSegment::new`].
    pub fn add_floor_segment(
        &mut self,
        id: &str,
        shape: Vec<Point3>,
        kind: &str,
    ) -> Result<FloorSegmentId> {
        let factor = self.floor_factor(kind)?;
        Ok(self.floors.insert_junction(id, kind, factor, shape)?)
    }

    /// Adds the floor quads of a lane `lane_width` meters wide.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for an unknown floor type and
    /// [`ConfigError::TooFewVertices`] for a degenerate centerline.
    pub fn add_floor_lane(
        &mut self,
        id: &str,
        kind: &str,
        centerline: &[Point3],
        lane_width: f64,
    ) -> Result<Vec<FloorSegmentId>> {
        let factor = self.floor_factor(kind)?;
        Ok(self.floors.insert_lane(id, kind, factor, centerline, lane_width)?)
    }

    /// Removes a floor segment.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`](crate::error::SceneError::EntityNotFound) for an unknown id.
    pub fn remove_floor_segment(&mut self, id: FloorSegmentId) -> Result<FloorSegment> {
        Ok(self.floors.remove(id)?)
    }

    /// Adds a tunnel around `centerline` for a road `width` meters wide.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateId`](crate::error::SceneError::DuplicateId) for a known id and
    /// [`ConfigError::TooFewVertices`] for a degenerate centerline.
    pub fn add_tunnel(
        &mut self,
        id: &str,
        centerline: &[Point3],
        width: f64,
        spread: SpreadType,
    ) -> Result<()> {
        self.tunnels.add(id, centerline, width, spread)
    }

    /// Returns `true` if a floor rules out a ground reflection between the
    /// two positions. See [`FloorIndex::floors_between`].
    #[must_use]
    pub fn ground_floors_between(&self, sender: &Point3, receiver: &Point3) -> bool {
        self.floors.floors_between(sender, receiver)
    }

    /// Estimates the width of the street along `centerline` from the
    /// surrounding buildings.
    #[must_use]
    pub fn estimate_street_width(&self, centerline: &[Point3], max_piece_length: f64) -> Option<f64> {
        self.obstacles
            .estimate_street_width(centerline, max_piece_length)
    }

    #[must_use]
    pub fn obstacles(&self) -> &ObstacleStore {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut ObstacleStore {
        &mut self.obstacles
    }

    #[must_use]
    pub fn inner_walls(&self) -> &ObstacleStore {
        &self.inner_walls
    }

    pub fn inner_walls_mut(&mut self) -> &mut ObstacleStore {
        &mut self.inner_walls
    }

    #[must_use]
    pub fn floors(&self) -> &FloorIndex {
        &self.floors
    }

    pub fn floors_mut(&mut self) -> &mut FloorIndex {
        &mut self.floors
    }

    #[must_use]
    pub fn tunnels(&self) -> &TunnelRegistry {
        &self.tunnels
    }

    pub fn tunnels_mut(&mut self) -> &mut TunnelRegistry {
        &mut self.tunnels
    }
}
