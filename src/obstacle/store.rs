use slotmap::SlotMap;
use tracing::{debug, trace};

use super::cache::AttenuationCache;
use super::data::Obstacle;
use super::grid::ObstacleGrid;
use super::ObstacleId;
use crate::error::{ConfigError, SceneError};
use crate::geometry::Aabb;
use crate::math::Point3;
use crate::stats::SignalStats;

/// Default number of cached sender/receiver pairs.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Below this running factor the path counts as fully blocked.
pub const NEGLIGIBLE_FACTOR: f64 = 1e-30;

/// Owns obstacles and answers shadowing queries along a line of sight.
#[derive(Debug, Clone)]
pub struct ObstacleStore {
    obstacles: SlotMap<ObstacleId, Obstacle>,
    grid: ObstacleGrid,
    cache: AttenuationCache,
}

impl Default for ObstacleStore {
    fn default() -> Self {
        Self::around(ObstacleGrid::default(), DEFAULT_CACHE_CAPACITY)
    }
}

impl ObstacleStore {
    /// Creates an empty store with the default grid and cache settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given grid cell size and cache
    /// capacity. A capacity of zero disables caching.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a cell size that is not a
    /// positive, finite number.
    pub fn with_settings(cell_size: f64, cache_capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self::around(ObstacleGrid::new(cell_size)?, cache_capacity))
    }

    /// An empty store on the same grid layout, with its own cache capacity.
    #[must_use]
    pub fn empty_like(&self, cache_capacity: usize) -> Self {
        Self::around(self.grid.empty_like(), cache_capacity)
    }

    fn around(grid: ObstacleGrid, cache_capacity: usize) -> Self {
        Self {
            obstacles: SlotMap::with_key(),
            grid,
            cache: AttenuationCache::new(cache_capacity),
        }
    }

    /// Inserts an obstacle and returns its ID. Invalidates cached results.
    pub fn add(&mut self, obstacle: Obstacle) -> ObstacleId {
        let bbox = *obstacle.bbox();
        let id = self.obstacles.insert(obstacle);
        self.grid.insert(id, &bbox);
        self.cache.clear();
        id
    }

    /// Removes an obstacle. Invalidates cached results.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] if the ID is not in the store.
    pub fn remove(&mut self, id: ObstacleId) -> Result<Obstacle, SceneError> {
        let obstacle = self
            .obstacles
            .remove(id)
            .ok_or_else(|| SceneError::EntityNotFound("obstacle".into()))?;
        self.grid.remove(id, obstacle.bbox());
        self.cache.clear();
        Ok(obstacle)
    }

    /// Returns the obstacle, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] if the ID is not in the store.
    pub fn obstacle(&self, id: ObstacleId) -> Result<&Obstacle, SceneError> {
        self.obstacles
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound("obstacle".into()))
    }

    /// Removes every obstacle.
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.grid.clear();
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObstacleId, &Obstacle)> {
        self.obstacles.iter()
    }

    /// Edge length of the grid cells.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.grid.cell_size()
    }

    /// Number of memoized results.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Shadowing along `sender -> receiver`, memoized per endpoint pair.
    pub fn attenuate(&mut self, sender: &Point3, receiver: &Point3) -> SignalStats {
        if let Some(stats) = self.cache.get(sender, receiver) {
            trace!("attenuation cache hit");
            return stats;
        }
        let stats = self.compute(sender, receiver);
        self.cache.insert(sender, receiver, stats);
        stats
    }

    /// Shadowing along `sender -> receiver` without touching the cache.
    ///
    /// Factors of all obstacles near the path are multiplied. Evaluation
    /// stops once the product drops below [`NEGLIGIBLE_FACTOR`].
    #[must_use]
    pub fn compute(&self, sender: &Point3, receiver: &Point3) -> SignalStats {
        let mut stats = SignalStats::clear((receiver - sender).norm());
        let path = Aabb::from_corners(sender, receiver);

        for id in self.grid.query(&path) {
            let Some(obstacle) = self.obstacles.get(id) else {
                continue;
            };
            if !obstacle.bbox().intersects_2d(&path) {
                continue;
            }

            let shadowing = obstacle.shadowing(sender, receiver);
            stats.factor *= shadowing.factor;
            stats.num_cuts = stats.num_cuts.saturating_add(shadowing.num_cuts);
            stats.fraction += shadowing.fraction;

            if stats.factor < NEGLIGIBLE_FACTOR {
                debug!(obstacle = obstacle.id(), "path fully blocked");
                break;
            }
        }
        stats
    }

    /// Obstacles whose grid cells and bounding boxes touch `bbox`.
    pub(crate) fn candidates(&self, bbox: &Aabb) -> impl Iterator<Item = &Obstacle> {
        let bbox = *bbox;
        self.grid
            .query(&bbox)
            .into_iter()
            .filter_map(|id| self.obstacles.get(id))
            .filter(move |o| o.bbox().intersects_2d(&bbox))
    }
}
