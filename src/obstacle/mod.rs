//! Buildings, walls and other attenuating bodies, bucketed in a uniform
//! grid for line-of-sight queries.

mod cache;
mod data;
mod grid;
mod store;
mod street_width;

pub use cache::AttenuationCache;
pub use data::{Obstacle, Shadowing, INNER_WALL_TYPE};
pub use grid::{ObstacleGrid, DEFAULT_CELL_SIZE};
pub use store::{ObstacleStore, DEFAULT_CACHE_CAPACITY, NEGLIGIBLE_FACTOR};
pub use street_width::MAX_BUILDING_DISTANCE;

slotmap::new_key_type! {
    /// Key of an [`Obstacle`] inside an [`ObstacleStore`].
    pub struct ObstacleId;
}
