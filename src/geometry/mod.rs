mod aabb;
mod triangle;

pub use aabb::Aabb;
pub use triangle::Triangle;
