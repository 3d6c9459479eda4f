//! Multi-level floors: parking decks, ramps and elevated lanes, indexed in an
//! R-tree and attenuating links that cross them.

mod index;
mod segment;

pub use index::{FloorIndex, DEFAULT_DEDUPE_TOLERANCE, FLOOR_LOSS_DB};
pub use segment::{FloorSegment, MAX_CORNERS};

slotmap::new_key_type! {
    /// Key of a [`FloorSegment`] inside a [`FloorIndex`].
    pub struct FloorSegmentId;
}
