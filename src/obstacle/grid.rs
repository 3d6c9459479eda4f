use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use super::ObstacleId;
use crate::error::ConfigError;
use crate::geometry::Aabb;

/// Default edge length of a grid cell, in meters.
pub const DEFAULT_CELL_SIZE: f64 = 250.0;

/// Obstacles covering more cells than this are kept outside the grid and
/// returned by every query.
const MAX_COVERED_CELLS: u128 = 1 << 16;

type CellSpan = (RangeInclusive<usize>, RangeInclusive<usize>);

/// Uniform plan-view grid bucketing obstacles by bounding box.
///
/// Negative coordinates clamp to the first row or column.
#[derive(Debug, Clone)]
pub struct ObstacleGrid {
    cell_size: f64,
    cells: HashMap<(usize, usize), Vec<ObstacleId>>,
    oversized: Vec<ObstacleId>,
}

impl Default for ObstacleGrid {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }
}

impl ObstacleGrid {
    /// Creates an empty grid with square cells of `cell_size` meters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a cell size that is not a
    /// positive, finite number.
    pub fn new(cell_size: f64) -> Result<Self, ConfigError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "cell_size",
                value: cell_size,
                reason: "must be a positive, finite distance",
            });
        }
        Ok(Self {
            cell_size,
            ..Self::default()
        })
    }

    /// An empty grid with the same cell size.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            cell_size: self.cell_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Registers `id` in every cell its bounding box overlaps.
    pub fn insert(&mut self, id: ObstacleId, bbox: &Aabb) {
        let span = self.span(bbox);
        if span_len(&span) > MAX_COVERED_CELLS {
            self.oversized.push(id);
            return;
        }
        for cell in cells_in(span) {
            self.cells.entry(cell).or_default().push(id);
        }
    }

    /// Removes `id` from every cell its bounding box overlaps.
    pub fn remove(&mut self, id: ObstacleId, bbox: &Aabb) {
        let span = self.span(bbox);
        if span_len(&span) > MAX_COVERED_CELLS {
            self.oversized.retain(|&other| other != id);
            return;
        }
        for cell in cells_in(span) {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|&other| other != id);
                if bucket.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Distinct obstacles registered in the cells covering `bbox`, in key order.
    ///
    /// A query spanning more cells than are occupied scans the occupied ones.
    #[must_use]
    pub fn query(&self, bbox: &Aabb) -> BTreeSet<ObstacleId> {
        let span = self.span(bbox);
        let mut found: BTreeSet<ObstacleId> = self.oversized.iter().copied().collect();
        if span_len(&span) > self.cells.len() as u128 {
            let (rows, cols) = span;
            found.extend(
                self.cells
                    .iter()
                    .filter(|((row, col), _)| rows.contains(row) && cols.contains(col))
                    .flat_map(|(_, bucket)| bucket.iter().copied()),
            );
        } else {
            found.extend(
                cells_in(span)
                    .filter_map(|cell| self.cells.get(&cell))
                    .flatten()
                    .copied(),
            );
        }
        found
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
    }

    fn span(&self, bbox: &Aabb) -> CellSpan {
        (
            self.index(bbox.min.x)..=self.index(bbox.max.x),
            self.index(bbox.min.y)..=self.index(bbox.max.y),
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn index(&self, coord: f64) -> usize {
        let cell = (coord / self.cell_size).floor();
        if cell.is_finite() && cell > 0.0 {
            cell as usize
        } else {
            0
        }
    }
}

fn span_len((rows, cols): &CellSpan) -> u128 {
    let count = |r: &RangeInclusive<usize>| (*r.end() as u128).saturating_sub(*r.start() as u128) + 1;
    count(rows).saturating_mul(count(cols))
}

fn cells_in((rows, cols): CellSpan) -> impl Iterator<Item = (usize, usize)> {
    rows.flat_map(move |row| cols.clone().map(move |col| (row, col)))
}
