use std::fmt::Debug;

use crate::math::Point3;

/// Terrain height lookup by geographic coordinates.
pub trait ElevationSource: Debug {
    /// Height of the ground at (`lon`, `lat`), in meters.
    fn elevation(&self, lon: f64, lat: f64) -> f64;
}

/// Maps scene positions to the coordinates an [`ElevationSource`] expects.
pub trait GeoProjection: Debug {
    /// Returns `(lon, lat)` of the plan-view position of `point`.
    fn to_geo(&self, point: &Point3) -> (f64, f64);
}

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub height: f64,
}

impl ElevationSource for FlatTerrain {
    fn elevation(&self, _lon: f64, _lat: f64) -> f64 {
        self.height
    }
}

/// Height raster on a regular grid, bilinearly interpolated.
///
/// Positions outside the raster take the height of the nearest edge cell.
#[derive(Debug, Clone)]
pub struct RasterTerrain {
    origin: (f64, f64),
    cell_size: f64,
    columns: usize,
    heights: Vec<f64>,
}

impl RasterTerrain {
    /// Creates a raster whose first sample sits at `origin`.
    ///
    /// `heights` is row-major, `columns` samples per row. Returns `None` if
    /// the sample count is not a positive multiple of `columns` or the cell
    /// size is not positive.
    #[must_use]
    pub fn new(origin: (f64, f64), cell_size: f64, columns: usize, heights: Vec<f64>) -> Option<Self> {
        if columns == 0 || heights.is_empty() || heights.len() % columns != 0 || cell_size <= 0.0 {
            return None;
        }
        Some(Self {
            origin,
            cell_size,
            columns,
            heights,
        })
    }

    fn rows(&self) -> usize {
        self.heights.len() / self.columns
    }

    fn sample(&self, column: usize, row: usize) -> f64 {
        self.heights[row * self.columns + column]
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cell_coordinate(value: f64, count: usize) -> (usize, usize, f64) {
    let max = (count - 1) as f64;
    let v = value.clamp(0.0, max);
    let lower = v.floor();
    let upper = (lower + 1.0).min(max);
    (lower as usize, upper as usize, v - lower)
}

impl ElevationSource for RasterTerrain {
    fn elevation(&self, lon: f64, lat: f64) -> f64 {
        let (c0, c1, fx) = cell_coordinate((lon - self.origin.0) / self.cell_size, self.columns);
        let (r0, r1, fy) = cell_coordinate((lat - self.origin.1) / self.cell_size, self.rows());
        let bottom = self.sample(c0, r0) * (1.0 - fx) + self.sample(c1, r0) * fx;
        let top = self.sample(c0, r1) * (1.0 - fx) + self.sample(c1, r1) * fx;
        bottom * (1.0 - fy) + top * fy
    }
}

/// Uses the scene's plan-view coordinates directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarProjection;

impl GeoProjection for PlanarProjection {
    fn to_geo(&self, point: &Point3) -> (f64, f64) {
        (point.x, point.y)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain() {
        let t = FlatTerrain { height: 12.5 };
        assert!((t.elevation(3.0, -7.0) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn raster_interpolates() {
        // 2 x 2 samples, 10 m cells: heights rise along x only.
        let t = RasterTerrain::new((0.0, 0.0), 10.0, 2, vec![0.0, 4.0, 0.0, 4.0]).unwrap();
        assert!((t.elevation(5.0, 5.0) - 2.0).abs() < 1e-12);
        assert!((t.elevation(10.0, 0.0) - 4.0).abs() < 1e-12);
        // Clamped outside the raster.
        assert!((t.elevation(-50.0, 3.0)).abs() < 1e-12);
        assert!((t.elevation(50.0, 30.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn raster_rejects_bad_shapes() {
        assert!(RasterTerrain::new((0.0, 0.0), 10.0, 0, vec![1.0]).is_none());
        assert!(RasterTerrain::new((0.0, 0.0), 10.0, 2, vec![1.0, 2.0, 3.0]).is_none());
        assert!(RasterTerrain::new((0.0, 0.0), 0.0, 1, vec![1.0]).is_none());
    }

    #[test]
    fn planar_projection_is_identity() {
        let (lon, lat) = PlanarProjection.to_geo(&Point3::new(1.0, 2.0, 3.0));
        assert!((lon - 1.0).abs() < f64::EPSILON && (lat - 2.0).abs() < f64::EPSILON);
    }
}
