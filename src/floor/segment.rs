use crate::error::ConfigError;
use crate::geometry::Aabb;
use crate::math::intersect_2d::{lerp, segment_segment_intersect_2d};
use crate::math::intersect_3d::segment_plane_intersect;
use crate::math::polygon_2d::{convex_contains_2d, point_in_polygon_2d};
use crate::math::{Point3, TOLERANCE};

/// Most corners a floor segment may have.
pub const MAX_CORNERS: usize = 4;

/// A convex, possibly sloped slab: a parking deck, a ramp or a bridge lane.
#[derive(Debug, Clone)]
pub struct FloorSegment {
    id: String,
    kind: String,
    factor: f64,
    corners: Vec<Point3>,
    bbox: Aabb,
}

impl FloorSegment {
    /// Creates a floor segment from three or four corners.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] for fewer than three corners
    /// and [`ConfigError::TooManyCorners`] for more than four.
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        factor: f64,
        corners: Vec<Point3>,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        if corners.len() > MAX_CORNERS {
            return Err(ConfigError::TooManyCorners {
                entity: id,
                got: corners.len(),
            });
        }
        let Some(bbox) = Aabb::from_points(&corners).filter(|_| corners.len() >= 3) else {
            return Err(ConfigError::TooFewVertices {
                entity: id,
                min: 3,
                got: corners.len(),
            });
        };
        Ok(Self {
            id,
            kind: kind.into(),
            factor,
            corners,
            bbox,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Type-specific attenuation factor, informational only.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    #[must_use]
    pub fn corners(&self) -> &[Point3] {
        &self.corners
    }

    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Point where the segment `sender -> receiver` pierces this slab.
    ///
    /// The slab plane runs through the first, second and last corner.
    #[must_use]
    pub fn intersect(&self, sender: &Point3, receiver: &Point3) -> Option<Point3> {
        let origin = &self.corners[0];
        let last = &self.corners[self.corners.len() - 1];
        let normal = (self.corners[1] - origin).cross(&(last - origin));
        let t = segment_plane_intersect(sender, receiver, origin, &normal)?;
        let hit = lerp(sender, receiver, t);
        convex_contains_2d(&hit, &self.corners).then_some(hit)
    }

    /// Returns `true` if an outline edge crosses the path in plan view at a
    /// height above the line of sight.
    #[must_use]
    pub fn crosses_above_los(&self, sender: &Point3, receiver: &Point3) -> bool {
        let n = self.corners.len();
        (0..n).any(|i| {
            let (a, b) = (&self.corners[i], &self.corners[(i + 1) % n]);
            segment_segment_intersect_2d(sender, receiver, a, b).is_some_and(|(t, u)| {
                let floor_z = a.z + (b.z - a.z) * u;
                let los_z = sender.z + (receiver.z - sender.z) * t;
                floor_z > los_z + TOLERANCE
            })
        })
    }

    /// Returns `true` if `point` lies within the plan-view outline.
    #[must_use]
    pub fn footprint_contains(&self, point: &Point3) -> bool {
        point_in_polygon_2d(point, &self.corners)
    }
}
