use crate::math::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Smallest box containing all `points`, or `None` when empty.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self {
            min: *first,
            max: *first,
        };
        for p in iter {
            aabb.min = aabb.min.inf(p);
            aabb.max = aabb.max.sup(p);
        }
        Some(aabb)
    }

    /// Box spanned by two corners in any order.
    #[must_use]
    pub fn from_corners(a: &Point3, b: &Point3) -> Self {
        Self {
            min: a.inf(b),
            max: a.sup(b),
        }
    }

    /// Returns `true` if the XY projections of both boxes overlap.
    #[must_use]
    pub fn intersects_2d(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Corners as plain arrays, as spatial indices expect them.
    #[must_use]
    pub fn to_arrays(&self) -> ([f64; 3], [f64; 3]) {
        (
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.max.y, self.max.z],
        )
    }
}
