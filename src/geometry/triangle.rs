use crate::math::intersect_3d::segment_triangle_intersect;
use crate::math::polygon_2d::triangle_area_2d;
use crate::math::Point3;

/// A triangle of a 3D obstacle mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle {
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Area of the triangle projected onto the XY plane.
    #[must_use]
    pub fn area_2d(&self) -> f64 {
        triangle_area_2d(&self.a, &self.b, &self.c)
    }

    /// Parameter along `start -> end` where the segment pierces this triangle.
    #[must_use]
    pub fn intersect_segment(&self, start: &Point3, end: &Point3) -> Option<f64> {
        segment_triangle_intersect(start, end, &self.a, &self.b, &self.c)
    }

    /// Same triangle with every vertex moved to height `z`.
    #[must_use]
    pub fn at_height(&self, z: f64) -> Self {
        let lift = |p: &Point3| Point3::new(p.x, p.y, z);
        Self::new(lift(&self.a), lift(&self.b), lift(&self.c))
    }
}
