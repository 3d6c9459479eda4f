use tracing::warn;

use crate::error::ConfigError;
use crate::geometry::{Aabb, Triangle};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::polygon_2d::point_in_polygon_2d;
use crate::math::Point3;
use crate::stats::db_loss_to_linear;
use crate::triangulation::TriangulatePolygon;

/// Obstacle type whose members shadow only garage-internal links.
pub const INNER_WALL_TYPE: &str = "innerWall";

/// Intersection parameters closer than this are the same crossing.
const CROSSING_EPSILON: f64 = 1e-9;

/// Shadowing caused by a single obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadowing {
    /// Linear attenuation factor.
    pub factor: f64,
    /// Distinct boundary crossings.
    pub num_cuts: u32,
    /// Fraction of the path inside the obstacle.
    pub fraction: f64,
}

impl Shadowing {
    const NONE: Self = Self {
        factor: 1.0,
        num_cuts: 0,
        fraction: 0.0,
    };
}

/// A building, wall or other attenuating body.
///
/// Obstacles with zero height are extruded infinitely and tested in plan
/// view. Obstacles with a height carry a triangle mesh of their walls and
/// caps.
#[derive(Debug, Clone)]
pub struct Obstacle {
    id: String,
    kind: String,
    attenuation_per_cut: f64,
    attenuation_per_meter: f64,
    shape: Vec<Point3>,
    height: f64,
    mesh: Vec<Triangle>,
    bbox: Aabb,
}

impl Obstacle {
    /// Creates an obstacle from its footprint.
    ///
    /// A two-vertex shape is a single wall segment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] for fewer than two vertices
    /// and [`ConfigError::InvalidValue`] for a negative or non-finite height.
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        shape: Vec<Point3>,
        height: f64,
        attenuation_per_cut: f64,
        attenuation_per_meter: f64,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        if !height.is_finite() || height < 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "height",
                value: height,
                reason: "must be a finite, non-negative number",
            });
        }
        let Some(footprint) = Aabb::from_points(&shape).filter(|_| shape.len() >= 2) else {
            return Err(ConfigError::TooFewVertices {
                entity: id,
                min: 2,
                got: shape.len(),
            });
        };
        let mesh = if height > 0.0 {
            extrude_mesh(&shape, height)
        } else {
            Vec::new()
        };
        let bbox = Aabb {
            min: Point3::new(footprint.min.x, footprint.min.y, 0.0),
            max: Point3::new(footprint.max.x, footprint.max.y, height),
        };
        Ok(Self {
            id,
            kind: kind.into(),
            attenuation_per_cut,
            attenuation_per_meter,
            shape,
            height,
            mesh,
            bbox,
        })
    }

    /// Creates an obstacle from an explicit triangle mesh.
    ///
    /// Such obstacles have no footprint, so no endpoint is ever inside them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] for an empty mesh.
    pub fn from_mesh(
        id: impl Into<String>,
        kind: impl Into<String>,
        mesh: Vec<Triangle>,
        attenuation_per_cut: f64,
        attenuation_per_meter: f64,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let Some(bbox) = Aabb::from_points(mesh.iter().flat_map(|t| [&t.a, &t.b, &t.c])) else {
            return Err(ConfigError::TooFewVertices {
                entity: id,
                min: 3,
                got: 0,
            });
        };
        Ok(Self {
            id,
            kind: kind.into(),
            attenuation_per_cut,
            attenuation_per_meter,
            shape: Vec::new(),
            height: bbox.max.z,
            mesh,
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

    #[must_use]
    pub fn shape(&self) -> &[Point3] {
        &self.shape
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn mesh(&self) -> &[Triangle] {
        &self.mesh
    }

    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    #[must_use]
    pub fn attenuation_per_cut(&self) -> f64 {
        self.attenuation_per_cut
    }

    #[must_use]
    pub fn attenuation_per_meter(&self) -> f64 {
        self.attenuation_per_meter
    }

    #[must_use]
    pub fn is_inner_wall(&self) -> bool {
        self.kind == INNER_WALL_TYPE
    }

    /// Whether `point` lies inside the footprint, and below the roof for
    /// obstacles with a height.
    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        if self.height > 0.0 && (point.z < 0.0 || point.z > self.height) {
            return false;
        }
        point_in_polygon_2d(point, &self.shape)
    }

    /// Sorted parameters along `sender -> receiver` where the path crosses
    /// the obstacle boundary.
    #[must_use]
    pub fn intersections(&self, sender: &Point3, receiver: &Point3) -> Vec<f64> {
        let at_ground = sender.z <= 0.0 && receiver.z <= 0.0;
        let mut hits: Vec<f64> = if self.mesh.is_empty() || (at_ground && !self.shape.is_empty()) {
            self.edges()
                .filter_map(|(a, b)| segment_segment_intersect_2d(sender, receiver, a, b))
                .map(|(t, _)| t)
                .collect()
        } else {
            self.mesh
                .iter()
                .filter_map(|tri| tri.intersect_segment(sender, receiver))
                .collect()
        };
        hits.sort_by(f64::total_cmp);
        hits.dedup_by(|a, b| (*a - *b).abs() < CROSSING_EPSILON);
        hits
    }

    /// Attenuation of the path `sender -> receiver` by this obstacle.
    #[must_use]
    pub fn shadowing(&self, sender: &Point3, receiver: &Point3) -> Shadowing {
        if self.attenuation_per_cut == 0.0 && self.attenuation_per_meter == 0.0 {
            return Shadowing::NONE;
        }

        let mut crossings = self.intersections(sender, receiver);
        let sender_inside = self.contains_point(sender);
        let receiver_inside = self.contains_point(receiver);
        if crossings.is_empty() && !sender_inside && !receiver_inside {
            return Shadowing::NONE;
        }

        let num_cuts = u32::try_from(crossings.len()).unwrap_or(u32::MAX);
        if sender_inside {
            crossings.insert(0, 0.0);
        }
        if receiver_inside {
            crossings.push(1.0);
        }

        // A wall segment has no interior to travel through.
        let fraction = if self.shape.len() == 2 {
            0.0
        } else if crossings.len() % 2 != 0 {
            warn!(
                obstacle = %self.id,
                crossings = crossings.len(),
                "odd number of boundary crossings, ignoring distance in matter"
            );
            0.0
        } else {
            crossings.chunks_exact(2).map(|pair| pair[1] - pair[0]).sum()
        };

        let distance = (receiver - sender).norm();
        let db = self.attenuation_per_cut * f64::from(num_cuts)
            + self.attenuation_per_meter * fraction * distance;
        Shadowing {
            factor: db_loss_to_linear(db),
            num_cuts,
            fraction,
        }
    }

    /// Footprint edges. A two-vertex wall yields a single edge.
    fn edges(&self) -> impl Iterator<Item = (&Point3, &Point3)> {
        let n = self.shape.len();
        let count = if n == 2 { 1 } else { n };
        (0..count).map(move |i| (&self.shape[i], &self.shape[(i + 1) % n]))
    }
}

/// Walls as two triangles per footprint edge, plus floor and roof caps.
fn extrude_mesh(shape: &[Point3], height: f64) -> Vec<Triangle> {
    let ground = |p: &Point3| Point3::new(p.x, p.y, 0.0);
    let roof = |p: &Point3| Point3::new(p.x, p.y, height);

    let n = shape.len();
    let edge_count = if n == 2 { 1 } else { n };
    let mut mesh = Vec::with_capacity(edge_count * 2 + n.saturating_sub(2) * 2);
    for i in 0..edge_count {
        let a = &shape[i];
        let b = &shape[(i + 1) % n];
        mesh.push(Triangle::new(ground(a), roof(a), roof(b)));
        mesh.push(Triangle::new(ground(b), roof(b), ground(a)));
    }

    if n >= 3 {
        for tri in TriangulatePolygon::new(shape.to_vec()).execute() {
            mesh.push(tri.at_height(0.0));
            mesh.push(tri.at_height(height));
        }
    }
    mesh
}
