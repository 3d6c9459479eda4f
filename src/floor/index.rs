use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use slotmap::SlotMap;
use tracing::{debug, trace};

use super::segment::FloorSegment;
use super::FloorSegmentId;
use crate::error::{ConfigError, SceneError};
use crate::geometry::Aabb;
use crate::math::Point3;
use crate::offset::lane_quads;
use crate::stats::db_to_linear;

/// Gain in dB for 0, 1, ... 6 crossed floors. More floors use the last entry.
pub const FLOOR_LOSS_DB: [f64; 7] = [0.0, -25.8, -37.5, -43.8, -47.7, -50.3, -52.1];

/// Crossings closer together than this, measured from the sender, are one
/// floor.
pub const DEFAULT_DEDUPE_TOLERANCE: f64 = 1.0;

type IndexedBox = GeomWithData<Rectangle<[f64; 3]>, FloorSegmentId>;

/// Spatial index of floor segments.
#[derive(Debug)]
pub struct FloorIndex {
    segments: SlotMap<FloorSegmentId, FloorSegment>,
    tree: RTree<IndexedBox>,
    noise: Option<Normal<f64>>,
    rng: StdRng,
    dedupe_tolerance: f64,
}

impl Default for FloorIndex {
    fn default() -> Self {
        Self {
            segments: SlotMap::with_key(),
            tree: RTree::new(),
            noise: None,
            rng: StdRng::seed_from_u64(0),
            dedupe_tolerance: DEFAULT_DEDUPE_TOLERANCE,
        }
    }
}

impl FloorIndex {
    /// Creates an empty index without attenuation noise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index.
    ///
    /// A positive `std_dev` adds zero-mean normal noise (in dB) to every
    /// non-zero floor loss, drawn from a generator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a negative or non-finite
    /// standard deviation or dedupe tolerance.
    pub fn with_settings(std_dev: f64, dedupe_tolerance: f64, seed: u64) -> Result<Self, ConfigError> {
        if !dedupe_tolerance.is_finite() || dedupe_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "floor_dedupe_tolerance",
                value: dedupe_tolerance,
                reason: "must be a finite, non-negative distance",
            });
        }
        let noise = if std_dev == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, std_dev).map_err(|_| ConfigError::InvalidValue {
                parameter: "floor_std_dev",
                value: std_dev,
                reason: "must be a finite, non-negative number",
            })?)
        };
        Ok(Self {
            noise,
            rng: StdRng::seed_from_u64(seed),
            dedupe_tolerance,
            ..Self::default()
        })
    }

    /// Adds a segment to the index.
    pub fn insert(&mut self, segment: FloorSegment) -> FloorSegmentId {
        let (min, max) = segment.bbox().to_arrays();
        let id = self.segments.insert(segment);
        self.tree
            .insert(GeomWithData::new(Rectangle::from_corners(min, max), id));
        id
    }

    /// Offsets a lane centerline into quads and adds each of them.
    ///
    /// The strip is twice `lane_width` wide.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] if the centerline has fewer
    /// than two distinct points.
    pub fn insert_lane(
        &mut self,
        id: &str,
        kind: &str,
        factor: f64,
        centerline: &[Point3],
        lane_width: f64,
    ) -> Result<Vec<FloorSegmentId>, ConfigError> {
        let quads = lane_quads(centerline, lane_width * 2.0);
        if quads.is_empty() {
            return Err(ConfigError::TooFewVertices {
                entity: id.to_owned(),
                min: 2,
                got: centerline.len(),
            });
        }
        let mut ids = Vec::with_capacity(quads.len());
        for (i, quad) in quads.into_iter().enumerate() {
            let segment = FloorSegment::new(format!("{id}#{i}"), kind, factor, quad.to_vec())?;
            ids.push(self.insert(segment));
        }
        debug!(lane = id, segments = ids.len(), "lane floor added");
        Ok(ids)
    }

    /// Adds a junction area given by its outline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewVertices`] or
    /// [`ConfigError::TooManyCorners`] for an outline that is not a triangle
    /// or quad.
    pub fn insert_junction(
        &mut self,
        id: &str,
        kind: &str,
        factor: f64,
        shape: Vec<Point3>,
    ) -> Result<FloorSegmentId, ConfigError> {
        Ok(self.insert(FloorSegment::new(id, kind, factor, shape)?))
    }

    /// Removes a segment.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] for an unknown id.
    pub fn remove(&mut self, id: FloorSegmentId) -> Result<FloorSegment, SceneError> {
        let segment = self
            .segments
            .remove(id)
            .ok_or_else(|| SceneError::EntityNotFound(format!("floor segment {id:?}")))?;
        let (min, max) = segment.bbox().to_arrays();
        self.tree
            .remove(&GeomWithData::new(Rectangle::from_corners(min, max), id));
        Ok(segment)
    }

    /// Returns the segment stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] for an unknown id.
    pub fn segment(&self, id: FloorSegmentId) -> Result<&FloorSegment, SceneError> {
        self.segments
            .get(id)
            .ok_or_else(|| SceneError::EntityNotFound(format!("floor segment {id:?}")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FloorSegmentId, &FloorSegment)> {
        self.segments.iter()
    }

    /// Distances from the sender of every distinct floor crossing.
    #[must_use]
    pub fn crossing_distances(&self, sender: &Point3, receiver: &Point3) -> Vec<f64> {
        let path = Aabb::from_corners(sender, receiver);
        let (min, max) = path.to_arrays();
        let mut distances: Vec<f64> = Vec::new();
        for entry in self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_corners(min, max))
        {
            let Some(segment) = self.segments.get(entry.data) else {
                continue;
            };
            let Some(hit) = segment.intersect(sender, receiver) else {
                continue;
            };
            let distance = (hit - sender).norm();
            if distances
                .iter()
                .all(|d| (distance - d).abs() >= self.dedupe_tolerance)
            {
                distances.push(distance);
            }
        }
        distances
    }

    /// Number of distinct floors between sender and receiver.
    #[must_use]
    pub fn crossings(&self, sender: &Point3, receiver: &Point3) -> usize {
        self.crossing_distances(sender, receiver).len()
    }

    /// Linear attenuation factor of the floors between sender and receiver.
    pub fn attenuate(&mut self, sender: &Point3, receiver: &Point3) -> f64 {
        let count = self.crossings(sender, receiver);
        let mut db = FLOOR_LOSS_DB[count.min(FLOOR_LOSS_DB.len() - 1)];
        if db != 0.0 {
            if let Some(noise) = self.noise {
                db += self.rng.sample(noise);
            }
        }
        trace!(count, db, "floor attenuation");
        db_to_linear(db)
    }

    /// Returns `true` if a floor rules out a ground reflection between the
    /// two positions.
    ///
    /// That is the case when an outline edge crosses the path in plan view
    /// above the line of sight, or when either endpoint stands within a
    /// floor's plan-view outline. The result does not depend on the order of
    /// the endpoints.
    #[must_use]
    pub fn floors_between(&self, sender: &Point3, receiver: &Point3) -> bool {
        let envelope = AABB::from_corners(
            [sender.x.min(receiver.x), sender.y.min(receiver.y), f64::MIN],
            [sender.x.max(receiver.x), sender.y.max(receiver.y), f64::MAX],
        );
        let candidates: Vec<&FloorSegment> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| self.segments.get(entry.data))
            .collect();
        candidates
            .iter()
            .any(|s| s.crosses_above_los(sender, receiver))
            || candidates
                .iter()
                .any(|s| s.footprint_contains(sender) || s.footprint_contains(receiver))
    }
}
