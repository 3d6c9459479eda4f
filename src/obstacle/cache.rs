use std::collections::HashMap;

use tracing::debug;

use crate::math::Point3;
use crate::stats::SignalStats;

type CacheKey = [u64; 6];

/// Bounded memo of shadowing results keyed by exact endpoint positions.
///
/// The whole cache is dropped when it is full. A capacity of zero disables
/// caching.
#[derive(Debug, Clone)]
pub struct AttenuationCache {
    capacity: usize,
    entries: HashMap<CacheKey, SignalStats>,
}

impl AttenuationCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, sender: &Point3, receiver: &Point3) -> Option<SignalStats> {
        self.entries.get(&key(sender, receiver)).copied()
    }

    pub fn insert(&mut self, sender: &Point3, receiver: &Point3, stats: SignalStats) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            debug!(capacity = self.capacity, "attenuation cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key(sender, receiver), stats);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(sender: &Point3, receiver: &Point3) -> CacheKey {
    [
        sender.x.to_bits(),
        sender.y.to_bits(),
        sender.z.to_bits(),
        receiver.x.to_bits(),
        receiver.y.to_bits(),
        receiver.z.to_bits(),
    ]
}
