/// Diagnostics of one shadowing query along the line of sight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStats {
    /// Number of obstacle boundary crossings.
    pub num_cuts: u32,
    /// Sender-receiver distance in meters.
    pub distance: f64,
    /// Summed fraction of the path spent inside obstacles.
    pub fraction: f64,
    /// Linear attenuation factor.
    pub factor: f64,
}

impl SignalStats {
    /// Stats of an unobstructed path of length `distance`.
    #[must_use]
    pub fn clear(distance: f64) -> Self {
        Self {
            num_cuts: 0,
            distance,
            fraction: 0.0,
            factor: 1.0,
        }
    }

    /// Length of the path spent inside matter, in meters.
    #[must_use]
    pub fn distance_in_matter(&self) -> f64 {
        self.fraction * self.distance
    }
}

impl Default for SignalStats {
    fn default() -> Self {
        Self::clear(0.0)
    }
}

/// Converts an attenuation in dB (positive = loss) to a linear factor.
#[must_use]
pub fn db_loss_to_linear(db: f64) -> f64 {
    10f64.powf(-db / 10.0)
}

/// Converts a gain in dB (negative = loss) to a linear factor.
#[must_use]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}
