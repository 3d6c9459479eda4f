use super::models::ModelKind;
use crate::stats::SignalStats;

/// Receiver of a transmission's attenuation, implemented by the host's
/// signal representation.
pub trait SignalSink {
    /// Records one multiplicative contribution.
    fn record_attenuation(&mut self, kind: ModelKind, factor: f64);

    /// Records the obstacle diagnostics of an outdoor link.
    fn record_stats(&mut self, stats: SignalStats);
}

/// Sink that keeps everything it is given, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    pub attenuations: Vec<(ModelKind, f64)>,
    pub stats: Vec<SignalStats>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Product of every recorded factor.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.attenuations.iter().map(|(_, f)| f).product()
    }
}

impl SignalSink for RecordingSink {
    fn record_attenuation(&mut self, kind: ModelKind, factor: f64) {
        self.attenuations.push((kind, factor));
    }

    fn record_stats(&mut self, stats: SignalStats) {
        self.stats.push(stats);
    }
}
