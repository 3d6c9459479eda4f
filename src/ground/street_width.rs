use std::collections::HashMap;

use tracing::debug;

/// Streets up to this width see no ground reflection.
pub const NO_REFLECTION_WIDTH: f64 = 18.0;

/// Streets at least this wide see the full ground reflection.
pub const FULL_REFLECTION_WIDTH: f64 = 38.0;

/// Width assumed for roads without a known street width.
pub const DEFAULT_STREET_WIDTH: f64 = 120.0;

/// Weight of the ground reflection on a street `width` meters wide.
///
/// Narrow streets scatter too much for a clean ground reflection, so the
/// weight grows quadratically from 0 to 1 between
/// [`NO_REFLECTION_WIDTH`] and [`FULL_REFLECTION_WIDTH`].
#[must_use]
pub fn street_width_scaling(width: f64) -> f64 {
    if width <= NO_REFLECTION_WIDTH {
        0.0
    } else if width >= FULL_REFLECTION_WIDTH {
        1.0
    } else {
        ((width - NO_REFLECTION_WIDTH) / (FULL_REFLECTION_WIDTH - NO_REFLECTION_WIDTH)).powi(2)
    }
}

/// Street widths per road, resolved once.
///
/// Call [`reset`](Self::reset) when the road network changes.
#[derive(Debug, Default)]
pub struct StreetWidthMemo {
    widths: HashMap<String, f64>,
}

impl StreetWidthMemo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of `road`, remembered from the first lookup.
    ///
    /// A missing or zero `known` width falls back to
    /// [`DEFAULT_STREET_WIDTH`].
    pub fn width(&mut self, road: &str, known: Option<f64>) -> f64 {
        if let Some(width) = self.widths.get(road) {
            return *width;
        }
        let width = match known {
            Some(w) if w > 0.0 => w,
            _ => {
                debug!(road, "no street width known, assuming {DEFAULT_STREET_WIDTH} m");
                DEFAULT_STREET_WIDTH
            }
        };
        self.widths.insert(road.to_owned(), width);
        width
    }

    /// Ground reflection weight of a link, decided by the narrower street.
    pub fn scaling(
        &mut self,
        sender_road: (&str, Option<f64>),
        receiver_road: (&str, Option<f64>),
    ) -> f64 {
        let tx = self.width(sender_road.0, sender_road.1);
        let rx = self.width(receiver_road.0, receiver_road.1);
        street_width_scaling(tx.min(rx))
    }

    /// Forgets every remembered width.
    pub fn reset(&mut self) {
        self.widths.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}
