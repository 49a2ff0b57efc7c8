// Weighting & Normalization Primitives
//
// Shared by both verdict strategies: fixed modality weights, verdict
// thresholds, clamping helpers and a present-only weighted mean.

use crate::types::Modality;

/// Modality weights. Fixed, not learned; they sum to 1.0.
pub const TEXT_WEIGHT: f64 = 0.40;
pub const IMAGE_WEIGHT: f64 = 0.25;
pub const VIDEO_WEIGHT: f64 = 0.20;
pub const AUDIO_WEIGHT: f64 = 0.15;

/// A score above this dominates the verdict (TRUE / FALSE)
pub const DOMINANT_SCORE: f64 = 0.7;

/// The opposing score must stay below this for a TRUE / FALSE verdict
pub const OPPOSING_CEILING: f64 = 0.2;

/// Both scores above this means the evidence is mixed (PARTIALLY_TRUE)
pub const MIXED_FLOOR: f64 = 0.3;

pub fn modality_weight(modality: Modality) -> f64 {
    match modality {
        Modality::Text => TEXT_WEIGHT,
        Modality::Image => IMAGE_WEIGHT,
        Modality::Video => VIDEO_WEIGHT,
        Modality::Audio => AUDIO_WEIGHT,
    }
}

/// Clamp to [0, 1]; NaN becomes 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp to [0, 100]; NaN becomes 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Normalize an oracle confidence to 0..1
///
/// Oracles report either a 0..1 fraction or a 0..100 percentage; anything
/// above 1.0 is read as a percentage.
pub fn normalize_confidence(raw: f64) -> f64 {
    if raw > 1.0 {
        clamp_unit(raw / 100.0)
    } else {
        clamp_unit(raw)
    }
}

/// Fraction `part / total` clamped to [0, 1]; 0 when `total` is 0
pub fn fraction(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        clamp_unit(part as f64 / total as f64)
    }
}

/// Running weighted mean over present contributions only
///
/// Zero-weight contributions are ignored entirely, so absent evidence never
/// drags the mean toward zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMean {
    numerator: f64,
    denominator: f64,
}

impl WeightedMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64, weight: f64) {
        if weight > 0.0 && weight.is_finite() && value.is_finite() {
            self.numerator += value * weight;
            self.denominator += weight;
        }
    }

    /// `None` when nothing with positive weight was added
    pub fn value(&self) -> Option<f64> {
        if self.denominator > 0.0 {
            Some(self.numerator / self.denominator)
        } else {
            None
        }
    }
}

/// Weighted mean of `(value, weight)` pairs
pub fn weighted_mean<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut mean = WeightedMean::new();
    for (value, weight) in pairs {
        mean.add(value, weight);
    }
    mean.value()
}
