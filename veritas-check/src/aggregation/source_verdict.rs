// Source-Weighted Verdict
//
// truthfulness = Σ(weight_i × 100 · supports_i) / Σ(weight_i)
// weight_i     = credibility_i / 100 × confidence_i
// then nudged by the claim's confidence tier and clamped to [0, 100].

use crate::aggregation::weights::{clamp_percent, WeightedMean};
use crate::types::{ConfidenceTier, EvidenceItem, SourceVerdict};
use tracing::debug;

/// Truthfulness at or above this is LIKELY TRUE
pub const LIKELY_TRUE_FLOOR: f64 = 70.0;

/// Truthfulness at or above this (and below [`LIKELY_TRUE_FLOOR`]) is MIXED EVIDENCE
pub const MIXED_EVIDENCE_FLOOR: f64 = 40.0;

/// Points added for a high-confidence claim, subtracted for a low one
pub const TIER_NUDGE: f64 = 5.0;

/// Raw and final source-weighted scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceScores {
    /// Weighted mean before the tier nudge, 0..100. `None` when no source carried weight.
    pub raw: Option<f64>,
    /// Final score after nudge and clamp, 0..100
    pub truthfulness: f64,
    pub supporting: u32,
    pub contradicting: u32,
}

/// Weight of one source analysis: credibility (0..100) scaled by confidence (0..1)
pub fn source_weight(credibility_score: u8, confidence: f64) -> f64 {
    (credibility_score as f64 / 100.0) * confidence
}

pub fn tier_nudge(tier: ConfidenceTier) -> f64 {
    match tier {
        ConfidenceTier::High => TIER_NUDGE,
        ConfidenceTier::Medium => 0.0,
        ConfidenceTier::Low => -TIER_NUDGE,
    }
}

/// Apply the tier nudge and clamp to [0, 100]
pub fn nudge_and_clamp(raw: f64, tier: ConfidenceTier) -> f64 {
    clamp_percent(raw + tier_nudge(tier))
}

/// Compute truthfulness over the source-origin items
///
/// Validator items carry no publisher credibility and are skipped.
pub fn compute_scores(items: &[EvidenceItem], tier: ConfidenceTier) -> SourceScores {
    let mut mean = WeightedMean::new();
    let mut supporting = 0;
    let mut contradicting = 0;

    for item in items {
        let Some(source) = item.source() else {
            debug!(source_ref = %item.source_ref, "Skipping validator item in source-weighted scoring");
            continue;
        };

        if item.supports() {
            supporting += 1;
        } else {
            contradicting += 1;
        }

        let weight = source_weight(source.credibility_score, item.confidence);
        let value = if item.supports() { 100.0 } else { 0.0 };
        mean.add(value, weight);
    }

    let raw = mean.value();
    let truthfulness = match raw {
        Some(raw) => nudge_and_clamp(raw, tier),
        None => 0.0,
    };

    SourceScores {
        raw,
        truthfulness,
        supporting,
        contradicting,
    }
}

/// Map a 0..100 truthfulness score to its band
pub fn band(truthfulness: f64) -> SourceVerdict {
    if truthfulness >= LIKELY_TRUE_FLOOR {
        SourceVerdict::LikelyTrue
    } else if truthfulness >= MIXED_EVIDENCE_FLOOR {
        SourceVerdict::MixedEvidence
    } else {
        SourceVerdict::LikelyFalse
    }
}

/// Verdict for computed scores; UNVERIFIED when nothing carried weight
pub fn decide_verdict(scores: &SourceScores) -> SourceVerdict {
    match scores.raw {
        Some(_) => band(scores.truthfulness),
        None => SourceVerdict::Unverified,
    }
}
