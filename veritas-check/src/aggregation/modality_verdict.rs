// Modality-Weighted Verdict
//
// supportScore = Σ(supportFraction_m × w_m) / Σ(w_m for present m)
// manipulationScore likewise with refute fractions.
// Modalities with total 0 are absent: excluded from numerator and denominator.

use crate::aggregation::weights::{
    fraction, modality_weight, WeightedMean, DOMINANT_SCORE, MIXED_FLOOR, OPPOSING_CEILING,
};
use crate::aggregation::{clamp_unit, reasoning};
use crate::types::{Modality, ModalityBreakdown, ModalityVerdict};
use serde::{Deserialize, Serialize};

/// Weighted support and manipulation scores for a breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityScores {
    pub support_score: f64,
    pub manipulation_score: f64,
}

/// Result of [`aggregate`] over a raw breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownVerdict {
    pub verdict: ModalityVerdict,
    /// 0..1
    pub confidence: f64,
    pub support_score: f64,
    pub manipulation_score: f64,
    pub reasoning: String,
}

/// Compute the present-only weighted scores
///
/// Both scores are 0 when no modality has evidence.
pub fn compute_scores(breakdown: &ModalityBreakdown) -> ModalityScores {
    let mut support = WeightedMean::new();
    let mut manipulation = WeightedMean::new();

    for modality in Modality::ALL {
        let tally = breakdown.get(modality);
        if !tally.is_present() {
            continue;
        }
        let weight = modality_weight(modality);
        support.add(fraction(tally.supporting, tally.total), weight);
        manipulation.add(fraction(tally.refuting, tally.total), weight);
    }

    ModalityScores {
        support_score: clamp_unit(support.value().unwrap_or(0.0)),
        manipulation_score: clamp_unit(manipulation.value().unwrap_or(0.0)),
    }
}

/// Verdict decision table, first match wins
///
/// 1. support > 0.7 and manipulation < 0.2 → TRUE, confidence = support
/// 2. manipulation > 0.7 and support < 0.2 → FALSE, confidence = manipulation
/// 3. support > 0.3 and manipulation > 0.3 → PARTIALLY_TRUE, confidence = max(support, 1 - manipulation)
/// 4. otherwise → UNVERIFIED, confidence = min(support, 1 - manipulation)
pub fn decide_verdict(scores: ModalityScores) -> (ModalityVerdict, f64) {
    let ModalityScores {
        support_score: support,
        manipulation_score: manipulation,
    } = scores;

    let (verdict, confidence) = if support > DOMINANT_SCORE && manipulation < OPPOSING_CEILING {
        (ModalityVerdict::True, support)
    } else if manipulation > DOMINANT_SCORE && support < OPPOSING_CEILING {
        (ModalityVerdict::False, manipulation)
    } else if support > MIXED_FLOOR && manipulation > MIXED_FLOOR {
        (ModalityVerdict::PartiallyTrue, support.max(1.0 - manipulation))
    } else {
        (ModalityVerdict::Unverified, support.min(1.0 - manipulation))
    };

    (verdict, clamp_unit(confidence))
}

/// Aggregate a modality breakdown into a verdict
///
/// Pure function of the four support/refute/total counts. No evidence at all
/// yields UNVERIFIED with confidence 0.
pub fn aggregate(breakdown: &ModalityBreakdown) -> BreakdownVerdict {
    let scores = compute_scores(breakdown);
    let (verdict, confidence) = if breakdown.total_items() == 0 {
        (ModalityVerdict::Unverified, 0.0)
    } else {
        decide_verdict(scores)
    };

    BreakdownVerdict {
        verdict,
        confidence,
        support_score: scores.support_score,
        manipulation_score: scores.manipulation_score,
        reasoning: reasoning::modality_reasoning(breakdown, scores, &[]),
    }
}
