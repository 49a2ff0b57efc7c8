//! Evidence Aggregator / Verdict Engine
//!
//! Turns a set of partially-failed evidence into one credibility verdict.
//! Two strategies are available through [`VerdictStrategy`]:
//!
//! - [`ModalityWeighted`]: fixed per-modality weights, TRUE / FALSE /
//!   PARTIALLY_TRUE / UNVERIFIED
//! - [`SourceWeighted`]: credibility-weighted truthfulness 0..100 with
//!   LIKELY TRUE / MIXED EVIDENCE / LIKELY FALSE bands
//!
//! Everything here is synchronous and infallible. Absent evidence is never
//! treated as refuting; it simply does not contribute.

pub mod adapters;
pub mod modality_verdict;
pub mod reasoning;
pub mod source_verdict;
pub mod strategy;
pub mod weights;

pub use modality_verdict::{aggregate, BreakdownVerdict, ModalityScores};
pub use strategy::{ModalityWeighted, SourceWeighted, VerdictStrategy};
pub use weights::{clamp_percent, clamp_unit};

use weights::normalize_confidence;
use crate::types::{AggregateResult, ConfidenceTier, EvidenceItem};
use std::cmp::Ordering;
use tracing::debug;

/// Sort items into a canonical order so results never depend on the order in
/// which parallel oracle calls resolved. Confidences are brought onto 0..1
/// here, so percent-scale items from callers are accepted too.
pub fn canonical_order(items: &[EvidenceItem]) -> Vec<EvidenceItem> {
    let mut sorted: Vec<EvidenceItem> = items
        .iter()
        .cloned()
        .map(|mut item| {
            item.confidence = normalize_confidence(item.confidence);
            item
        })
        .collect();
    sorted.sort_by(compare_items);
    sorted
}

fn compare_items(a: &EvidenceItem, b: &EvidenceItem) -> Ordering {
    a.modality()
        .cmp(&b.modality())
        .then_with(|| a.label().cmp(&b.label()))
        .then_with(|| a.source_ref.cmp(&b.source_ref))
        .then_with(|| a.is_valid.cmp(&b.is_valid))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
        .then_with(|| a.summary.cmp(&b.summary))
}

/// Modality-weighted aggregation over canonical evidence items
pub fn aggregate_evidence(items: &[EvidenceItem]) -> AggregateResult {
    run(&ModalityWeighted, items)
}

/// Source-weighted aggregation over per-source evidence items
pub fn aggregate_sources(items: &[EvidenceItem], tier: ConfidenceTier) -> AggregateResult {
    run(&SourceWeighted::new(tier), items)
}

/// Evaluate `items` with any strategy
pub fn run(strategy: &dyn VerdictStrategy, items: &[EvidenceItem]) -> AggregateResult {
    let result = strategy.evaluate(items);
    debug!(
        strategy = strategy.name(),
        items = items.len(),
        verdict = %result.verdict,
        confidence = result.confidence_score,
        "Aggregated evidence"
    );
    result
}
