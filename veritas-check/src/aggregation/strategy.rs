// Verdict Strategies
//
// Two ways to turn a set of evidence items into an AggregateResult. Both
// consume the canonical EvidenceItem and share the weighting primitives.

use crate::aggregation::{adapters, canonical_order, modality_verdict, reasoning, source_verdict};
use crate::types::{
    AggregateResult, ConfidenceTier, EvidenceItem, EvidenceSummary, StrategyKind, Verdict,
};

/// Verdict strategy
///
/// Implementations are pure: the result depends only on the set of items,
/// never on their order or on any state outside the strategy.
pub trait VerdictStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Strategy name for logging
    fn name(&self) -> &'static str;

    fn evaluate(&self, items: &[EvidenceItem]) -> AggregateResult;
}

/// Per-modality weighting (text 0.40, image 0.25, video 0.20, audio 0.15)
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalityWeighted;

/// Credibility-and-confidence weighting over per-source analyses
#[derive(Debug, Clone, Copy)]
pub struct SourceWeighted {
    /// Confidence tier of the claim, used for the ±5 nudge
    pub tier: ConfidenceTier,
}

impl SourceWeighted {
    pub fn new(tier: ConfidenceTier) -> Self {
        Self { tier }
    }
}

fn split_summaries(items: &[EvidenceItem]) -> (Vec<EvidenceSummary>, Vec<EvidenceSummary>) {
    let (supporting, contradicting): (Vec<&EvidenceItem>, Vec<&EvidenceItem>) =
        items.iter().partition(|item| item.supports());
    (
        supporting.into_iter().map(EvidenceSummary::from).collect(),
        contradicting.into_iter().map(EvidenceSummary::from).collect(),
    )
}

impl VerdictStrategy for ModalityWeighted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ModalityWeighted
    }

    fn name(&self) -> &'static str {
        "modality_weighted"
    }

    fn evaluate(&self, items: &[EvidenceItem]) -> AggregateResult {
        let items = canonical_order(items);
        let breakdown = adapters::build_breakdown(&items);
        let verdict = modality_verdict::aggregate(&breakdown);
        let scores = modality_verdict::ModalityScores {
            support_score: verdict.support_score,
            manipulation_score: verdict.manipulation_score,
        };
        let (supporting, contradicting) = split_summaries(&items);

        AggregateResult {
            strategy: self.kind(),
            verdict: Verdict::Modality(verdict.verdict),
            confidence_score: verdict.confidence,
            truthfulness_score: None,
            support_score: verdict.support_score,
            manipulation_score: verdict.manipulation_score,
            breakdown,
            reasoning: reasoning::modality_reasoning(&breakdown, scores, &items),
            supporting,
            contradicting,
        }
    }
}

impl VerdictStrategy for SourceWeighted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SourceWeighted
    }

    fn name(&self) -> &'static str {
        "source_weighted"
    }

    fn evaluate(&self, items: &[EvidenceItem]) -> AggregateResult {
        let items: Vec<EvidenceItem> = canonical_order(items)
            .into_iter()
            .filter(|item| item.source().is_some())
            .collect();
        let breakdown = adapters::build_breakdown(&items);
        let scores = source_verdict::compute_scores(&items, self.tier);
        let verdict = source_verdict::decide_verdict(&scores);
        let support_score = scores.raw.map(|raw| raw / 100.0).unwrap_or(0.0);
        let manipulation_score = scores.raw.map(|raw| 1.0 - raw / 100.0).unwrap_or(0.0);
        let (supporting, contradicting) = split_summaries(&items);

        AggregateResult {
            strategy: self.kind(),
            verdict: Verdict::Source(verdict),
            confidence_score: scores.truthfulness / 100.0,
            truthfulness_score: Some(scores.truthfulness),
            support_score,
            manipulation_score,
            breakdown,
            reasoning: reasoning::source_reasoning(
                scores.supporting,
                scores.contradicting,
                scores.truthfulness,
                self.tier,
                &items,
            ),
            supporting,
            contradicting,
        }
    }
}
