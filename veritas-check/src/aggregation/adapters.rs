// Evidence Adapters
//
// Convert the two oracle-native shapes (validator output, per-source analysis)
// into the canonical EvidenceItem, and tally items into a modality breakdown.

use crate::aggregation::weights::{clamp_unit, normalize_confidence, WeightedMean};
use crate::analysis::SourceAnalysis;
use crate::oracles::ValidatorOutput;
use crate::types::{EvidenceItem, EvidenceOrigin, Modality, ModalityBreakdown, SourceRef};

/// Adapt a validator oracle response for `source_ref`
///
/// Validators report confidence on either scale; it is normalized to 0..1.
pub fn from_validator(modality: Modality, source_ref: &str, output: &ValidatorOutput) -> EvidenceItem {
    EvidenceItem {
        origin: EvidenceOrigin::Validator { modality },
        source_ref: source_ref.to_string(),
        is_valid: output.is_valid,
        confidence: normalize_confidence(output.confidence),
        forensics: output.forensics.clone(),
        summary: output.summary.clone(),
        reasoning: output.reasoning.clone(),
    }
}

/// Adapt a per-source analysis (confidence 0..100) for `source`
pub fn from_source_analysis(source: &SourceRef, analysis: &SourceAnalysis) -> EvidenceItem {
    EvidenceItem {
        origin: EvidenceOrigin::Source {
            source: source.clone(),
        },
        source_ref: source.url.clone(),
        is_valid: analysis.supports,
        confidence: clamp_unit(analysis.confidence as f64 / 100.0),
        forensics: Default::default(),
        summary: Some(analysis.summary.clone()),
        reasoning: Some(analysis.reasoning.clone()),
    }
}

/// Tally items per modality
///
/// Each item lands in exactly one of supporting/refuting, so
/// `supporting + refuting == total` for every modality.
pub fn build_breakdown(items: &[EvidenceItem]) -> ModalityBreakdown {
    let mut breakdown = ModalityBreakdown::default();
    let mut confidences: [WeightedMean; 4] = Default::default();

    for item in items {
        let modality = item.modality();
        let tally = breakdown.get_mut(modality);
        tally.total += 1;
        if item.refutes() {
            tally.refuting += 1;
        } else {
            tally.supporting += 1;
        }
        confidences[modality_index(modality)].add(item.confidence, 1.0);
    }

    for modality in Modality::ALL {
        breakdown.get_mut(modality).average_confidence =
            clamp_unit(confidences[modality_index(modality)].value().unwrap_or(0.0));
    }

    breakdown
}

fn modality_index(modality: Modality) -> usize {
    match modality {
        Modality::Text => 0,
        Modality::Image => 1,
        Modality::Video => 2,
        Modality::Audio => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Forensics, SourceCategory};

    fn reuters() -> SourceRef {
        SourceRef {
            url: "https://www.reuters.com/fact-check/water".to_string(),
            title: "Fact Check: water does not cure COVID-19".to_string(),
            publisher: "Reuters".to_string(),
            credibility_score: 92,
            category: SourceCategory::NewsAgency,
        }
    }

    #[test]
    fn test_from_source_analysis_scales_confidence() {
        let analysis = SourceAnalysis {
            supports: false,
            confidence: 85,
            summary: "Debunks the claim".to_string(),
            reasoning: "No clinical evidence".to_string(),
            used_fallback: false,
        };
        let item = from_source_analysis(&reuters(), &analysis);
        assert!((item.confidence - 0.85).abs() < 1e-12);
        assert!(item.refutes());
        assert_eq!(item.modality(), Modality::Text);
        assert_eq!(item.source_ref, "https://www.reuters.com/fact-check/water");
    }

    #[test]
    fn test_from_validator_reads_percent_confidence() {
        let output = ValidatorOutput {
            is_valid: true,
            confidence: 72.0,
            forensics: Forensics {
                is_deepfake: Some(true),
                ..Default::default()
            },
            summary: None,
            reasoning: None,
        };
        let item = from_validator(Modality::Video, "https://video.example/v1", &output);
        assert!((item.confidence - 0.72).abs() < 1e-12);
        assert!(item.refutes(), "Deepfake counts against the claim");
    }

    #[test]
    fn test_breakdown_counts_and_average() {
        let output = |is_valid: bool, confidence: f64| ValidatorOutput {
            is_valid,
            confidence,
            forensics: Forensics::default(),
            summary: None,
            reasoning: None,
        };
        let items = vec![
            from_validator(Modality::Image, "a", &output(true, 0.8)),
            from_validator(Modality::Image, "b", &output(false, 0.4)),
            from_validator(Modality::Audio, "c", &output(true, 0.9)),
        ];
        let breakdown = build_breakdown(&items);
        assert_eq!(breakdown.image.total, 2);
        assert_eq!(breakdown.image.supporting, 1);
        assert_eq!(breakdown.image.refuting, 1);
        assert!((breakdown.image.average_confidence - 0.6).abs() < 1e-12);
        assert_eq!(breakdown.audio.total, 1);
        assert!(!breakdown.text.is_present());
        assert_eq!(breakdown.text.average_confidence, 0.0);
    }
}
