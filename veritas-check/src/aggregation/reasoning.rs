// Reasoning Templates
//
// Verdict explanations are templated from counts and source analyses only,
// never free text.

use crate::aggregation::modality_verdict::ModalityScores;
use crate::types::{ConfidenceTier, EvidenceItem, ModalityBreakdown};

fn plural(count: u32, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// `"<publisher>: Supports|Contradicts (<confidence>% confidence)"` per source item,
/// joined with `"; "`. `None` when no item came from a source analysis.
pub fn source_analysis_list(items: &[EvidenceItem]) -> Option<String> {
    let lines: Vec<String> = items
        .iter()
        .filter_map(|item| {
            item.source().map(|source| {
                format!(
                    "{}: {} ({}% confidence)",
                    source.publisher,
                    if item.supports() { "Supports" } else { "Contradicts" },
                    (item.confidence * 100.0).round() as u32
                )
            })
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("; "))
    }
}

fn append_sources(mut text: String, items: &[EvidenceItem]) -> String {
    if let Some(list) = source_analysis_list(items) {
        text.push_str(" Source analyses: ");
        text.push_str(&list);
    }
    text
}

/// Reasoning for the modality-weighted strategy
pub fn modality_reasoning(
    breakdown: &ModalityBreakdown,
    scores: ModalityScores,
    items: &[EvidenceItem],
) -> String {
    let total = breakdown.total_items();
    if total == 0 {
        return append_sources(
            "No evidence was available from any modality; the claim could not be verified."
                .to_string(),
            items,
        );
    }

    let supporting = breakdown.total_supporting();
    let contradicting = breakdown.total_refuting();
    let modalities: Vec<&str> = breakdown
        .present_modalities()
        .iter()
        .map(|m| m.as_str())
        .collect();

    let text = format!(
        "{} supporting and {} contradicting {} out of {} across {} {} ({}). Support score {:.0}%, manipulation score {:.0}%.",
        supporting,
        contradicting,
        plural(total, "source", "sources"),
        total,
        modalities.len(),
        plural(modalities.len() as u32, "modality", "modalities"),
        modalities.join(", "),
        scores.support_score * 100.0,
        scores.manipulation_score * 100.0,
    );
    append_sources(text, items)
}

/// Reasoning for the source-weighted strategy
pub fn source_reasoning(
    supporting: u32,
    contradicting: u32,
    truthfulness: f64,
    tier: ConfidenceTier,
    items: &[EvidenceItem],
) -> String {
    if supporting + contradicting == 0 {
        return "No source analyses were available; the claim could not be verified.".to_string();
    }

    let text = format!(
        "{} {} {} the claim and {} {} it. Credibility-weighted truthfulness {:.0}/100 (claim confidence {}).",
        supporting,
        plural(supporting, "source", "sources"),
        plural(supporting, "supports", "support"),
        contradicting,
        plural(contradicting, "contradicts", "contradict"),
        truthfulness,
        tier,
    );
    append_sources(text, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvidenceOrigin, Forensics, Modality, ModalityTally, SourceCategory, SourceRef};

    fn source_item(publisher: &str, supports: bool, confidence: f64) -> EvidenceItem {
        EvidenceItem {
            origin: EvidenceOrigin::Source {
                source: SourceRef {
                    url: format!("https://{}.example", publisher.to_lowercase()),
                    title: "Title".to_string(),
                    publisher: publisher.to_string(),
                    credibility_score: 80,
                    category: SourceCategory::News,
                },
            },
            source_ref: format!("https://{}.example", publisher.to_lowercase()),
            is_valid: supports,
            confidence,
            forensics: Forensics::default(),
            summary: None,
            reasoning: None,
        }
    }

    #[test]
    fn test_source_list_format() {
        let items = vec![
            source_item("Reuters", false, 0.85),
            source_item("Snopes", true, 0.9),
        ];
        assert_eq!(
            source_analysis_list(&items).unwrap(),
            "Reuters: Contradicts (85% confidence); Snopes: Supports (90% confidence)"
        );
    }

    #[test]
    fn test_validator_items_are_not_listed() {
        let item = EvidenceItem {
            origin: EvidenceOrigin::Validator {
                modality: Modality::Audio,
            },
            source_ref: "clip".to_string(),
            is_valid: true,
            confidence: 0.5,
            forensics: Forensics::default(),
            summary: None,
            reasoning: None,
        };
        assert!(source_analysis_list(&[item]).is_none());
    }

    #[test]
    fn test_modality_reasoning_pluralizes_from_total() {
        let breakdown = ModalityBreakdown {
            text: ModalityTally {
                supporting: 3,
                refuting: 1,
                total: 4,
                average_confidence: 0.8,
            },
            ..ModalityBreakdown::default()
        };
        let scores = ModalityScores {
            support_score: 0.75,
            manipulation_score: 0.25,
        };

        let text = modality_reasoning(&breakdown, scores, &[]);
        assert!(text.starts_with("3 supporting and 1 contradicting sources out of 4 across 1 modality (text)."));

        let single = ModalityBreakdown {
            image: ModalityTally {
                supporting: 1,
                refuting: 0,
                total: 1,
                average_confidence: 0.9,
            },
            ..ModalityBreakdown::default()
        };
        let text = modality_reasoning(&single, scores, &[]);
        assert!(text.starts_with("1 supporting and 0 contradicting source out of 1"));
    }

    #[test]
    fn test_source_reasoning_names_counts() {
        let items = vec![source_item("Reuters", false, 0.85)];
        let text = source_reasoning(0, 1, 0.0, ConfidenceTier::Low, &items);
        assert!(text.starts_with("0 sources support the claim and 1 contradicts it."));
        assert!(text.ends_with("Source analyses: Reuters: Contradicts (85% confidence)"));
    }
}
