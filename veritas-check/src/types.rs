//! Core Types for Veritas Check
//!
//! Canonical data model shared by the claim finalizer, the per-source
//! analyzer and the evidence aggregator:
//! - **Claim / FinalizedClaim:** one falsifiable statement per post
//! - **SourceRef:** static publisher metadata with credibility score
//! - **EvidenceItem:** the single evidence shape the aggregator accepts
//! - **AggregateResult:** verdict, scores, breakdown and reasoning
//!
//! Oracle-native shapes (validator output, per-source analysis) live next to
//! the oracles and are converted by `aggregation::adapters`.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Claims
// ============================================================================

/// Confidence tier assigned by the claim finalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Derive the tier from evidence counts
    ///
    /// `high` needs at least 3 items and 3 successful analyses, `medium` at
    /// least 2 of each; anything less is `low`.
    pub fn from_counts(total_items: usize, successful_analyses: usize) -> Self {
        if total_items >= 3 && successful_analyses >= 3 {
            ConfidenceTier::High
        } else if total_items >= 2 && successful_analyses >= 2 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

/// A claim ready for verification. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub text: String,
    pub origin_title: String,
    pub confidence_tier: ConfidenceTier,
}

/// Claim finalizer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedClaim {
    pub finalized_claim: String,
    pub evidence_summary: String,
    pub confidence_level: ConfidenceTier,
    /// Title of the post the claim was derived from
    pub origin_title: String,
    /// True when the templated fallback replaced the LLM answer
    pub used_fallback: bool,
}

impl FinalizedClaim {
    pub fn to_claim(&self) -> Claim {
        Claim {
            text: self.finalized_claim.clone(),
            origin_title: self.origin_title.clone(),
            confidence_tier: self.confidence_level,
        }
    }
}

/// Media analyses collected for one post, one description string per item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaEvidence {
    #[serde(alias = "imageEvidence")]
    pub images: Vec<String>,
    #[serde(alias = "videoEvidence")]
    pub videos: Vec<String>,
    #[serde(alias = "audioEvidence")]
    pub audio: Vec<String>,
}

impl MediaEvidence {
    pub fn total_items(&self) -> usize {
        self.images.len() + self.videos.len() + self.audio.len()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Publisher category from the credibility table
///
/// Deserializes leniently through [`SourceCategory::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    NewsAgency,
    FactCheck,
    Government,
    Academic,
    News,
    Reference,
    Unknown,
}

impl SourceCategory {
    /// Parse a free-form category label (config files); unknown labels map to `Unknown`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "news_agency" | "wire" => SourceCategory::NewsAgency,
            "fact_check" | "factcheck" => SourceCategory::FactCheck,
            "government" | "gov" => SourceCategory::Government,
            "academic" | "journal" | "research" => SourceCategory::Academic,
            "news" => SourceCategory::News,
            "reference" | "encyclopedia" => SourceCategory::Reference,
            _ => SourceCategory::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for SourceCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(SourceCategory::parse(&label))
    }
}

/// Static source metadata. Never mutated after lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub url: String,
    pub title: String,
    /// Publisher display name ("source" in the external contract)
    #[serde(alias = "source")]
    pub publisher: String,
    /// Trust rating 0..100
    pub credibility_score: u8,
    pub category: SourceCategory,
}

// ============================================================================
// Evidence
// ============================================================================

/// Evidence channel. Exactly these four exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Video,
    Audio,
}

impl Modality {
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Image,
        Modality::Video,
        Modality::Audio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Video => "video",
            Modality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Modality-specific forensic signals reported by a validator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Forensics {
    pub is_deepfake: Option<bool>,
    pub is_cloned: Option<bool>,
    pub has_edits: Option<bool>,
    /// 0..1 likelihood of manipulation
    pub manipulation_score: Option<f64>,
}

/// Manipulation score above which an item counts as manipulated
pub const MANIPULATION_SCORE_THRESHOLD: f64 = 0.5;

impl Forensics {
    /// True when any forensic signal flags the item as manipulated
    pub fn indicates_manipulation(&self) -> bool {
        self.is_deepfake == Some(true)
            || self.is_cloned == Some(true)
            || self.has_edits == Some(true)
            || self
                .manipulation_score
                .map(|s| s > MANIPULATION_SCORE_THRESHOLD)
                .unwrap_or(false)
    }
}

/// Where an evidence item came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EvidenceOrigin {
    /// Per-modality validator oracle
    Validator { modality: Modality },
    /// Per-source LLM analysis
    Source { source: SourceRef },
}

/// Canonical evidence item consumed by the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub origin: EvidenceOrigin,
    /// URL or identifier of the observed source
    pub source_ref: String,
    /// Whether the observation supports the claim
    pub is_valid: bool,
    /// Normalized to 0..1 regardless of the oracle's native scale
    pub confidence: f64,
    #[serde(default)]
    pub forensics: Forensics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl EvidenceItem {
    /// Modality the item contributes to. Source analyses are textual.
    pub fn modality(&self) -> Modality {
        match &self.origin {
            EvidenceOrigin::Validator { modality } => *modality,
            EvidenceOrigin::Source { .. } => Modality::Text,
        }
    }

    pub fn source(&self) -> Option<&SourceRef> {
        match &self.origin {
            EvidenceOrigin::Source { source } => Some(source),
            EvidenceOrigin::Validator { .. } => None,
        }
    }

    /// Counts against the claim: invalid or forensically manipulated
    pub fn refutes(&self) -> bool {
        !self.is_valid || self.forensics.indicates_manipulation()
    }

    pub fn supports(&self) -> bool {
        !self.refutes()
    }

    /// Display label: publisher for sources, `<modality>:<ref>` otherwise
    pub fn label(&self) -> String {
        match &self.origin {
            EvidenceOrigin::Source { source } => source.publisher.clone(),
            EvidenceOrigin::Validator { modality } => format!("{}:{}", modality, self.source_ref),
        }
    }
}

// ============================================================================
// Aggregation output
// ============================================================================

/// Per-modality support/refute counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalityTally {
    #[serde(alias = "supportingCount")]
    pub supporting: u32,
    /// Refuting or manipulated/deepfake/cloned items
    #[serde(alias = "refutingCount", alias = "manipulated")]
    pub refuting: u32,
    pub total: u32,
    /// Mean normalized confidence of the counted items (0 when empty)
    pub average_confidence: f64,
}

impl ModalityTally {
    pub fn is_present(&self) -> bool {
        self.total > 0
    }
}

/// Modality-keyed breakdown: the aggregator's raw input and reported output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalityBreakdown {
    pub text: ModalityTally,
    pub image: ModalityTally,
    pub video: ModalityTally,
    pub audio: ModalityTally,
}

impl ModalityBreakdown {
    pub fn get(&self, modality: Modality) -> &ModalityTally {
        match modality {
            Modality::Text => &self.text,
            Modality::Image => &self.image,
            Modality::Video => &self.video,
            Modality::Audio => &self.audio,
        }
    }

    pub fn get_mut(&mut self, modality: Modality) -> &mut ModalityTally {
        match modality {
            Modality::Text => &mut self.text,
            Modality::Image => &mut self.image,
            Modality::Video => &mut self.video,
            Modality::Audio => &mut self.audio,
        }
    }

    pub fn total_items(&self) -> u32 {
        Modality::ALL.iter().map(|m| self.get(*m).total).sum()
    }

    pub fn total_supporting(&self) -> u32 {
        Modality::ALL.iter().map(|m| self.get(*m).supporting).sum()
    }

    pub fn total_refuting(&self) -> u32 {
        Modality::ALL.iter().map(|m| self.get(*m).refuting).sum()
    }

    pub fn present_modalities(&self) -> Vec<Modality> {
        Modality::ALL
            .iter()
            .copied()
            .filter(|m| self.get(*m).is_present())
            .collect()
    }
}

/// Verdict of the modality-weighted strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalityVerdict {
    #[serde(rename = "TRUE")]
    True,
    #[serde(rename = "FALSE")]
    False,
    #[serde(rename = "PARTIALLY_TRUE")]
    PartiallyTrue,
    #[serde(rename = "UNVERIFIED")]
    Unverified,
}

/// Verdict band of the source-weighted strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceVerdict {
    #[serde(rename = "LIKELY TRUE")]
    LikelyTrue,
    #[serde(rename = "MIXED EVIDENCE")]
    MixedEvidence,
    #[serde(rename = "LIKELY FALSE")]
    LikelyFalse,
    /// No analysis carried any weight
    #[serde(rename = "UNVERIFIED")]
    Unverified,
}

/// Verdict from either strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verdict {
    Modality(ModalityVerdict),
    Source(SourceVerdict),
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Modality(ModalityVerdict::True) => "TRUE",
            Verdict::Modality(ModalityVerdict::False) => "FALSE",
            Verdict::Modality(ModalityVerdict::PartiallyTrue) => "PARTIALLY_TRUE",
            Verdict::Modality(ModalityVerdict::Unverified) => "UNVERIFIED",
            Verdict::Source(SourceVerdict::LikelyTrue) => "LIKELY TRUE",
            Verdict::Source(SourceVerdict::MixedEvidence) => "MIXED EVIDENCE",
            Verdict::Source(SourceVerdict::LikelyFalse) => "LIKELY FALSE",
            Verdict::Source(SourceVerdict::Unverified) => "UNVERIFIED",
        };
        write!(f, "{}", label)
    }
}

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ModalityWeighted,
    SourceWeighted,
}

/// One line of the supporting/contradicting evidence lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSummary {
    pub label: String,
    pub source_ref: String,
    pub modality: Modality,
    /// 0..1
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<&EvidenceItem> for EvidenceSummary {
    fn from(item: &EvidenceItem) -> Self {
        Self {
            label: item.label(),
            source_ref: item.source_ref.clone(),
            modality: item.modality(),
            confidence: item.confidence,
            summary: item.summary.clone(),
        }
    }
}

/// Final aggregation output. A pure function of the evidence it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub strategy: StrategyKind,
    #[serde(rename = "overallVerdict")]
    pub verdict: Verdict,
    /// 0..1
    pub confidence_score: f64,
    /// 0..100, source-weighted strategy only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truthfulness_score: Option<f64>,
    /// 0..1
    pub support_score: f64,
    /// 0..1
    pub manipulation_score: f64,
    pub breakdown: ModalityBreakdown,
    pub reasoning: String,
    pub supporting: Vec<EvidenceSummary>,
    pub contradicting: Vec<EvidenceSummary>,
}

// ============================================================================
// Oracle errors
// ============================================================================

/// Oracle failure. Always recovered by the owning component's fallback.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    /// Call failed (network, HTTP status, missing credentials)
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline
    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),

    /// Enclosing request was cancelled
    #[error("Oracle call cancelled")]
    Cancelled,

    /// Response did not match the expected shape
    #[error("Malformed oracle response: {0}")]
    Malformed(String),
}
