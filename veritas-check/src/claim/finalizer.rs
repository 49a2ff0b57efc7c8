// Claim Finalizer
//
// Raw per-media analyses for one post → one falsifiable claim plus a
// confidence tier. One LLM call; templated fallback on any failure.

use crate::oracles::{response_parser, LlmOracle};
use crate::types::{ConfidenceTier, FinalizedClaim, MediaEvidence, OracleError};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Image/video analyses this short carry no usable content
pub const MIN_VISUAL_CHARS: usize = 50;
/// Audio analyses this short carry no usable content
pub const MIN_AUDIO_CHARS: usize = 20;

pub const MAX_IMAGE_ANALYSES: usize = 3;
pub const MAX_VIDEO_ANALYSES: usize = 2;
pub const MAX_AUDIO_ANALYSES: usize = 2;

const SYSTEM_PROMPT: &str = "You are a fact-checking assistant. From the media analyses of a social media post, \
state the single most important factual claim the post makes as one specific, falsifiable sentence, \
and summarize the evidence in one or two sentences. \
Respond with strict JSON only: {\"finalizedClaim\": string, \"evidenceSummary\": string}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmClaim {
    finalized_claim: String,
    evidence_summary: String,
}

/// Analyses that survived the meaningful-content filter, ranked longest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeaningfulEvidence {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub audio: Vec<String>,
}

impl MeaningfulEvidence {
    pub fn count(&self) -> usize {
        self.images.len() + self.videos.len() + self.audio.len()
    }
}

fn is_meaningful_visual(text: &str) -> bool {
    text.trim().chars().count() > MIN_VISUAL_CHARS
}

fn is_meaningful_audio(text: &str) -> bool {
    text.trim().chars().count() > MIN_AUDIO_CHARS && !text.to_lowercase().contains("music")
}

/// Keep meaningful items, longest first; equal lengths keep input order
fn rank(items: &[String], keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut kept: Vec<String> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| keep(*s))
        .map(str::to_string)
        .collect();
    kept.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    kept
}

pub fn filter_meaningful(evidence: &MediaEvidence) -> MeaningfulEvidence {
    MeaningfulEvidence {
        images: rank(&evidence.images, is_meaningful_visual),
        videos: rank(&evidence.videos, is_meaningful_visual),
        audio: rank(&evidence.audio, is_meaningful_audio),
    }
}

fn display_title(post_title: &str) -> &str {
    let title = post_title.trim();
    if title.is_empty() {
        "Untitled post"
    } else {
        title
    }
}

/// Templated claim used whenever the LLM cannot produce one
pub fn fallback_claim(post_title: &str) -> String {
    format!(
        "Claims made in {} require fact-checking and verification",
        display_title(post_title)
    )
}

/// Evidence summary built purely from counts
pub fn fallback_summary(evidence: &MediaEvidence, meaningful: &MeaningfulEvidence) -> String {
    format!(
        "Analyzed {} image, {} video and {} audio items; {} contained meaningful content for verification.",
        evidence.images.len(),
        evidence.videos.len(),
        evidence.audio.len(),
        meaningful.count()
    )
}

fn section(out: &mut String, heading: &str, items: &[String], limit: usize) {
    if items.is_empty() {
        return;
    }
    out.push_str(heading);
    out.push('\n');
    for (index, item) in items.iter().take(limit).enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, item));
    }
    out.push('\n');
}

fn build_prompt(post_title: &str, platform: &str, meaningful: &MeaningfulEvidence) -> String {
    let mut prompt = format!(
        "Post title: {}\nPlatform: {}\n\n",
        display_title(post_title),
        platform.trim()
    );
    section(&mut prompt, "Image analyses:", &meaningful.images, MAX_IMAGE_ANALYSES);
    section(&mut prompt, "Video analyses:", &meaningful.videos, MAX_VIDEO_ANALYSES);
    section(&mut prompt, "Audio analyses:", &meaningful.audio, MAX_AUDIO_ANALYSES);
    if meaningful.count() == 0 {
        prompt.push_str("No media analyses contained meaningful content; rely on the title.\n");
    }
    prompt
}

pub struct ClaimFinalizer {
    llm: Arc<dyn LlmOracle>,
}

impl ClaimFinalizer {
    pub fn new(llm: Arc<dyn LlmOracle>) -> Self {
        Self { llm }
    }

    async fn ask_llm(&self, prompt: &str, cancel: &CancellationToken) -> Result<LlmClaim, OracleError> {
        let raw = self.llm.complete(SYSTEM_PROMPT, prompt, cancel).await?;
        let answer: LlmClaim = response_parser::parse_json(&raw)?;
        if answer.finalized_claim.trim().is_empty() {
            return Err(OracleError::Malformed("Empty finalizedClaim".to_string()));
        }
        Ok(answer)
    }

    /// Produce one claim for a post. Never fails; falls back to a template.
    pub async fn finalize(
        &self,
        post_title: &str,
        platform: &str,
        evidence: &MediaEvidence,
        cancel: &CancellationToken,
    ) -> FinalizedClaim {
        let meaningful = filter_meaningful(evidence);
        let tier = ConfidenceTier::from_counts(evidence.total_items(), meaningful.count());
        debug!(
            total = evidence.total_items(),
            meaningful = meaningful.count(),
            tier = %tier,
            "Filtered media evidence"
        );

        let prompt = build_prompt(post_title, platform, &meaningful);
        match self.ask_llm(&prompt, cancel).await {
            Ok(answer) => {
                info!(tier = %tier, "Claim finalized");
                FinalizedClaim {
                    finalized_claim: answer.finalized_claim.trim().to_string(),
                    evidence_summary: answer.evidence_summary.trim().to_string(),
                    confidence_level: tier,
                    origin_title: post_title.to_string(),
                    used_fallback: false,
                }
            }
            Err(e) => {
                warn!(oracle = self.llm.name(), error = %e, "Claim finalization failed, using fallback");
                FinalizedClaim {
                    finalized_claim: fallback_claim(post_title),
                    evidence_summary: fallback_summary(evidence, &meaningful),
                    confidence_level: tier,
                    origin_title: post_title.to_string(),
                    used_fallback: true,
                }
            }
        }
    }
}
