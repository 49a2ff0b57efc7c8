//! Per-Source Analyzer
//!
//! Asks the LLM whether one source's content supports or contradicts a
//! claim. The page text is fetched first; when that fails the analysis runs on
//! the source's title and publisher alone. When the LLM fails, the result is
//! derived from static credibility. `analyze` never returns an error.

use crate::oracles::{response_parser, ContentFetcher, LlmOracle};
use crate::types::{OracleError, SourceRef};
use futures::future::join_all;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Confidence reported by the credibility fallback (0..100)
pub const FALLBACK_CONFIDENCE: u8 = 20;

/// Sources scoring above this are assumed to support the claim when analysis fails
pub const FALLBACK_SUPPORT_THRESHOLD: u8 = 50;

const SYSTEM_PROMPT: &str = "You are a careful fact-checker. Decide whether the given source supports \
or contradicts the claim, using only the source text provided. \
Respond with strict JSON only: {\"supports\": boolean, \"confidence\": number 0-100, \
\"summary\": string, \"reasoning\": string}";

/// Outcome of analyzing one source against a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAnalysis {
    pub supports: bool,
    /// 0..100
    #[serde(deserialize_with = "deserialize_percent")]
    pub confidence: u8,
    pub summary: String,
    pub reasoning: String,
    #[serde(default)]
    pub used_fallback: bool,
}

#[derive(Debug, Deserialize)]
struct LlmAnalysis {
    supports: bool,
    confidence: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    reasoning: String,
}

/// LLM confidence → 0..100. Answers at or below 1.0 are read as fractions.
fn percent_confidence(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    let percent = if raw <= 1.0 { raw * 100.0 } else { raw };
    percent.round().clamp(0.0, 100.0) as u8
}

/// Any JSON number, read with the same scale rules as LLM answers
fn deserialize_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    f64::deserialize(deserializer).map(percent_confidence)
}

/// Deterministic analysis from static credibility
pub fn fallback_analysis(source: &SourceRef) -> SourceAnalysis {
    let supports = source.credibility_score > FALLBACK_SUPPORT_THRESHOLD;
    SourceAnalysis {
        supports,
        confidence: FALLBACK_CONFIDENCE,
        summary: format!(
            "Automated analysis unavailable for {}; assessment based on source credibility ({}/100).",
            source.publisher, source.credibility_score
        ),
        reasoning: format!(
            "{} has a credibility score of {}/100, so it is assumed to {} the claim with low confidence.",
            source.publisher,
            source.credibility_score,
            if supports { "support" } else { "contradict" }
        ),
        used_fallback: true,
    }
}

/// Context used when the page text could not be fetched
pub fn degraded_context(source: &SourceRef) -> String {
    format!("Title: {}\nPublisher: {}", source.title, source.publisher)
}

fn build_prompt(source: &SourceRef, claim: &str, context: &str) -> String {
    format!(
        "Claim: {}\n\nSource title: {}\nPublisher: {}\nCredibility score: {}/100\nURL: {}\n\nSource text:\n{}",
        claim.trim(),
        source.title,
        source.publisher,
        source.credibility_score,
        source.url,
        context
    )
}

pub struct SourceAnalyzer {
    llm: Arc<dyn LlmOracle>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl SourceAnalyzer {
    pub fn new(llm: Arc<dyn LlmOracle>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { llm, fetcher }
    }

    async fn ask_llm(&self, prompt: &str, cancel: &CancellationToken) -> Result<SourceAnalysis, OracleError> {
        let raw = self.llm.complete(SYSTEM_PROMPT, prompt, cancel).await?;
        let answer: LlmAnalysis = response_parser::parse_json(&raw)?;
        Ok(SourceAnalysis {
            supports: answer.supports,
            confidence: percent_confidence(answer.confidence),
            summary: answer.summary.trim().to_string(),
            reasoning: answer.reasoning.trim().to_string(),
            used_fallback: false,
        })
    }

    /// Analyze one source against `claim`
    pub async fn analyze(&self, source: &SourceRef, claim: &str, cancel: &CancellationToken) -> SourceAnalysis {
        let context = match self.fetcher.fetch_text(&source.url, cancel).await {
            Ok(text) => text,
            Err(e) => {
                debug!(url = %source.url, error = %e, "Content fetch failed, using title and publisher");
                degraded_context(source)
            }
        };

        let prompt = build_prompt(source, claim, &context);
        match self.ask_llm(&prompt, cancel).await {
            Ok(analysis) => {
                debug!(
                    publisher = %source.publisher,
                    supports = analysis.supports,
                    confidence = analysis.confidence,
                    "Source analyzed"
                );
                analysis
            }
            Err(e) => {
                warn!(
                    publisher = %source.publisher,
                    url = %source.url,
                    error = %e,
                    "Source analysis failed, using credibility fallback"
                );
                fallback_analysis(source)
            }
        }
    }

    /// Analyze every source concurrently; results keep the input order
    pub async fn analyze_all(
        &self,
        sources: &[SourceRef],
        claim: &str,
        cancel: &CancellationToken,
    ) -> Vec<(SourceRef, SourceAnalysis)> {
        let futures = sources.iter().map(|source| async move {
            let analysis = self.analyze(source, claim, cancel).await;
            (source.clone(), analysis)
        });
        join_all(futures).await
    }
}
