//! Fact-Check Pipeline
//!
//! Strict chain per session:
//!
//! ```text
//! finalize claim → generate query → search sources → analyze sources (parallel) → aggregate
//! ```
//!
//! Every stage appends to the session's progress log and publishes a
//! [`VeritasEvent`]. Oracle failures are absorbed by each component's
//! fallback; only cancellation or a lost session stops a run.
//!
//! Independently, [`FactCheckPipeline::validate_modalities`] fans out to the
//! per-modality validators and aggregates with the modality strategy.

pub mod progress;

pub use progress::{InMemorySessionStore, SessionProgress, SessionStatus, SessionStore};

use crate::aggregation::{self, adapters};
use crate::analysis::{SourceAnalysis, SourceAnalyzer};
use crate::claim::{ClaimFinalizer, QueryGenerator};
use crate::oracles::{ContentFetcher, LlmOracle, SourceSearch, ValidationRequest, ValidatorOracle};
use crate::types::{AggregateResult, FinalizedClaim, MediaEvidence, Modality, SourceRef};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use veritas_common::events::{EventBus, PipelineStage, VeritasEvent};

/// Why a pipeline run stopped without a report
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Session error: {0}")]
    Session(#[from] veritas_common::Error),
}

/// One post to fact-check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckRequest {
    pub post_title: String,
    #[serde(default)]
    pub platform: String,
    #[serde(flatten)]
    pub evidence: MediaEvidence,
}

/// A source together with its analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedSource {
    pub source: SourceRef,
    pub analysis: SourceAnalysis,
}

/// Final output of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckReport {
    pub claim: FinalizedClaim,
    pub search_query: String,
    pub sources: Vec<AnalyzedSource>,
    pub result: AggregateResult,
}

/// Media reference for one modality validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityRef {
    pub modality: Modality,
    pub source_ref: String,
}

pub struct FactCheckPipeline {
    finalizer: ClaimFinalizer,
    query_generator: QueryGenerator,
    search: Arc<dyn SourceSearch>,
    analyzer: SourceAnalyzer,
    validators: Vec<Arc<dyn ValidatorOracle>>,
    sessions: Arc<dyn SessionStore>,
    event_bus: EventBus,
}

impl FactCheckPipeline {
    pub fn new(
        llm: Arc<dyn LlmOracle>,
        fetcher: Arc<dyn ContentFetcher>,
        search: Arc<dyn SourceSearch>,
        validators: Vec<Arc<dyn ValidatorOracle>>,
        sessions: Arc<dyn SessionStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            finalizer: ClaimFinalizer::new(Arc::clone(&llm)),
            query_generator: QueryGenerator::new(Arc::clone(&llm)),
            search,
            analyzer: SourceAnalyzer::new(llm, fetcher),
            validators,
            sessions,
            event_bus,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Modalities with a configured validator
    pub fn validator_modalities(&self) -> Vec<Modality> {
        self.validators.iter().map(|v| v.modality()).collect()
    }

    async fn stage(
        &self,
        session_id: Uuid,
        stage: PipelineStage,
        message: String,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        debug!(session_id = %session_id, stage = %stage, message = %message, "Pipeline stage");
        self.sessions.append(session_id, stage, message.clone()).await?;
        self.event_bus.emit_lossy(VeritasEvent::StageProgress {
            session_id,
            stage,
            message,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Run the full chain for an existing session
    ///
    /// The session must already exist in the store. On success the report is
    /// recorded on the session and returned.
    pub async fn run(
        &self,
        session_id: Uuid,
        request: &FactCheckRequest,
        cancel: &CancellationToken,
    ) -> Result<FactCheckReport, PipelineError> {
        info!(session_id = %session_id, title = %request.post_title, "Starting fact-check pipeline");

        // Stage 1: claim
        self.stage(
            session_id,
            PipelineStage::ClaimFinalization,
            format!("Finalizing claim from {} media analyses", request.evidence.total_items()),
            cancel,
        )
        .await?;
        let claim = self
            .finalizer
            .finalize(&request.post_title, &request.platform, &request.evidence, cancel)
            .await;

        // Stage 2: query
        self.stage(
            session_id,
            PipelineStage::QueryGeneration,
            format!("Claim ({} confidence): {}", claim.confidence_level, claim.finalized_claim),
            cancel,
        )
        .await?;
        let query = self
            .query_generator
            .generate_query(&claim.finalized_claim, cancel)
            .await;

        // Stage 3: search
        self.stage(session_id, PipelineStage::SourceSearch, format!("Searching: {}", query), cancel)
            .await?;
        let sources = match self.search.search(&query, cancel).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Source search failed, continuing without sources");
                Vec::new()
            }
        };

        // Stage 4: per-source analysis
        self.stage(
            session_id,
            PipelineStage::SourceAnalysis,
            format!("Analyzing {} sources", sources.len()),
            cancel,
        )
        .await?;
        let analyzed = self
            .analyzer
            .analyze_all(&sources, &claim.finalized_claim, cancel)
            .await;
        for (source, analysis) in &analyzed {
            self.event_bus.emit_lossy(VeritasEvent::SourceAnalyzed {
                session_id,
                publisher: source.publisher.clone(),
                supports: analysis.supports,
                confidence: analysis.confidence,
                used_fallback: analysis.used_fallback,
                timestamp: Utc::now(),
            });
        }

        // Stage 5: aggregate
        self.stage(
            session_id,
            PipelineStage::Aggregation,
            format!("Aggregating {} source analyses", analyzed.len()),
            cancel,
        )
        .await?;
        let items: Vec<_> = analyzed
            .iter()
            .map(|(source, analysis)| adapters::from_source_analysis(source, analysis))
            .collect();
        let result = aggregation::aggregate_sources(&items, claim.confidence_level);

        let report = FactCheckReport {
            claim,
            search_query: query,
            sources: analyzed
                .into_iter()
                .map(|(source, analysis)| AnalyzedSource { source, analysis })
                .collect(),
            result,
        };

        self.sessions.complete(session_id, report.clone()).await?;
        self.event_bus.emit_lossy(VeritasEvent::PipelineCompleted {
            session_id,
            verdict: report.result.verdict.to_string(),
            confidence_score: report.result.confidence_score,
            timestamp: Utc::now(),
        });
        info!(
            session_id = %session_id,
            verdict = %report.result.verdict,
            truthfulness = report.result.truthfulness_score.unwrap_or(0.0),
            "Fact-check pipeline complete"
        );

        Ok(report)
    }

    /// Create a session and run the pipeline on a background task
    ///
    /// Returns the new session id immediately. Failures are recorded on the
    /// session and published as `PipelineFailed`.
    pub async fn start(
        self: Arc<Self>,
        request: FactCheckRequest,
        cancel: CancellationToken,
    ) -> Result<Uuid, PipelineError> {
        let session_id = Uuid::new_v4();
        self.sessions.create(session_id).await?;
        self.event_bus.emit_lossy(VeritasEvent::PipelineStarted {
            session_id,
            post_title: request.post_title.clone(),
            timestamp: Utc::now(),
        });

        let pipeline = self;
        tokio::spawn(async move {
            if let Err(e) = pipeline.run(session_id, &request, &cancel).await {
                warn!(session_id = %session_id, error = %e, "Fact-check pipeline stopped");
                if let Err(store_error) = pipeline.sessions.fail(session_id, e.to_string()).await {
                    debug!(session_id = %session_id, error = %store_error, "Could not record failure");
                }
                pipeline.event_bus.emit_lossy(VeritasEvent::PipelineFailed {
                    session_id,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        });

        Ok(session_id)
    }

    /// Validate media references with the per-modality validators
    ///
    /// All calls run concurrently. Failed calls and modalities without a
    /// validator contribute no evidence.
    pub async fn validate_modalities(
        &self,
        claim: &str,
        refs: &[ModalityRef],
        cancel: &CancellationToken,
    ) -> AggregateResult {
        let futures = refs.iter().filter_map(|media| {
            let Some(validator) = self.validators.iter().find(|v| v.modality() == media.modality) else {
                debug!(modality = %media.modality, "No validator configured, skipping");
                return None;
            };
            let validator = Arc::clone(validator);
            let request = ValidationRequest {
                source_ref: media.source_ref.clone(),
                claim: claim.to_string(),
            };
            Some(async move {
                match validator.validate(&request, cancel).await {
                    Ok(output) => Some(adapters::from_validator(validator.modality(), &request.source_ref, &output)),
                    Err(e) => {
                        warn!(
                            modality = %validator.modality(),
                            source_ref = %request.source_ref,
                            error = %e,
                            "Validation failed, dropping evidence"
                        );
                        None
                    }
                }
            })
        });

        let items: Vec<_> = join_all(futures).await.into_iter().flatten().collect();
        aggregation::aggregate_evidence(&items)
    }
}
