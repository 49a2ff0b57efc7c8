//! Fact-check pipeline tests
//!
//! Runs the full claim → query → search → analyze → aggregate chain against
//! mock oracles, plus the parallel per-modality validation path.

mod helpers;

use helpers::{factcheck_org, pipeline_with, reuters, MockFetcher, MockLlm, MockSearch, MockValidator};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use veritas_check::oracles::{LlmOracle, ValidatorOracle};
use veritas_check::pipeline::{FactCheckRequest, ModalityRef, PipelineError, SessionStatus};
use veritas_check::types::{
    ConfidenceTier, Forensics, MediaEvidence, Modality, ModalityVerdict, SourceVerdict, Verdict,
};
use veritas_common::events::{EventBus, PipelineStage, VeritasEvent};

const CLAIM_ANSWER: &str = r#"{"finalizedClaim": "Drinking 3 liters of water cures COVID-19", "evidenceSummary": "An image caption states the claim."}"#;
const QUERY_ANSWER: &str = "water COVID-19 cure health";
const REUTERS_ANSWER: &str = r#"{"supports": false, "confidence": 85, "summary": "Reuters found no evidence.", "reasoning": "No study supports it."}"#;
const FACTCHECK_ANSWER: &str = r#"{"supports": false, "confidence": 90, "summary": "Rated false.", "reasoning": "Health agencies contradict it."}"#;

fn scripted_llm() -> Arc<dyn LlmOracle> {
    Arc::new(
        MockLlm::new()
            .respond_when("finalizedClaim", CLAIM_ANSWER)
            .respond_when("search queries", QUERY_ANSWER)
            .respond_when("Publisher: Reuters", REUTERS_ANSWER)
            .respond_when("Publisher: FactCheck.org", FACTCHECK_ANSWER),
    )
}

fn water_request() -> FactCheckRequest {
    FactCheckRequest {
        post_title: "Water cures COVID".to_string(),
        platform: "twitter".to_string(),
        evidence: MediaEvidence {
            images: vec![
                "Image of a glass of water with the caption 'drink 3 liters a day to cure COVID-19'".to_string(),
            ],
            videos: vec![],
            audio: vec![],
        },
    }
}

async fn wait_for_status(
    pipeline: &veritas_check::pipeline::FactCheckPipeline,
    session_id: Uuid,
    status: SessionStatus,
) -> veritas_check::pipeline::SessionProgress {
    for _ in 0..200 {
        if let Some(progress) = pipeline.sessions().get(session_id).await {
            if progress.status == status {
                return progress;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {} never reached {:?}", session_id, status);
}

#[tokio::test]
async fn test_run_scores_contradicted_claim_likely_false() {
    // Given: Two trusted sources that both contradict the claim
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::with_text("Drinking water does not cure COVID-19.")),
        Arc::new(MockSearch::with_sources(vec![reuters(), factcheck_org()])),
        vec![],
        EventBus::new(100),
    );
    let session_id = Uuid::new_v4();
    pipeline.sessions().create(session_id).await.unwrap();
    let cancel = CancellationToken::new();

    // When: Running the pipeline
    let report = pipeline.run(session_id, &water_request(), &cancel).await.unwrap();

    // Then: Claim from the LLM, low tier (one item), LIKELY FALSE at 0
    assert_eq!(report.claim.finalized_claim, "Drinking 3 liters of water cures COVID-19");
    assert_eq!(report.claim.confidence_level, ConfidenceTier::Low);
    assert_eq!(report.search_query, QUERY_ANSWER);
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.result.verdict, Verdict::Source(SourceVerdict::LikelyFalse));
    assert_eq!(report.result.truthfulness_score, Some(0.0));
    assert!(report.result.reasoning.contains("Reuters: Contradicts (85% confidence)"));
    assert!(report.result.reasoning.contains("FactCheck.org: Contradicts (90% confidence)"));

    // And: The session log holds every stage in order plus the report
    let progress = pipeline.sessions().get(session_id).await.unwrap();
    assert_eq!(progress.status, SessionStatus::Completed);
    let stages: Vec<PipelineStage> = progress.entries.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::ClaimFinalization,
            PipelineStage::QueryGeneration,
            PipelineStage::SourceSearch,
            PipelineStage::SourceAnalysis,
            PipelineStage::Aggregation,
        ]
    );
    assert_eq!(progress.report, Some(report));
}

#[tokio::test]
async fn test_run_with_every_oracle_down_is_unverified() {
    // Given: LLM, fetcher and search all failing
    let pipeline = pipeline_with(
        Arc::new(MockLlm::failing()),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::failing()),
        vec![],
        EventBus::new(100),
    );
    let session_id = Uuid::new_v4();
    pipeline.sessions().create(session_id).await.unwrap();
    let cancel = CancellationToken::new();

    // When: Running
    let report = pipeline.run(session_id, &water_request(), &cancel).await.unwrap();

    // Then: Fallbacks fill every stage and no sources means UNVERIFIED
    assert!(report.claim.used_fallback);
    assert_eq!(
        report.claim.finalized_claim,
        "Claims made in Water cures COVID require fact-checking and verification"
    );
    assert_eq!(report.search_query, "Claims made Water cures COVID require health safety");
    assert!(report.sources.is_empty());
    assert_eq!(report.result.verdict, Verdict::Source(SourceVerdict::Unverified));
}

#[tokio::test]
async fn test_sources_fall_back_when_llm_fails_after_search() {
    // Given: LLM fails for everything, search returns two trusted sources
    let pipeline = pipeline_with(
        Arc::new(MockLlm::failing()),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::with_sources(vec![reuters(), factcheck_org()])),
        vec![],
        EventBus::new(100),
    );
    let session_id = Uuid::new_v4();
    pipeline.sessions().create(session_id).await.unwrap();

    let report = pipeline
        .run(session_id, &water_request(), &CancellationToken::new())
        .await
        .unwrap();

    // Then: Credibility fallback marks both as supporting at low confidence
    assert!(report.sources.iter().all(|s| s.analysis.used_fallback));
    assert!(report.sources.iter().all(|s| s.analysis.supports));
    // Unanimous support is 100, nudged down 5 for a low-tier claim
    assert_eq!(report.result.truthfulness_score, Some(95.0));
    assert_eq!(report.result.verdict, Verdict::Source(SourceVerdict::LikelyTrue));
}

#[tokio::test]
async fn test_cancelled_run_stops_without_report() {
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::with_sources(vec![reuters()])),
        vec![],
        EventBus::new(100),
    );
    let session_id = Uuid::new_v4();
    pipeline.sessions().create(session_id).await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline.run(session_id, &water_request(), &cancel).await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    let progress = pipeline.sessions().get(session_id).await.unwrap();
    assert!(progress.entries.is_empty());
    assert!(progress.report.is_none());
}

#[tokio::test]
async fn test_run_requires_existing_session() {
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::failing()),
        vec![],
        EventBus::new(100),
    );

    let result = pipeline
        .run(Uuid::new_v4(), &water_request(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(PipelineError::Session(_))));
}

#[tokio::test]
async fn test_start_runs_in_background_and_publishes_events() {
    // Given: Event subscriber attached before the run
    let event_bus = EventBus::new(100);
    let mut events = event_bus.subscribe();
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::with_text("Body")),
        Arc::new(MockSearch::with_sources(vec![reuters(), factcheck_org()])),
        vec![],
        event_bus,
    );

    // When: Starting a session
    let session_id = Arc::clone(&pipeline)
        .start(water_request(), CancellationToken::new())
        .await
        .unwrap();

    // Then: Session completes
    let progress = wait_for_status(&pipeline, session_id, SessionStatus::Completed).await;
    assert_eq!(progress.entries.len(), 5);

    // And: Events arrive started → stages/sources → completed
    let mut received = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event stream stalled")
            .unwrap();
        assert_eq!(event.session_id(), session_id);
        let done = matches!(event, VeritasEvent::PipelineCompleted { .. });
        received.push(event);
        if done {
            break;
        }
    }
    assert!(matches!(received.first(), Some(VeritasEvent::PipelineStarted { .. })));
    let analyzed = received
        .iter()
        .filter(|e| matches!(e, VeritasEvent::SourceAnalyzed { .. }))
        .count();
    assert_eq!(analyzed, 2);
    match received.last() {
        Some(VeritasEvent::PipelineCompleted { verdict, .. }) => assert_eq!(verdict, "LIKELY FALSE"),
        other => panic!("expected PipelineCompleted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_records_cancellation_as_failure() {
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::failing()),
        vec![],
        EventBus::new(100),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let session_id = Arc::clone(&pipeline).start(water_request(), cancel).await.unwrap();

    let progress = wait_for_status(&pipeline, session_id, SessionStatus::Failed).await;
    assert_eq!(progress.error.as_deref(), Some("Pipeline cancelled"));
}

#[tokio::test]
async fn test_validate_modalities_drops_failed_validators() {
    // Given: Text validator supports, image validator is down, video flags a deepfake
    let validators: Vec<Arc<dyn ValidatorOracle>> = vec![
        Arc::new(MockValidator::answering(Modality::Text, true, 0.9, Forensics::default())),
        Arc::new(MockValidator::failing(Modality::Image)),
        Arc::new(
            MockValidator::answering(
                Modality::Video,
                true,
                80.0,
                Forensics {
                    is_deepfake: Some(true),
                    ..Default::default()
                },
            )
            .with_delay(Duration::from_millis(20)),
        ),
    ];
    let pipeline = pipeline_with(
        scripted_llm(),
        Arc::new(MockFetcher::failing()),
        Arc::new(MockSearch::failing()),
        validators,
        EventBus::new(100),
    );
    let refs = vec![
        ModalityRef {
            modality: Modality::Text,
            source_ref: "post-body".to_string(),
        },
        ModalityRef {
            modality: Modality::Image,
            source_ref: "https://cdn.example/1.jpg".to_string(),
        },
        ModalityRef {
            modality: Modality::Video,
            source_ref: "https://cdn.example/1.mp4".to_string(),
        },
        ModalityRef {
            modality: Modality::Audio,
            source_ref: "https://cdn.example/1.mp3".to_string(),
        },
    ];

    // When: Validating
    let result = pipeline
        .validate_modalities("Water cures COVID", &refs, &CancellationToken::new())
        .await;

    // Then: Image (failed) and audio (no validator) contribute nothing
    assert_eq!(result.breakdown.text.supporting, 1);
    assert_eq!(result.breakdown.image.total, 0);
    assert_eq!(result.breakdown.video.refuting, 1);
    assert_eq!(result.breakdown.audio.total, 0);
    assert!((result.breakdown.video.average_confidence - 0.8).abs() < 1e-9);
    // support = 0.40 / 0.60, manipulation = 0.20 / 0.60
    assert_eq!(result.verdict, Verdict::Modality(ModalityVerdict::PartiallyTrue));
    assert_eq!(
        pipeline.validator_modalities(),
        vec![Modality::Text, Modality::Image, Modality::Video]
    );
}
