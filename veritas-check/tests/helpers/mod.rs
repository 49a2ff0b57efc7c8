//! Mock oracles for veritas-check tests
//!
//! Each mock implements one oracle trait and can be told to fail, so tests
//! can drive every component down both its oracle path and its fallback path.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use veritas_check::oracles::{
    ContentFetcher, LlmOracle, SourceSearch, ValidationRequest, ValidatorOracle, ValidatorOutput,
};
use veritas_check::pipeline::{FactCheckPipeline, InMemorySessionStore, SessionStore};
use veritas_check::types::{Forensics, Modality, OracleError, SourceCategory, SourceRef};
use veritas_common::events::EventBus;

/// LLM answering from a script keyed by prompt substrings
#[derive(Default)]
pub struct MockLlm {
    script: Vec<(String, String)>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `OracleError::Unavailable`
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Answer `response` when the system or user prompt contains `needle`
    pub fn respond_when(mut self, needle: &str, response: &str) -> Self {
        self.script.push((needle.to_string(), response.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmOracle for MockLlm {
    fn name(&self) -> &'static str {
        "mock-llm"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(OracleError::Unavailable("mock LLM offline".to_string()));
        }
        self.script
            .iter()
            .find(|(needle, _)| system_prompt.contains(needle.as_str()) || user_prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| OracleError::Malformed("no scripted response".to_string()))
    }
}

/// Fetcher returning fixed text, or failing
pub struct MockFetcher {
    text: Option<String>,
}

impl MockFetcher {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str, _cancel: &CancellationToken) -> Result<String, OracleError> {
        self.text
            .clone()
            .ok_or_else(|| OracleError::Unavailable(format!("mock fetch failed for {}", url)))
    }
}

/// Search returning fixed sources, or failing
pub struct MockSearch {
    sources: Option<Vec<SourceRef>>,
    pub queries: std::sync::Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn with_sources(sources: Vec<SourceRef>) -> Self {
        Self {
            sources: Some(sources),
            queries: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            sources: None,
            queries: Default::default(),
        }
    }
}

#[async_trait]
impl SourceSearch for MockSearch {
    async fn search(&self, query: &str, _cancel: &CancellationToken) -> Result<Vec<SourceRef>, OracleError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        self.sources
            .clone()
            .ok_or_else(|| OracleError::Unavailable("mock search offline".to_string()))
    }
}

/// Validator for one modality with a fixed answer
pub struct MockValidator {
    modality: Modality,
    output: Option<ValidatorOutput>,
    delay: Duration,
}

impl MockValidator {
    pub fn answering(modality: Modality, is_valid: bool, confidence: f64, forensics: Forensics) -> Self {
        Self {
            modality,
            output: Some(ValidatorOutput {
                is_valid,
                confidence,
                forensics,
                summary: None,
                reasoning: None,
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(modality: Modality) -> Self {
        Self {
            modality,
            output: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ValidatorOracle for MockValidator {
    fn modality(&self) -> Modality {
        self.modality
    }

    async fn validate(
        &self,
        request: &ValidationRequest,
        _cancel: &CancellationToken,
    ) -> Result<ValidatorOutput, OracleError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.output
            .clone()
            .ok_or_else(|| OracleError::Unavailable(format!("{} validator down for {}", self.modality, request.source_ref)))
    }
}

pub fn source(publisher: &str, url: &str, credibility_score: u8, category: SourceCategory) -> SourceRef {
    SourceRef {
        url: url.to_string(),
        title: format!("{} article", publisher),
        publisher: publisher.to_string(),
        credibility_score,
        category,
    }
}

pub fn reuters() -> SourceRef {
    source(
        "Reuters",
        "https://www.reuters.com/article/factcheck-water-covid",
        92,
        SourceCategory::NewsAgency,
    )
}

pub fn factcheck_org() -> SourceRef {
    source(
        "FactCheck.org",
        "https://www.factcheck.org/2020/03/water-covid",
        90,
        SourceCategory::FactCheck,
    )
}

/// Pipeline wired to the given mocks with a fresh in-memory session store
pub fn pipeline_with(
    llm: Arc<dyn LlmOracle>,
    fetcher: Arc<dyn ContentFetcher>,
    search: Arc<dyn SourceSearch>,
    validators: Vec<Arc<dyn ValidatorOracle>>,
    event_bus: EventBus,
) -> Arc<FactCheckPipeline> {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(Duration::from_secs(600)));
    Arc::new(FactCheckPipeline::new(llm, fetcher, search, validators, sessions, event_bus))
}
