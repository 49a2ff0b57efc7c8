//! Source search client
//!
//! Queries a JSON search endpoint (`GET <endpoint>?q=<query>`) and turns the
//! hits into `SourceRef`s scored by the credibility table. Accepts either a
//! bare array of hits or `{ "results": [...] }`.

use crate::credibility::CredibilityTable;
use crate::oracles::{with_deadline, SourceSearch};
use crate::types::{OracleError, SourceRef};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(alias = "link")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "source", alias = "displayLink")]
    pub publisher: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped {
        #[serde(alias = "items")]
        results: Vec<SearchHit>,
    },
    Bare(Vec<SearchHit>),
}

impl SearchResponse {
    fn into_hits(self) -> Vec<SearchHit> {
        match self {
            SearchResponse::Wrapped { results } => results,
            SearchResponse::Bare(hits) => hits,
        }
    }
}

/// Score, de-duplicate and cap search hits
///
/// Hits without an http(s) URL are dropped. Order is preserved.
pub fn enrich_hits(hits: Vec<SearchHit>, table: &CredibilityTable, max_sources: usize) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| {
            Url::parse(&hit.url)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .filter(|hit| seen.insert(hit.url.clone()))
        .take(max_sources)
        .map(|hit| {
            let title = if hit.title.trim().is_empty() {
                hit.url.clone()
            } else {
                hit.title.trim().to_string()
            };
            table.source_ref(&hit.url, &title, hit.publisher.as_deref())
        })
        .collect()
}

pub struct HttpSourceSearch {
    endpoint: String,
    http_client: reqwest::Client,
    table: Arc<CredibilityTable>,
    max_sources: usize,
    timeout: Duration,
}

impl HttpSourceSearch {
    pub fn new(
        endpoint: impl Into<String>,
        table: Arc<CredibilityTable>,
        max_sources: usize,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| OracleError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
            table,
            max_sources,
            timeout,
        })
    }

    async fn query(&self, query: &str) -> Result<Vec<SourceRef>, OracleError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Unavailable(format!("Search returned HTTP {}", status.as_u16())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let sources = enrich_hits(body.into_hits(), &self.table, self.max_sources);
        debug!(query = %query, sources = sources.len(), "Source search complete");
        Ok(sources)
    }
}

#[async_trait]
impl SourceSearch for HttpSourceSearch {
    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<Vec<SourceRef>, OracleError> {
        with_deadline(self.timeout, cancel, self.query(query)).await
    }
}

/// Stand-in when no search endpoint is configured; every search fails
pub struct UnconfiguredSearch;

#[async_trait]
impl SourceSearch for UnconfiguredSearch {
    async fn search(&self, _query: &str, _cancel: &CancellationToken) -> Result<Vec<SourceRef>, OracleError> {
        Err(OracleError::Unavailable("No search endpoint configured".to_string()))
    }
}
