//! veritas-check - Fact-checking microservice
//!
//! Finalizes one claim per post, searches and analyzes sources, and scores
//! the evidence into a credibility verdict. Exposes HTTP REST + SSE.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veritas_common::config::TomlConfig;
use veritas_common::events::EventBus;

use veritas_check::credibility::CredibilityTable;
use veritas_check::oracles::{
    ContentFetcher, HttpContentFetcher, HttpSourceSearch, HttpValidator, LlmClient, LlmOracle,
    SourceSearch, UnconfiguredSearch, ValidatorOracle,
};
use veritas_check::pipeline::{FactCheckPipeline, InMemorySessionStore};
use veritas_check::types::Modality;
use veritas_check::AppState;

/// How often idle sessions are evicted
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Event bus capacity per subscriber
const EVENT_BUS_CAPACITY: usize = 100;

/// Command-line arguments for veritas-check
#[derive(Parser, Debug)]
#[command(name = "veritas-check")]
#[command(about = "Fact-checking and evidence aggregation microservice")]
#[command(version)]
struct Args {
    /// Path to TOML config file (overrides VERITAS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides bind_address in the config file)
    #[arg(short, long, env = "VERITAS_BIND")]
    bind: Option<String>,
}

fn build_validators(config: &TomlConfig) -> Result<Vec<Arc<dyn ValidatorOracle>>> {
    let timeout = Duration::from_secs(config.llm.timeout_secs.max(1));
    let endpoints = [
        (Modality::Text, &config.validators.text),
        (Modality::Image, &config.validators.image),
        (Modality::Video, &config.validators.video),
        (Modality::Audio, &config.validators.audio),
    ];

    let mut validators: Vec<Arc<dyn ValidatorOracle>> = Vec::new();
    for (modality, endpoint) in endpoints {
        if let Some(endpoint) = endpoint {
            let validator = HttpValidator::new(modality, endpoint.clone(), timeout)
                .with_context(|| format!("Failed to create {} validator", modality))?;
            info!("Validator for {}: {}", modality, endpoint);
            validators.push(Arc::new(validator));
        }
    }
    Ok(validators)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first so [logging] level can seed the filter
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("veritas_check={level},veritas_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting veritas-check (Fact Check) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Oracles
    let api_key = veritas_check::config::resolve_llm_api_key(&config);
    let llm_configured = api_key.is_some();
    let llm: Arc<dyn LlmOracle> =
        Arc::new(LlmClient::new(&config.llm, api_key).context("Failed to create LLM client")?);
    let fetcher: Arc<dyn ContentFetcher> =
        Arc::new(HttpContentFetcher::new(&config.fetch).context("Failed to create content fetcher")?);

    let table = Arc::new(CredibilityTable::with_entries(&config.credibility));
    info!("Credibility table: {} known domains", table.len());

    let search: Arc<dyn SourceSearch> = match &config.search.endpoint {
        Some(endpoint) => {
            info!("Source search: {}", endpoint);
            Arc::new(
                HttpSourceSearch::new(
                    endpoint.clone(),
                    Arc::clone(&table),
                    config.search.max_sources,
                    Duration::from_secs(config.fetch.timeout_secs.max(1)),
                )
                .context("Failed to create search client")?,
            )
        }
        None => {
            warn!("No search endpoint configured; fact-checks will run without sources");
            Arc::new(UnconfiguredSearch)
        }
    };

    let validators = build_validators(&config)?;

    // Pipeline and state
    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(config.sessions.ttl_secs)));
    let pipeline = Arc::new(FactCheckPipeline::new(
        llm,
        fetcher,
        search,
        validators,
        sessions,
        event_bus.clone(),
    ));
    let state = AppState::new(pipeline, event_bus, llm_configured);

    // Periodic session eviction
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(EVICTION_INTERVAL);
            loop {
                interval.tick().await;
                state.evict_expired(Utc::now()).await;
            }
        });
    }

    let app = veritas_check::build_router(state.clone());

    let bind_address = args.bind.unwrap_or_else(|| config.bind_address().to_string());
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Abandon any pipelines still running
    for (session_id, token) in state.cancellation_tokens.write().await.drain() {
        info!(session_id = %session_id, "Cancelling running pipeline");
        token.cancel();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
