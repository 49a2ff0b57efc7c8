//! Configuration resolution for veritas-check
//!
//! Multi-tier resolution of the LLM API key with ENV → TOML priority.

use tracing::{info, warn};
use veritas_common::config::TomlConfig;

/// Environment variable holding the LLM API key
pub const LLM_API_KEY_ENV_VAR: &str = "VERITAS_LLM_API_KEY";

/// Resolve the LLM API key
///
/// **Priority:** ENV → TOML
///
/// Returns `None` when no source has a usable key. The service still starts;
/// every LLM-backed component then answers with its fallback.
pub fn resolve_llm_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(LLM_API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config.llm.api_key.clone().filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "LLM API key found in multiple sources: environment, TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("LLM API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("LLM API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "LLM API key not configured (set {} or [llm] api_key); all LLM calls will use fallbacks",
        LLM_API_KEY_ENV_VAR
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
