//! Configuration loading and config file resolution
//!
//! Resolution order for the TOML file:
//! 1. Command-line argument (highest priority)
//! 2. `VERITAS_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/veritas/veritas.toml`)
//! 4. Compiled defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VERITAS_CONFIG";

/// Default bind address for the HTTP service
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Listen address, e.g. "127.0.0.1:5780"
    pub bind_address: Option<String>,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
    pub fetch: FetchConfig,
    pub search: SearchConfig,
    pub validators: ValidatorEndpoints,
    pub sessions: SessionConfig,
    /// Extra domain entries merged over the built-in credibility table
    pub credibility: Vec<CredibilityEntry>,
}

/// Logging section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// LLM oracle section (OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 20,
            requests_per_second: 5,
        }
    }
}

/// Source content fetch section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_chars: usize,
    /// Response bytes read before the rest of the page is dropped
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_chars: 3000,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Source search section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint accepting `?q=<query>`; unset disables source discovery
    pub endpoint: Option<String>,
    pub max_sources: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_sources: 5,
        }
    }
}

/// Per-modality validator oracle endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorEndpoints {
    pub text: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub audio: Option<String>,
}

/// Session progress store section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds after the last append before a session log is evicted
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

/// Extra credibility table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredibilityEntry {
    pub domain: String,
    pub score: u8,
    pub category: String,
    pub publisher: Option<String>,
}

impl TomlConfig {
    /// Bind address with the compiled default applied
    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    /// Resolve and load configuration
    ///
    /// Returns defaults when no file is found. An explicitly named file
    /// (CLI or environment) that does not exist is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg, CONFIG_ENV_VAR)? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)
            }
            None => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Resolve the configuration file path following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_exists(path.to_path_buf()).map(Some);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return require_exists(PathBuf::from(path)).map(Some);
        }
    }

    // Priority 3: Platform config directory
    if let Some(path) = default_config_path() {
        if path.exists() {
            return Ok(Some(path));
        }
        debug!("Default config file not present: {}", path.display());
    }

    // Priority 4: Compiled defaults
    Ok(None)
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("veritas").join("veritas.toml"))
}

/// Read and parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

fn require_exists(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )))
    }
}
