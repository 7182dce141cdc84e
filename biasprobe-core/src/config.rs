//! Configuration system for biasprobe.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment. Configuration is loaded from
//! `~/.config/biasprobe/config.toml` and/or an explicit `--config` path,
//! with `BIASPROBE_`-prefixed environment variables on top
//! (e.g. `BIASPROBE_LLM__MODEL`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration for a probe run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub stats: StatsConfig,
    pub report: ReportConfig,
}

/// Configuration for the generative-language service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent to the upstream API.
    pub model: String,
    /// Environment variable holding the API key. Absence of the key is not
    /// an error; it selects the synthetic-response path.
    pub api_key_env: String,
    /// Override for the upstream base URL (None = provider default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Maximum tokens to request per completion.
    pub max_tokens: u32,
    /// Sampling temperature. Kept low for response consistency across runs.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Minimum delay between upstream calls in milliseconds.
    pub min_call_interval_ms: u64,
    /// Retry/backoff behavior for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: None,
            max_tokens: 1000,
            temperature: 0.1,
            request_timeout_secs: 60,
            min_call_interval_ms: 500,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry behavior for transient upstream failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts after the initial call.
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on the backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Multiplier applied per attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Configuration for the durable response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cache store.
    pub dir: PathBuf,
    /// File name of the JSON record store inside `dir`.
    pub file_name: String,
}

impl CacheConfig {
    /// Full path of the durable store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache"),
            file_name: "responses.json".to_string(),
        }
    }
}

/// Configuration for the comparison engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// p-value below which a comparison is flagged significant.
    pub significance_threshold: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.05,
        }
    }
}

/// Configuration for report output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Path for the tidy analysis table.
    pub output_csv: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_csv: PathBuf::from("bias_results.csv"),
        }
    }
}

/// Load configuration with layering: defaults -> user config file ->
/// explicit config file -> `BIASPROBE_` environment variables.
pub fn load_config(config_file: Option<&Path>) -> Result<ProbeConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ProbeConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "biasprobe", "biasprobe") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // BIASPROBE_LLM__MODEL, BIASPROBE_STATS__SIGNIFICANCE_THRESHOLD, etc.
    figment = figment.merge(Env::prefixed("BIASPROBE_").split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.retry.max_retries, 3);
        assert_eq!(config.llm.min_call_interval_ms, 500);
        assert!((config.stats.significance_threshold - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.cache.file_name, "responses.json");
    }

    #[test]
    fn test_store_path_joins_dir_and_file() {
        let cache = CacheConfig {
            dir: PathBuf::from("/tmp/probe"),
            file_name: "r.json".into(),
        };
        assert_eq!(cache.store_path(), PathBuf::from("/tmp/probe/r.json"));
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let result = load_config(Some(Path::new("/nonexistent/biasprobe.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_config_from_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "test-model"
max_tokens = 256

[stats]
significance_threshold = 0.01
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "test-model");
        assert_eq!(config.llm.max_tokens, 256);
        assert!((config.stats.significance_threshold - 0.01).abs() < f64::EPSILON);
        // Unspecified sections keep defaults.
        assert_eq!(config.llm.retry.max_retries, 3);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ProbeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ProbeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.llm.model, config.llm.model);
        assert_eq!(back.cache.dir, config.cache.dir);
    }
}
