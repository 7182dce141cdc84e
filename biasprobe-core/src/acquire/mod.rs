//! Response acquisition: providers, retry policy, and the caching fetch
//! service.
//!
//! Provides concrete implementations of the `ResponseProvider` trait:
//! - Anthropic Messages API (live upstream calls)
//! - Deterministic synthetic generator (no credential required)
//!
//! Use `create_provider()` to select the provider from configuration:
//! a configured API key selects the live path, its absence selects the
//! synthetic path.

pub mod anthropic;
mod service;
pub mod synthetic;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LlmConfig, RetryConfig};
use crate::error::UpstreamError;

pub use anthropic::AnthropicProvider;
pub use service::AcquisitionService;
pub use synthetic::SyntheticProvider;

/// The narrow contract to the generative-language service.
#[async_trait::async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Perform a completion and return the raw response text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError>;

    /// Return the model name this provider answers as.
    fn model_name(&self) -> &str;

    /// Whether responses from this provider are synthetic.
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// Execute an async operation with exponential backoff retry on transient
/// errors.
///
/// Retries on `RateLimited` (respecting `retry_after_secs`), `Timeout`,
/// and `Connection`. Fatal errors (auth, malformed request, parse) return
/// immediately without a retry.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, UpstreamError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut last_err = None;
    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_transient() || attempt == config.max_retries {
                    return Err(e);
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Retrying after transient upstream error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| UpstreamError::Connection {
        message: "All retry attempts exhausted".to_string(),
    }))
}

/// Compute backoff delay, respecting server-supplied retry-after values.
fn compute_backoff(config: &RetryConfig, attempt: u32, err: &UpstreamError) -> u64 {
    if let UpstreamError::RateLimited { retry_after_secs } = err {
        // Server-controlled value; must not overflow.
        let server_ms = retry_after_secs.saturating_mul(1000);
        let computed = compute_exponential_backoff(config, attempt);
        return server_ms.max(computed);
    }
    compute_exponential_backoff(config, attempt)
}

/// Pure exponential backoff with an upper cap.
fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    base.min(config.max_backoff_ms as f64) as u64
}

/// Create a response provider from configuration.
///
/// A set, non-empty API key environment variable selects the live
/// Anthropic provider. Absence of the key is not an error: it selects the
/// deterministic synthetic generator so the downstream bias-detection
/// pipeline stays exercisable without a credential.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ResponseProvider>, UpstreamError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.is_empty() => {
            tracing::info!(model = %config.model, "Using live upstream provider");
            Ok(Arc::new(AnthropicProvider::new_with_key(config, key)?))
        }
        _ => {
            tracing::info!(
                env = %config.api_key_env,
                "No API key configured, using deterministic synthetic provider"
            );
            Ok(Arc::new(SyntheticProvider::new(&config.model)))
        }
    }
}
