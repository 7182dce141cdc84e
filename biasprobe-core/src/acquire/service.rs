//! Cache-fronted fetch service.
//!
//! Composes prompt construction, the content-addressed cache, retry with
//! backoff, and inter-call pacing into a single `fetch` operation: one
//! upstream call per unique (model, prompt, profile, query) tuple, ever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CachedResponse, RequestKey, ResponseCache, ResponseSource};
use crate::catalog::{Query, UserProfile};
use crate::config::{LlmConfig, RetryConfig};
use crate::error::UpstreamError;

use super::{ResponseProvider, with_retry};

/// Acquires responses for (profile, query) pairs through the cache.
pub struct AcquisitionService {
    provider: Arc<dyn ResponseProvider>,
    cache: ResponseCache,
    retry: RetryConfig,
    min_call_interval: Duration,
    last_upstream_call: Option<Instant>,
    upstream_calls: u64,
}

impl AcquisitionService {
    pub fn new(provider: Arc<dyn ResponseProvider>, cache: ResponseCache, llm: &LlmConfig) -> Self {
        Self {
            provider,
            cache,
            retry: llm.retry.clone(),
            min_call_interval: Duration::from_millis(llm.min_call_interval_ms),
            last_upstream_call: None,
            upstream_calls: 0,
        }
    }

    /// Build the personalized system prompt: the base prompt plus the
    /// profile's context block.
    pub fn personalized_prompt(system_prompt: &str, profile: &UserProfile) -> String {
        format!(
            "{system_prompt}\n\nCurrent user context:\n{}",
            profile.to_context()
        )
    }

    /// Build the user-turn message carrying the probe query.
    pub fn user_message(query: &Query) -> String {
        format!("Please answer the following question: {}", query.text)
    }

    /// Fetch the response for a (profile, query) pair.
    ///
    /// Serves from the cache when the fingerprint is already stored.
    /// On a miss, paces against the previous upstream call, invokes the
    /// provider with retry, and persists the result before returning.
    pub async fn fetch(
        &mut self,
        system_prompt: &str,
        profile: &UserProfile,
        query: &Query,
    ) -> Result<CachedResponse, UpstreamError> {
        let prompt = Self::personalized_prompt(system_prompt, profile);
        let message = Self::user_message(query);
        let key = RequestKey::compute(self.provider.model_name(), &prompt, profile, &query.text);

        let provider = self.provider.clone();
        let retry = self.retry.clone();
        let pace_for = self.pacing_delay();
        let model = provider.model_name().to_string();
        let source = if provider.is_synthetic() {
            ResponseSource::Synthetic
        } else {
            ResponseSource::Live
        };

        let (_, misses_before) = self.cache.hit_stats();
        let response = self
            .cache
            .get_or_compute(key, &model, || async move {
                if let Some(delay) = pace_for {
                    tokio::time::sleep(delay).await;
                }
                let text =
                    with_retry(&retry, || provider.complete(&prompt, &message)).await?;
                Ok((text, source))
            })
            .await?;

        let (_, misses_after) = self.cache.hit_stats();
        if misses_after > misses_before {
            self.upstream_calls += 1;
            self.last_upstream_call = Some(Instant::now());
            tracing::debug!(
                profile = %profile.name,
                dimension = %query.bias_dimension,
                source = %response.source,
                "Fetched response from provider"
            );
        }

        Ok(response)
    }

    /// Remaining delay before the next upstream call is allowed. Only live
    /// providers are paced; the synthetic generator has no rate limits.
    fn pacing_delay(&self) -> Option<Duration> {
        if self.provider.is_synthetic() {
            return None;
        }
        let last = self.last_upstream_call?;
        let elapsed = last.elapsed();
        if elapsed < self.min_call_interval {
            Some(self.min_call_interval - elapsed)
        } else {
            None
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResponseCache {
        &mut self.cache
    }

    /// Upstream calls performed this session (cache misses).
    pub fn upstream_calls(&self) -> u64 {
        self.upstream_calls
    }

    pub fn into_cache(self) -> ResponseCache {
        self.cache
    }
}
