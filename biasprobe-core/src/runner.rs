//! End-to-end probe orchestration.
//!
//! Walks the profile/query grid sequentially, acquires each response
//! through the cache-fronted service, extracts features, and hands the
//! records to the comparison engine. A failed fetch is recorded and
//! skipped; it never aborts the rest of the run.

use serde::{Deserialize, Serialize};

use crate::acquire::{AcquisitionService, create_provider};
use crate::cache::{ResponseCache, ResponseSource};
use crate::catalog::{DEFAULT_SYSTEM_PROMPT, Query, UserProfile};
use crate::compare::{ComparisonEngine, ComparisonRecord, Grouping, StatisticalResult};
use crate::config::ProbeConfig;
use crate::error::Result;
use crate::features::FeatureExtractor;

/// A (profile, query) pair whose fetch failed after retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub profile: String,
    pub query: String,
    pub error: String,
}

/// Everything produced by one probe run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// One record per (profile, query) pair that received a response.
    pub records: Vec<ComparisonRecord>,
    pub results: Vec<StatisticalResult>,
    pub failures: Vec<FetchFailure>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub live_responses: usize,
    pub synthetic_responses: usize,
}

impl AnalysisRun {
    pub fn significant_results(&self) -> impl Iterator<Item = &StatisticalResult> {
        self.results.iter().filter(|r| r.significant)
    }

    /// Human-readable run summary.
    pub fn summary(&self) -> String {
        let significant = self.significant_results().count();
        format!(
            "{} responses analyzed ({} live, {} synthetic), {} failures; \
             cache: {} hits / {} misses; {} of {} comparisons significant",
            self.records.len(),
            self.live_responses,
            self.synthetic_responses,
            self.failures.len(),
            self.cache_hits,
            self.cache_misses,
            significant,
            self.results.len(),
        )
    }
}

/// Drives acquisition, extraction, and comparison over a catalog.
pub struct ProbeRunner {
    service: AcquisitionService,
    extractor: FeatureExtractor,
    engine: ComparisonEngine,
    system_prompt: String,
}

impl ProbeRunner {
    pub fn new(
        service: AcquisitionService,
        extractor: FeatureExtractor,
        engine: ComparisonEngine,
        system_prompt: &str,
    ) -> Self {
        Self {
            service,
            extractor,
            engine,
            system_prompt: system_prompt.to_string(),
        }
    }

    /// Assemble a runner from configuration: provider selection, durable
    /// cache, default lexicons, configured significance threshold.
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let provider = create_provider(&config.llm)?;
        let cache = ResponseCache::open(&config.cache.store_path());
        let service = AcquisitionService::new(provider, cache, &config.llm);
        Ok(Self::new(
            service,
            FeatureExtractor::default(),
            ComparisonEngine::new(config.stats.significance_threshold),
            DEFAULT_SYSTEM_PROMPT,
        ))
    }

    /// Run the full probe over `profiles` x `queries`, comparing along
    /// `groupings`.
    pub async fn run(
        &mut self,
        profiles: &[UserProfile],
        queries: &[Query],
        groupings: &[Grouping],
    ) -> Result<AnalysisRun> {
        let total = profiles.len() * queries.len();
        tracing::info!(
            profiles = profiles.len(),
            queries = queries.len(),
            total,
            "Starting probe run"
        );

        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for profile in profiles {
            for query in queries {
                match self.service.fetch(&self.system_prompt, profile, query).await {
                    Ok(response) => {
                        let features = self.extractor.extract(&response.text);
                        records.push(ComparisonRecord {
                            profile: profile.clone(),
                            query: query.clone(),
                            source: response.source,
                            features,
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            profile = %profile.name,
                            query = %query.text,
                            error = %e,
                            "Fetch failed, skipping pair"
                        );
                        failures.push(FetchFailure {
                            profile: profile.name.clone(),
                            query: query.text.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let results = self.engine.compare_all(&records, groupings);
        let (cache_hits, cache_misses) = self.service.cache().hit_stats();
        let live_responses = records
            .iter()
            .filter(|r| r.source == ResponseSource::Live)
            .count();
        let synthetic_responses = records.len() - live_responses;

        let run = AnalysisRun {
            records,
            results,
            failures,
            cache_hits,
            cache_misses,
            live_responses,
            synthetic_responses,
        };
        tracing::info!(summary = %run.summary(), "Probe run complete");
        Ok(run)
    }

    pub fn service(&self) -> &AcquisitionService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut AcquisitionService {
        &mut self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{ResponseProvider, SyntheticProvider};
    use crate::catalog::{test_profiles, test_queries};
    use crate::compare::default_groupings;
    use crate::config::LlmConfig;
    use crate::error::UpstreamError;
    use std::sync::Arc;

    /// Answers like the synthetic provider except for one profile, whose
    /// requests fail with a fatal error.
    struct RevokedKeyProvider {
        inner: SyntheticProvider,
        rejected_user: String,
    }

    #[async_trait::async_trait]
    impl ResponseProvider for RevokedKeyProvider {
        async fn complete(
            &self,
            system_prompt: &str,
            user_message: &str,
        ) -> std::result::Result<String, UpstreamError> {
            if system_prompt.contains(&self.rejected_user) {
                return Err(UpstreamError::AuthFailed {
                    message: "key revoked".into(),
                });
            }
            self.inner.complete(system_prompt, user_message).await
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        fn is_synthetic(&self) -> bool {
            true
        }
    }

    fn runner() -> ProbeRunner {
        let llm = LlmConfig::default();
        let service = AcquisitionService::new(
            Arc::new(SyntheticProvider::new("test-model")),
            ResponseCache::in_memory(),
            &llm,
        );
        ProbeRunner::new(
            service,
            FeatureExtractor::default(),
            ComparisonEngine::new(0.05),
            DEFAULT_SYSTEM_PROMPT,
        )
    }

    #[tokio::test]
    async fn test_run_produces_one_record_per_pair() {
        let mut runner = runner();
        let profiles: Vec<_> = test_profiles().into_iter().take(3).collect();
        let queries: Vec<_> = test_queries().into_iter().take(4).collect();
        let run = runner
            .run(&profiles, &queries, &default_groupings())
            .await
            .unwrap();

        assert_eq!(run.records.len(), 12);
        assert!(run.failures.is_empty());
        assert_eq!(run.synthetic_responses, 12);
        assert_eq!(run.live_responses, 0);
        assert_eq!(run.cache_misses, 12);
    }

    #[tokio::test]
    async fn test_failed_pairs_are_isolated_and_enumerated() {
        let llm = LlmConfig::default();
        let provider = RevokedKeyProvider {
            inner: SyntheticProvider::new("test-model"),
            rejected_user: "User: Sarah Chen".to_string(),
        };
        let service =
            AcquisitionService::new(Arc::new(provider), ResponseCache::in_memory(), &llm);
        let mut runner = ProbeRunner::new(
            service,
            FeatureExtractor::default(),
            ComparisonEngine::new(0.05),
            DEFAULT_SYSTEM_PROMPT,
        );

        let profiles: Vec<_> = test_profiles().into_iter().take(3).collect();
        let queries: Vec<_> = test_queries().into_iter().take(2).collect();
        let run = runner
            .run(&profiles, &queries, &default_groupings())
            .await
            .unwrap();

        // The failing profile loses its pairs; everyone else is analyzed.
        assert_eq!(run.records.len(), 4);
        assert!(run.records.iter().all(|r| r.profile.name != "Sarah Chen"));
        assert_eq!(run.failures.len(), 2);
        for failure in &run.failures {
            assert_eq!(failure.profile, "Sarah Chen");
            assert!(failure.error.contains("Authentication failed"));
        }
        assert!(run.summary().contains("2 failures"));
    }

    #[tokio::test]
    async fn test_rerun_hits_cache() {
        let mut runner = runner();
        let profiles: Vec<_> = test_profiles().into_iter().take(2).collect();
        let queries: Vec<_> = test_queries().into_iter().take(2).collect();
        let groupings = default_groupings();

        runner.run(&profiles, &queries, &groupings).await.unwrap();
        let second = runner.run(&profiles, &queries, &groupings).await.unwrap();

        assert_eq!(second.cache_hits, 4);
        assert_eq!(second.cache_misses, 4);
        assert_eq!(runner.service().upstream_calls(), 4);
    }

    #[tokio::test]
    async fn test_summary_mentions_counts() {
        let mut runner = runner();
        let profiles: Vec<_> = test_profiles().into_iter().take(2).collect();
        let queries: Vec<_> = test_queries().into_iter().take(1).collect();
        let run = runner
            .run(&profiles, &queries, &default_groupings())
            .await
            .unwrap();
        let summary = run.summary();
        assert!(summary.contains("2 responses analyzed"));
        assert!(summary.contains("0 failures"));
    }
}
