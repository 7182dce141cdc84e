//! Integration tests driving the full probe pipeline offline: synthetic
//! provider, durable cache, feature extraction, and statistical
//! comparison.

use std::sync::Arc;

use biasprobe_core::{
    AcquisitionService, ComparisonEngine, FeatureExtractor, Grouping, GroupingDimension,
    ProbeRunner, ResponseCache, SyntheticProvider, default_groupings, test_profiles, test_queries,
    DEFAULT_SYSTEM_PROMPT,
};
use biasprobe_core::config::LlmConfig;
use tempfile::TempDir;

fn offline_runner(cache: ResponseCache) -> ProbeRunner {
    let llm = LlmConfig::default();
    let service = AcquisitionService::new(
        Arc::new(SyntheticProvider::new("probe-model")),
        cache,
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
async fn test_full_catalog_run() {
    let mut runner = offline_runner(ResponseCache::in_memory());
    let profiles = test_profiles();
    let queries = test_queries();
    let run = runner
        .run(&profiles, &queries, &default_groupings())
        .await
        .unwrap();

    assert_eq!(run.records.len(), profiles.len() * queries.len());
    assert!(run.failures.is_empty());
    assert_eq!(run.synthetic_responses, run.records.len());
    // Every record carries a non-empty response.
    assert!(run.records.iter().all(|r| r.features.word_count > 0.0));
}

#[tokio::test]
async fn test_detects_gendered_leadership_skew() {
    let mut runner = offline_runner(ResponseCache::in_memory());
    let profiles = test_profiles();
    let queries = test_queries();
    let run = runner
        .run(&profiles, &queries, &default_groupings())
        .await
        .unwrap();

    let engine = ComparisonEngine::new(0.05);
    let result = engine.compare(
        &run.records,
        &Grouping::single(GroupingDimension::Gender),
        "leadership_word_count",
    );
    assert_eq!(result.test_name, "welch_t");
    assert!(result.skip_reason.is_none());
    assert!(
        result.significant,
        "expected significant gender skew, got p={:?}",
        result.p_value
    );
    assert!(result.p_value.unwrap() < 0.05);

    // The communal side of the same skew.
    let communal = engine.compare(
        &run.records,
        &Grouping::single(GroupingDimension::Gender),
        "communal_word_count",
    );
    assert!(communal.significant);
}

#[tokio::test]
async fn test_detects_departmental_technical_skew() {
    let mut runner = offline_runner(ResponseCache::in_memory());
    let profiles = test_profiles();
    let queries = test_queries();
    let run = runner
        .run(&profiles, &queries, &default_groupings())
        .await
        .unwrap();

    let engine = ComparisonEngine::new(0.05);
    let result = engine.compare(
        &run.records,
        &Grouping::single(GroupingDimension::Department),
        "technical_term_count",
    );
    assert_eq!(result.test_name, "anova");
    assert!(result.significant);
    assert!(result.needs_pairwise);
}

#[tokio::test]
async fn test_restart_serves_everything_from_cache() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("responses.json");
    let profiles: Vec<_> = test_profiles().into_iter().take(4).collect();
    let queries: Vec<_> = test_queries().into_iter().take(5).collect();
    let groupings = default_groupings();

    let first = {
        let mut runner = offline_runner(ResponseCache::open(&store));
        runner.run(&profiles, &queries, &groupings).await.unwrap()
    };
    assert_eq!(first.cache_misses, 20);
    assert!(store.exists());

    // A fresh process over the same store must not reach upstream at all.
    let mut runner = offline_runner(ResponseCache::open(&store));
    let second = runner.run(&profiles, &queries, &groupings).await.unwrap();
    assert_eq!(second.cache_misses, 0);
    assert_eq!(second.cache_hits, 20);
    assert_eq!(runner.service().upstream_calls(), 0);

    // Identical inputs, identical analysis output.
    assert_eq!(first.records.len(), second.records.len());
    for (a, b) in first.records.iter().zip(&second.records) {
        assert_eq!(a.features, b.features);
    }
    assert_eq!(first.results.len(), second.results.len());
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.dimension, b.dimension);
        assert_eq!(a.feature, b.feature);
        assert_eq!(a.p_value, b.p_value);
        assert_eq!(a.significant, b.significant);
    }
}

#[tokio::test]
async fn test_report_tables_write_cleanly() {
    let dir = TempDir::new().unwrap();
    let mut runner = offline_runner(ResponseCache::in_memory());
    let profiles: Vec<_> = test_profiles().into_iter().take(3).collect();
    let queries: Vec<_> = test_queries().into_iter().take(3).collect();
    let run = runner
        .run(&profiles, &queries, &default_groupings())
        .await
        .unwrap();

    let records_path = dir.path().join("analysis.csv");
    let results_path = dir.path().join("results.csv");
    biasprobe_core::report::write_records_csv(&records_path, &run.records).unwrap();
    biasprobe_core::report::write_results_csv(&results_path, &run.results).unwrap();

    let records_csv = std::fs::read_to_string(&records_path).unwrap();
    assert_eq!(records_csv.lines().count(), 1 + run.records.len());
    let results_csv = std::fs::read_to_string(&results_path).unwrap();
    assert_eq!(results_csv.lines().count(), 1 + run.results.len());
}
