//! # Biasprobe Core
//!
//! Core library for probing a RAG assistant for demographic bias.
//! Provides the profile/query catalog, the content-addressed response
//! cache, the acquisition layer over the generative-language service,
//! lexical feature extraction, and the statistical comparison engine.

pub mod acquire;
pub mod cache;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod features;
pub mod lexicon;
pub mod report;
pub mod runner;
pub mod stats;

// Re-export commonly used types at the crate root.
pub use acquire::{AcquisitionService, ResponseProvider, SyntheticProvider, create_provider};
pub use cache::{CachedResponse, RequestKey, ResponseCache, ResponseSource};
pub use catalog::{DEFAULT_SYSTEM_PROMPT, Query, UserProfile, test_profiles, test_queries};
pub use compare::{
    ComparisonEngine, ComparisonRecord, Grouping, GroupingDimension, StatisticalResult,
    default_groupings,
};
pub use config::{ProbeConfig, load_config};
pub use error::{ProbeError, Result, UpstreamError};
pub use features::{FEATURE_NAMES, FeatureExtractor, FeatureVector};
pub use lexicon::Lexicons;
pub use runner::{AnalysisRun, FetchFailure, ProbeRunner};
