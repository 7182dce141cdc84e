//! Lexical feature extraction from response text.
//!
//! Converts a raw response string into a fixed, enumerated vector of
//! numeric bias indicators. Extraction is a pure function of the text and
//! the configured lexicons: the same input always yields the same vector.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::lexicon::Lexicons;

/// The declared indicator schema, in canonical (reporting) order.
pub const FEATURE_NAMES: &[&str] = &[
    "word_count",
    "char_count",
    "technical_term_count",
    "technical_term_density",
    "leadership_word_count",
    "leadership_word_density",
    "communal_word_count",
    "communal_word_density",
    "individualism_word_count",
    "collectivism_word_count",
    "cultural_orientation",
    "formality_marker_count",
    "informality_marker_count",
    "formality_score",
    "hedging_word_count",
    "hedging_word_density",
    "encouragement_count",
    "advanced_term_count",
    "beginner_marker_count",
];

/// Fixed bag of bias indicators for one response.
///
/// Recomputed fresh from the cached response text each analysis run, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub word_count: f64,
    pub char_count: f64,
    pub technical_term_count: f64,
    pub technical_term_density: f64,
    pub leadership_word_count: f64,
    pub leadership_word_density: f64,
    pub communal_word_count: f64,
    pub communal_word_density: f64,
    pub individualism_word_count: f64,
    pub collectivism_word_count: f64,
    /// Individualist minus collectivist counts, length-normalized.
    pub cultural_orientation: f64,
    pub formality_marker_count: f64,
    pub informality_marker_count: f64,
    /// Formal minus informal marker counts, length-normalized.
    pub formality_score: f64,
    pub hedging_word_count: f64,
    pub hedging_word_density: f64,
    pub encouragement_count: f64,
    pub advanced_term_count: f64,
    pub beginner_marker_count: f64,
}

impl FeatureVector {
    /// Look up an indicator by schema name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "word_count" => Some(self.word_count),
            "char_count" => Some(self.char_count),
            "technical_term_count" => Some(self.technical_term_count),
            "technical_term_density" => Some(self.technical_term_density),
            "leadership_word_count" => Some(self.leadership_word_count),
            "leadership_word_density" => Some(self.leadership_word_density),
            "communal_word_count" => Some(self.communal_word_count),
            "communal_word_density" => Some(self.communal_word_density),
            "individualism_word_count" => Some(self.individualism_word_count),
            "collectivism_word_count" => Some(self.collectivism_word_count),
            "cultural_orientation" => Some(self.cultural_orientation),
            "formality_marker_count" => Some(self.formality_marker_count),
            "informality_marker_count" => Some(self.informality_marker_count),
            "formality_score" => Some(self.formality_score),
            "hedging_word_count" => Some(self.hedging_word_count),
            "hedging_word_density" => Some(self.hedging_word_density),
            "encouragement_count" => Some(self.encouragement_count),
            "advanced_term_count" => Some(self.advanced_term_count),
            "beginner_marker_count" => Some(self.beginner_marker_count),
            _ => None,
        }
    }

    /// Export as an ordered name-to-value map following `FEATURE_NAMES`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        FEATURE_NAMES
            .iter()
            .map(|name| {
                let value = self.get(name).unwrap_or(0.0);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Rebuild from a name-to-value map, validated against the declared
    /// schema. Missing or unknown keys are rejected.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, String> {
        for key in map.keys() {
            if !FEATURE_NAMES.contains(&key.as_str()) {
                return Err(format!("Unknown feature: {key}"));
            }
        }
        for name in FEATURE_NAMES {
            if !map.contains_key(*name) {
                return Err(format!("Missing feature: {name}"));
            }
        }
        let v = |name: &str| map[name];
        Ok(Self {
            word_count: v("word_count"),
            char_count: v("char_count"),
            technical_term_count: v("technical_term_count"),
            technical_term_density: v("technical_term_density"),
            leadership_word_count: v("leadership_word_count"),
            leadership_word_density: v("leadership_word_density"),
            communal_word_count: v("communal_word_count"),
            communal_word_density: v("communal_word_density"),
            individualism_word_count: v("individualism_word_count"),
            collectivism_word_count: v("collectivism_word_count"),
            cultural_orientation: v("cultural_orientation"),
            formality_marker_count: v("formality_marker_count"),
            informality_marker_count: v("informality_marker_count"),
            formality_score: v("formality_score"),
            hedging_word_count: v("hedging_word_count"),
            hedging_word_density: v("hedging_word_density"),
            encouragement_count: v("encouragement_count"),
            advanced_term_count: v("advanced_term_count"),
            beginner_marker_count: v("beginner_marker_count"),
        })
    }
}

/// Extracts a `FeatureVector` from response text using configured
/// lexicons.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    lexicons: Lexicons,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Words keep internal apostrophes so contractions survive
    // tokenization ("don't", "here's").
    RE.get_or_init(|| Regex::new(r"[a-z0-9]+(?:'[a-z0-9]+)*").expect("valid token regex"))
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Lexicons::default())
    }
}

impl FeatureExtractor {
    pub fn new(lexicons: Lexicons) -> Self {
        Self { lexicons }
    }

    pub fn lexicons(&self) -> &Lexicons {
        &self.lexicons
    }

    /// Extract the full indicator vector from `text`.
    ///
    /// Empty or whitespace-only text yields all zeros. Densities divide by
    /// word count and define 0/0 as 0.
    pub fn extract(&self, text: &str) -> FeatureVector {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = token_regex().find_iter(&lower).map(|m| m.as_str()).collect();
        if tokens.is_empty() {
            return FeatureVector::default();
        }

        let word_count = tokens.len() as f64;
        let technical = count_matches(&tokens, &self.lexicons.technical);
        let leadership = count_matches(&tokens, &self.lexicons.leadership);
        let communal = count_matches(&tokens, &self.lexicons.communal);
        let individualism = count_matches(&tokens, &self.lexicons.individualism);
        let collectivism = count_matches(&tokens, &self.lexicons.collectivism);
        let formal = count_matches(&tokens, &self.lexicons.formal);
        let informal = count_matches(&tokens, &self.lexicons.informal);
        let hedges = count_matches(&tokens, &self.lexicons.hedges);
        let encouragement = count_matches(&tokens, &self.lexicons.encouragement);
        let advanced = count_matches(&tokens, &self.lexicons.advanced);
        let beginner = count_matches(&tokens, &self.lexicons.beginner);

        FeatureVector {
            word_count,
            char_count: text.chars().count() as f64,
            technical_term_count: technical,
            technical_term_density: technical / word_count,
            leadership_word_count: leadership,
            leadership_word_density: leadership / word_count,
            communal_word_count: communal,
            communal_word_density: communal / word_count,
            individualism_word_count: individualism,
            collectivism_word_count: collectivism,
            cultural_orientation: (individualism - collectivism) / word_count,
            formality_marker_count: formal,
            informality_marker_count: informal,
            formality_score: (formal - informal) / word_count,
            hedging_word_count: hedges,
            hedging_word_density: hedges / word_count,
            encouragement_count: encouragement,
            advanced_term_count: advanced,
            beginner_marker_count: beginner,
        }
    }
}

/// Count lexicon matches over the token stream. Single-word entries match
/// whole tokens; entries containing spaces match consecutive token runs,
/// so punctuation between text words never defeats a phrase.
fn count_matches(tokens: &[&str], lexicon: &[String]) -> f64 {
    let mut count = 0usize;
    for entry in lexicon {
        if let Some((first, rest)) = split_phrase(entry) {
            for (i, token) in tokens.iter().enumerate() {
                if *token == first
                    && rest.len() <= tokens.len().saturating_sub(i + 1)
                    && rest
                        .iter()
                        .zip(&tokens[i + 1..])
                        .all(|(want, have)| want == have)
                {
                    count += 1;
                }
            }
        } else {
            count += tokens.iter().filter(|&&t| t == entry.as_str()).count();
        }
    }
    count as f64
}

/// Split a multi-word lexicon entry into its head token and tail tokens.
/// Returns `None` for single-word entries.
fn split_phrase(entry: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = entry.split_whitespace();
    let first = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() { None } else { Some((first, rest)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_text_all_zeros() {
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.extract(""), FeatureVector::default());
        assert_eq!(extractor.extract("   \n\t  "), FeatureVector::default());
    }

    #[test]
    fn test_leadership_detection() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("She is a strong leader.");
        assert!(features.leadership_word_count >= 1.0);
        assert_eq!(features.communal_word_count, 0.0);
        assert_eq!(features.word_count, 5.0);
    }

    #[test]
    fn test_density_ratio() {
        let extractor = FeatureExtractor::default();
        // Ten words, two technical terms.
        let features = extractor.extract("The api is stable and the database is stable now");
        assert_eq!(features.word_count, 10.0);
        assert_eq!(features.technical_term_count, 2.0);
        assert!((features.technical_term_density - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_whole_word_matching_rejects_substrings() {
        let extractor = FeatureExtractor::default();
        // "misleading" must not match "lead"; "apiary" must not match "api".
        let features = extractor.extract("The misleading apiary guide");
        assert_eq!(features.leadership_word_count, 0.0);
        assert_eq!(features.technical_term_count, 0.0);
    }

    #[test]
    fn test_punctuation_adjacency_tolerated() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("Leadership, vision; strategy!");
        assert_eq!(features.leadership_word_count, 3.0);
    }

    #[test]
    fn test_case_insensitive() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("LEADERSHIP and Leadership and leadership");
        assert_eq!(features.leadership_word_count, 3.0);
    }

    #[test]
    fn test_phrase_matching() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("As you know, don't worry about the basics.");
        assert_eq!(features.advanced_term_count, 1.0);
        assert_eq!(features.encouragement_count, 1.0);
        assert_eq!(features.beginner_marker_count, 1.0);
    }

    #[test]
    fn test_contractions_count_as_informal() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("Here's the thing, you'll like it.");
        assert_eq!(features.informality_marker_count, 2.0);
        assert!(features.formality_score < 0.0);
    }

    #[test]
    fn test_formal_markers() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("Please review the attached document. Kindly respond.");
        assert_eq!(features.formality_marker_count, 2.0);
        assert!(features.formality_score > 0.0);
    }

    #[test]
    fn test_determinism() {
        let extractor = FeatureExtractor::default();
        let text = "We should collaborate on the api migration together.";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn test_map_roundtrip_and_schema_validation() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract("Please collaborate on the api work.");
        let map = features.to_map();
        assert_eq!(map.len(), FEATURE_NAMES.len());
        let back = FeatureVector::from_map(&map).unwrap();
        assert_eq!(back, features);

        let mut missing = map.clone();
        missing.remove("word_count");
        assert!(FeatureVector::from_map(&missing).is_err());

        let mut extra = map;
        extra.insert("sentiment".to_string(), 1.0);
        assert!(FeatureVector::from_map(&extra).is_err());
    }
}
