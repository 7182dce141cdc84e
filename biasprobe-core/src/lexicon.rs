//! Curated word lists for lexical bias indicators.
//!
//! The lists are configuration, not logic: the extractor takes a
//! `Lexicons` value, so callers can swap or extend lists to probe new
//! bias dimensions without touching extraction code. Lists include
//! inflected forms because matching is whole-word.

use serde::{Deserialize, Serialize};

/// Pluggable word lists consumed by the feature extractor.
///
/// Entries containing a space are matched as phrases over the normalized
/// token stream; single words are matched as whole tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicons {
    /// Domain/technical jargon.
    pub technical: Vec<String>,
    /// Agentic, leadership-coded terms.
    pub leadership: Vec<String>,
    /// Communal, relationship-coded terms.
    pub communal: Vec<String>,
    /// Individualist framing.
    pub individualism: Vec<String>,
    /// Collectivist framing.
    pub collectivism: Vec<String>,
    /// Formal register markers.
    pub formal: Vec<String>,
    /// Informal register markers (contractions, colloquialisms).
    pub informal: Vec<String>,
    /// Hedging/uncertainty markers.
    pub hedges: Vec<String>,
    /// Encouragement and reassurance phrases.
    pub encouragement: Vec<String>,
    /// Terms assuming advanced expertise.
    pub advanced: Vec<String>,
    /// Terms accommodating beginners.
    pub beginner: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Lexicons {
    fn default() -> Self {
        Self {
            technical: words(&[
                "api", "apis", "endpoint", "endpoints", "token", "tokens", "oauth", "oauth2",
                "database", "databases", "migration", "deployment", "deployments", "latency",
                "microservice", "microservices", "architecture", "authentication", "backend",
                "frontend", "kubernetes", "docker", "cache", "caching", "algorithm", "algorithms",
                "implementation", "protocol", "protocols", "infrastructure", "debugging", "logs",
                "server", "servers", "query", "queries", "schema",
            ]),
            leadership: words(&[
                "lead", "leads", "leader", "leaders", "leadership", "leading", "manage",
                "manages", "managing", "management", "direct", "directs", "directing",
                "decisive", "decisively", "assertive", "confident", "confidently", "strategic",
                "strategy", "vision", "drive", "drives", "driving", "driven", "execute",
                "executes", "execution", "ownership", "authority", "ambitious", "competitive",
                "assert",
            ]),
            communal: words(&[
                "support", "supports", "supportive", "supporting", "help", "helps", "helpful",
                "helping", "collaborate", "collaborates", "collaboration", "collaborative",
                "team", "teams", "teamwork", "together", "caring", "nurture", "nurturing",
                "empathetic", "empathy", "cooperative", "cooperation", "share", "shares",
                "sharing", "community", "relationships", "colleagues",
            ]),
            individualism: words(&[
                "you", "your", "yourself", "individual", "individually", "personal",
                "personally", "own", "independent", "independently", "self",
            ]),
            collectivism: words(&[
                "we", "our", "us", "everyone", "group", "groups", "collective", "collectively",
                "organization", "department", "company",
            ]),
            formal: words(&[
                "please", "kindly", "furthermore", "moreover", "regarding", "accordingly",
                "therefore", "respectively", "pursuant", "herein",
            ]),
            informal: words(&[
                "here's", "you'll", "you're", "let's", "don't", "can't", "won't", "it's",
                "gonna", "wanna", "hey", "cool", "stuff", "btw", "yeah",
            ]),
            hedges: words(&[
                "might", "may", "maybe", "perhaps", "possibly", "probably", "could",
                "should", "usually", "generally", "typically", "somewhat", "likely",
            ]),
            encouragement: words(&[
                "great question", "don't worry", "you've got this", "well done", "good luck",
                "feel free", "happy to help", "no problem",
            ]),
            advanced: words(&[
                "as you know", "advanced", "expertise", "internals", "sophisticated",
                "in depth", "deep dive", "nontrivial",
            ]),
            beginner: words(&[
                "basics", "basic", "simple", "simply", "step by step", "start with",
                "introduction", "beginner", "beginners", "easy", "easily",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_nonempty_and_lowercase() {
        let lex = Lexicons::default();
        for list in [
            &lex.technical,
            &lex.leadership,
            &lex.communal,
            &lex.individualism,
            &lex.collectivism,
            &lex.formal,
            &lex.informal,
            &lex.hedges,
            &lex.encouragement,
            &lex.advanced,
            &lex.beginner,
        ] {
            assert!(!list.is_empty());
            for word in list {
                assert_eq!(word, &word.to_lowercase(), "lexicon entry not lowercase");
            }
        }
    }

    #[test]
    fn test_leadership_and_communal_disjoint() {
        let lex = Lexicons::default();
        for word in &lex.leadership {
            assert!(
                !lex.communal.contains(word),
                "{word} appears in both leadership and communal lists"
            );
        }
    }

    #[test]
    fn test_serde_roundtrip() {
        let lex = Lexicons::default();
        let json = serde_json::to_string(&lex).unwrap();
        let back: Lexicons = serde_json::from_str(&json).unwrap();
        assert_eq!(back.leadership, lex.leadership);
    }
}
