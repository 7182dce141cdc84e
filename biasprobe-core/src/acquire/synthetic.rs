//! Deterministic synthetic response generator.
//!
//! Stands in for the live upstream when no API key is configured. The
//! generator deliberately encodes demographic skews (register varies with
//! pronouns, formality with location, jargon with department, framing with
//! seniority) so the downstream feature extraction and comparison stages
//! have real signal to detect. All choices derive from a content hash of
//! the request, so identical requests always produce identical text.

use sha2::{Digest, Sha256};

use crate::error::UpstreamError;

use super::ResponseProvider;

const FORMAL_LOCATIONS: &[&str] = &[
    "London", "Paris", "Dublin", "Moscow", "Mumbai", "Seoul", "Singapore", "Dubai",
];

const OPENER_FORMAL: &str =
    "Please find the relevant information below; kindly review the referenced documents.";
const OPENER_INFORMAL: &str = "Here's what you'll want to look at, so let's walk through it.";

const NEUTRAL_SENTENCES: &[&str] = &[
    "The internal knowledge base covers this topic in some depth.",
    "Relevant pages are linked from the department wiki.",
    "Recent updates to the handbook clarify the details.",
    "The answer depends on which office and contract applies to you.",
];

const TECHNICAL_SENTENCES: &[&str] = &[
    "Check the logs and trace the request through each API endpoint.",
    "The token refresh flow is documented alongside the authentication architecture.",
    "Validate the database migration state before rolling a new deployment.",
    "Latency regressions usually show up in the microservice dashboards first.",
];

const LEADERSHIP_SENTENCES: &[&str] = &[
    "Take decisive ownership of the outcome and set a clear strategic course.",
    "Strong leadership here means driving execution with a bold vision.",
    "Assert your authority in planning discussions and stay confident in your calls.",
    "Leaders who execute decisively earn the room to lead larger initiatives.",
];

const COMMUNAL_SENTENCES: &[&str] = &[
    "Reach out to colleagues for support and never hesitate to ask for help.",
    "Our most effective people collaborate closely and share context generously.",
    "A supportive, caring environment makes it easier to grow together.",
    "Working as a team and nurturing relationships will serve you well here.",
];

const BEGINNER_SENTENCE: &str =
    "Start with the basics and don't worry if the first steps feel simple.";
const ADVANCED_SENTENCE: &str =
    "As you know, the advanced material assumes deep prior expertise.";

/// Deterministic offline provider with intentionally skewed output.
pub struct SyntheticProvider {
    model: String,
}

impl SyntheticProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: format!("{model}-synthetic"),
        }
    }

    /// Pull the value of a `Label: value` line out of the embedded user
    /// context block.
    fn context_field<'a>(system_prompt: &'a str, label: &str) -> Option<&'a str> {
        let prefix = format!("{label}: ");
        system_prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
            .map(str::trim)
    }

    fn pick<'a>(pool: &[&'a str], byte: u8) -> &'a str {
        pool[byte as usize % pool.len()]
    }
}

#[async_trait::async_trait]
impl ResponseProvider for SyntheticProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, UpstreamError> {
        let mut hasher = Sha256::new();
        hasher.update(system_prompt.as_bytes());
        hasher.update([0x1f]);
        hasher.update(user_message.as_bytes());
        let seed = hasher.finalize();

        let pronouns = Self::context_field(system_prompt, "Pronouns").unwrap_or("");
        let title = Self::context_field(system_prompt, "Title").unwrap_or("");
        let department = Self::context_field(system_prompt, "Department").unwrap_or("");
        let location = Self::context_field(system_prompt, "Location").unwrap_or("");

        let mut sentences: Vec<String> = Vec::new();

        let formal = FORMAL_LOCATIONS.iter().any(|city| location.contains(city));
        sentences.push(if formal { OPENER_FORMAL } else { OPENER_INFORMAL }.to_string());

        sentences.push(Self::pick(NEUTRAL_SENTENCES, seed[0]).to_string());
        sentences.push(Self::pick(NEUTRAL_SENTENCES, seed[0].wrapping_add(1)).to_string());

        let technical_role = matches!(department, "Engineering" | "Analytics" | "IT")
            || ["Engineer", "Developer", "Scientist"]
                .iter()
                .any(|kw| title.contains(kw));
        if technical_role {
            let n = 1 + (seed[1] as usize % 2);
            for i in 0..n {
                sentences.push(Self::pick(TECHNICAL_SENTENCES, seed[2].wrapping_add(i as u8)).to_string());
            }
        }

        // The deliberate gendered register skew.
        let register = match pronouns {
            "he/him" => Some(LEADERSHIP_SENTENCES),
            "she/her" => Some(COMMUNAL_SENTENCES),
            _ => None,
        };
        if let Some(pool) = register {
            let n = 2 + (seed[3] as usize % 3);
            for i in 0..n {
                sentences.push(Self::pick(pool, seed[4].wrapping_add(i as u8)).to_string());
            }
        }

        if title.contains("Junior") || title.contains("Intern") {
            sentences.push(BEGINNER_SENTENCE.to_string());
        } else if ["Senior", "VP", "Principal", "Manager"]
            .iter()
            .any(|kw| title.contains(kw))
        {
            sentences.push(ADVANCED_SENTENCE.to_string());
        }

        Ok(sentences.join(" "))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DEFAULT_SYSTEM_PROMPT, UserProfile};

    fn prompt_for(profile: &UserProfile) -> String {
        format!(
            "{DEFAULT_SYSTEM_PROMPT}\n\nCurrent user context:\n{}",
            profile.to_context()
        )
    }

    fn engineer(name: &str, pronouns: &str) -> UserProfile {
        UserProfile::new(
            name,
            "Senior Software Engineer",
            "Engineering",
            "x@example.com",
            "Tel Aviv",
            4,
            pronouns,
        )
    }

    #[tokio::test]
    async fn test_deterministic_for_identical_requests() {
        let provider = SyntheticProvider::new("test-model");
        let prompt = prompt_for(&engineer("Sarah Chen", "she/her"));
        let a = provider.complete(&prompt, "How do I debug this?").await.unwrap();
        let b = provider.complete(&prompt, "How do I debug this?").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_differs_across_queries() {
        let provider = SyntheticProvider::new("test-model");
        let prompt = prompt_for(&engineer("Sarah Chen", "she/her"));
        let a = provider.complete(&prompt, "Question one?").await.unwrap();
        let b = provider.complete(&prompt, "Question two?").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_register_skew_by_pronouns() {
        let provider = SyntheticProvider::new("test-model");
        let he = provider
            .complete(&prompt_for(&engineer("Michael Chen", "he/him")), "Advice?")
            .await
            .unwrap();
        let she = provider
            .complete(&prompt_for(&engineer("Sarah Chen", "she/her")), "Advice?")
            .await
            .unwrap();
        assert!(he.contains("leadership") || he.contains("decisive") || he.contains("Leaders"));
        assert!(!she.contains("leadership"));
        assert!(she.contains("support") || she.contains("collaborate") || she.contains("team"));
    }

    #[tokio::test]
    async fn test_formality_skew_by_location() {
        let provider = SyntheticProvider::new("test-model");
        let mut london = engineer("Jane Roe", "");
        london.location = "London".to_string();
        let mut austin = engineer("Jane Roe", "");
        austin.location = "Austin, USA".to_string();

        let formal = provider.complete(&prompt_for(&london), "Q?").await.unwrap();
        let informal = provider.complete(&prompt_for(&austin), "Q?").await.unwrap();
        assert!(formal.starts_with("Please find"));
        assert!(informal.starts_with("Here's"));
    }

    #[tokio::test]
    async fn test_technical_terms_follow_role() {
        let provider = SyntheticProvider::new("test-model");
        let eng = engineer("Alex Kim", "");
        let mut hr = engineer("Rachel Green", "");
        hr.title = "Senior Manager".to_string();
        hr.department = "Human Resources".to_string();

        let eng_text = provider.complete(&prompt_for(&eng), "Q?").await.unwrap();
        let hr_text = provider.complete(&prompt_for(&hr), "Q?").await.unwrap();
        let technical = ["API", "token", "database", "Latency"];
        assert!(technical.iter().any(|t| eng_text.contains(t)));
        assert!(!technical.iter().any(|t| hr_text.contains(t)));
    }

    #[tokio::test]
    async fn test_seniority_framing() {
        let provider = SyntheticProvider::new("test-model");
        let mut junior = engineer("Jennifer Smith", "");
        junior.title = "Junior Developer".to_string();
        let senior = engineer("Sarah Chen", "");

        let junior_text = provider.complete(&prompt_for(&junior), "Q?").await.unwrap();
        let senior_text = provider.complete(&prompt_for(&senior), "Q?").await.unwrap();
        assert!(junior_text.contains("Start with the basics"));
        assert!(senior_text.contains("As you know"));
    }
}
