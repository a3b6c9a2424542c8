use salvage_contracts::analysis::is_meaningful;
use salvage_contracts::recommendations::{Section, MAX_ITEMS_PER_SECTION};

use crate::config::Credential;
use crate::providers::{ChatProvider, ChatRequest};

pub const RECOMMENDATION_MAX_TOKENS: u32 = 2000;
pub const RECOMMENDATION_TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CredentialUnconfigured,
    AnalysisTooShort,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::CredentialUnconfigured => "credential_unconfigured",
            SkipReason::AnalysisTooShort => "analysis_too_short",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// Unparsed model output.
    Raw(String),
    Skipped(SkipReason),
    Failed { kind: &'static str, message: String },
}

/// Prompt asking for the five fixed section headings, each with six numbered items.
pub fn recommendations_prompt(analysis: &str) -> String {
    let mut prompt = format!(
        "Here is an analysis of a salvaged object:\n\n{}\n\n\
         Suggest practical ways to reuse, sell or learn from it. Use exactly these \
         headings, each followed by a numbered list of exactly {MAX_ITEMS_PER_SECTION} \
         one-line items:\n\n",
        analysis.trim()
    );
    for section in Section::ALL {
        prompt.push_str(&format!("### {}\n", section.heading()));
    }
    prompt.push_str("\nDo not add other headings or closing remarks.");
    prompt
}

/// Single-shot text call turning an analysis into raw recommendation text.
pub struct RecommendationSynthesizer<'a> {
    pub provider: &'a dyn ChatProvider,
    pub credential: &'a Credential,
    pub model: &'a str,
}

impl RecommendationSynthesizer<'_> {
    /// Never errors; skipped or failed calls leave parsing nothing to work with.
    pub fn synthesize(&self, analysis: &str) -> Synthesis {
        let api_key = self.credential.api_key();
        if self.provider.requires_credential() && api_key.is_none() {
            return Synthesis::Skipped(SkipReason::CredentialUnconfigured);
        }
        if !is_meaningful(analysis) {
            return Synthesis::Skipped(SkipReason::AnalysisTooShort);
        }

        let request = ChatRequest {
            model: self.model.to_string(),
            prompt: recommendations_prompt(analysis),
            image: None,
            max_tokens: RECOMMENDATION_MAX_TOKENS,
            temperature: RECOMMENDATION_TEMPERATURE,
        };
        match self.provider.complete(api_key, &request) {
            Ok(text) => Synthesis::Raw(text),
            Err(err) => Synthesis::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use salvage_contracts::recommendations::{detect_heading, Section};

    use super::{recommendations_prompt, RecommendationSynthesizer, SkipReason, Synthesis};
    use crate::config::Credential;
    use crate::testing::{Reply, ScriptedProvider, FORMATTED_RECOMMENDATIONS, LONG_ANALYSIS};

    fn synthesize(provider: &ScriptedProvider, credential: &Credential, analysis: &str) -> Synthesis {
        RecommendationSynthesizer {
            provider,
            credential,
            model: "gpt-4o-mini",
        }
        .synthesize(analysis)
    }

    #[test]
    fn short_analysis_never_reaches_the_provider() {
        let provider = ScriptedProvider::new("openai");
        let outcome = synthesize(&provider, &Credential::new("sk-test"), "A chair.");
        assert_eq!(outcome, Synthesis::Skipped(SkipReason::AnalysisTooShort));
        assert_eq!(provider.log().text_calls(), 0);
    }

    #[test]
    fn unconfigured_credential_skips_the_call() {
        let provider = ScriptedProvider::new("openai");
        let outcome = synthesize(&provider, &Credential::Unconfigured, LONG_ANALYSIS);
        assert_eq!(outcome, Synthesis::Skipped(SkipReason::CredentialUnconfigured));
        assert_eq!(provider.log().text_calls(), 0);
    }

    #[test]
    fn provider_text_is_returned_raw() {
        let provider = ScriptedProvider::new("openai");
        let outcome = synthesize(&provider, &Credential::new("sk-test"), LONG_ANALYSIS);
        assert_eq!(outcome, Synthesis::Raw(FORMATTED_RECOMMENDATIONS.to_string()));
        assert_eq!(provider.log().text_calls(), 1);
    }

    #[test]
    fn provider_failure_is_reported_not_raised() {
        let provider = ScriptedProvider::new("openai").text_default(Reply::Quota);
        let outcome = synthesize(&provider, &Credential::new("sk-test"), LONG_ANALYSIS);
        assert!(matches!(
            outcome,
            Synthesis::Failed {
                kind: "quota_exceeded",
                ..
            }
        ));
        assert_eq!(provider.log().text_calls(), 1);
    }

    #[test]
    fn prompt_lists_every_heading_in_order() {
        let prompt = recommendations_prompt(LONG_ANALYSIS);
        let headings: Vec<Section> = prompt
            .lines()
            .filter(|line| line.starts_with("###"))
            .filter_map(detect_heading)
            .collect();
        assert_eq!(headings, Section::ALL);
        assert!(prompt.contains("oak dining chair"));
    }
}
