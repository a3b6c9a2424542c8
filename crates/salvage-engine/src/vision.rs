use std::path::Path;

use salvage_contracts::analysis::is_meaningful;
use salvage_contracts::events::RequestEvents;
use serde_json::json;

use crate::config::Credential;
use crate::error::StageError;
use crate::providers::{ChatProvider, ChatRequest, ImageAttachment};
use crate::retry::{retry_bounded, Attempt, RetryOutcome};

pub const ANALYSIS_PROMPT_VERSION: &str = "object-analysis/1";
pub const VISION_MAX_TOKENS: u32 = 1000;
pub const VISION_TEMPERATURE: f32 = 0.1;
const IMAGE_DETAIL: &str = "high";

pub const ANALYSIS_PROMPT: &str = "You are an expert in upcycling, repair and resale. \
Examine the object in this photo and describe it in plain prose:
1. What the object is and what it was originally used for
2. The main materials it is made of
3. Its visible condition, including wear, damage or missing parts
4. Its approximate size
5. Its style, era or notable design details
6. A realistic resale value range as it is
7. Its potential for creative reuse or transformation

Be specific and practical. Mention anything that limits or helps reuse.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisionOutcome {
    /// First attempt whose text was long enough to use.
    Analysis { text: String, attempts: u32 },
    /// Every attempt was too short or quota-limited.
    Exhausted { attempts: u32 },
}

/// Sends one image to a vision model with bounded retries.
pub struct VisionAnalyzer<'a> {
    pub provider: &'a dyn ChatProvider,
    pub credential: &'a Credential,
    pub model: &'a str,
    pub max_attempts: u32,
}

impl VisionAnalyzer<'_> {
    /// Quota errors and short answers are retried immediately. Any other
    /// provider error aborts with [`StageError::Remote`].
    pub fn analyze(
        &self,
        image_path: &Path,
        events: &RequestEvents,
    ) -> Result<VisionOutcome, StageError> {
        let api_key = self.credential.api_key();
        if self.provider.requires_credential() && api_key.is_none() {
            return Err(StageError::Configuration);
        }
        if !image_path.is_file() {
            return Err(StageError::NotFound(image_path.to_path_buf()));
        }

        let request = ChatRequest {
            model: self.model.to_string(),
            prompt: ANALYSIS_PROMPT.to_string(),
            image: Some(ImageAttachment::from_path(image_path, IMAGE_DETAIL)?),
            max_tokens: VISION_MAX_TOKENS,
            temperature: VISION_TEMPERATURE,
        };

        let outcome = retry_bounded(self.max_attempts, |attempt| {
            match self.provider.complete(api_key, &request) {
                Ok(text) => {
                    let accepted = is_meaningful(&text);
                    events.record(
                        "vision_attempt",
                        json!({
                            "attempt": attempt,
                            "model": self.model,
                            "chars": text.chars().count(),
                            "accepted": accepted,
                        }),
                    );
                    Ok(if accepted {
                        Attempt::Accepted(text)
                    } else {
                        Attempt::Weak
                    })
                }
                Err(err) if err.is_quota() => {
                    events.record(
                        "vision_attempt",
                        json!({
                            "attempt": attempt,
                            "model": self.model,
                            "accepted": false,
                            "error": err.kind(),
                            "message": err.to_string(),
                        }),
                    );
                    Ok(Attempt::Weak)
                }
                Err(err) => Err(StageError::Remote(err)),
            }
        })?;

        Ok(match outcome {
            RetryOutcome::Accepted { value, attempts } => VisionOutcome::Analysis {
                text: value,
                attempts,
            },
            RetryOutcome::Exhausted { attempts } => VisionOutcome::Exhausted { attempts },
        })
    }
}
