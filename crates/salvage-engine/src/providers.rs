use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use salvage_contracts::recommendations::Section;
use serde_json::{json, Value};

use crate::error::{ProviderError, StageError};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ERROR_BODY_MAX_CHARS: usize = 512;

/// Base64 image payload sent alongside a vision prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub base64_data: String,
    /// Resolution hint forwarded to the model, e.g. `high`.
    pub detail: String,
}

impl ImageAttachment {
    /// Reads and encodes `path`. Unknown extensions are sent as JPEG, which is
    /// what preprocessing emits.
    pub fn from_path(path: &Path, detail: &str) -> Result<Self, StageError> {
        let bytes = fs::read(path).map_err(|source| StageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            mime_type: mime_for_path(path).unwrap_or("image/jpeg").to_string(),
            base64_data: BASE64.encode(bytes),
            detail: detail.to_string(),
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    fn requires_credential(&self) -> bool {
        true
    }

    /// Returns the first choice's text. Empty text is a valid, weak, answer.
    fn complete(&self, api_key: Option<&str>, request: &ChatRequest)
        -> Result<String, ProviderError>;
}

#[derive(Default)]
pub struct ChatProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ChatProvider>>,
}

impl ChatProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ChatProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub fn default_provider_registry(request_timeout: Duration) -> ChatProviderRegistry {
    let mut providers = ChatProviderRegistry::new();
    providers.register(DryrunProvider);
    providers.register(OpenAiProvider::new(request_timeout));
    providers
}

/// OpenAI-compatible chat completions over blocking HTTP.
pub struct OpenAiProvider {
    api_base: String,
    request_timeout: Duration,
    http: HttpClient,
}

impl OpenAiProvider {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            api_base: env::var("OPENAI_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            request_timeout,
            http: HttpClient::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn payload(request: &ChatRequest) -> Value {
        let content = match &request.image {
            Some(image) => json!([
                { "type": "text", "text": request.prompt },
                {
                    "type": "image_url",
                    "image_url": { "url": image.data_url(), "detail": image.detail },
                },
            ]),
            None => Value::String(request.prompt.clone()),
        };
        json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        })
    }
}

impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete(
        &self,
        api_key: Option<&str>,
        request: &ChatRequest,
    ) -> Result<String, ProviderError> {
        let Some(api_key) = api_key else {
            return Err(ProviderError::MissingCredential {
                provider: self.name().to_string(),
            });
        };
        let transport = |source| ProviderError::Transport {
            provider: self.name().to_string(),
            source,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(self.request_timeout)
            .json(&Self::payload(request))
            .send()
            .map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(transport)?;
        if !(200..300).contains(&status) {
            return Err(classify_failure(self.name(), status, &body));
        }

        let parsed: Value =
            serde_json::from_str(&body).map_err(|err| ProviderError::InvalidResponse {
                provider: self.name().to_string(),
                message: format!("invalid JSON payload: {err}"),
            })?;
        extract_message_text(&parsed).ok_or_else(|| ProviderError::InvalidResponse {
            provider: self.name().to_string(),
            message: "missing choices[0].message.content".to_string(),
        })
    }
}

/// Offline provider with canned answers. Needs no credential.
pub struct DryrunProvider;

const DRYRUN_ANALYSIS: &str = "Object: a solid wooden chair with a slatted back. \
Material: hardwood with a worn varnish finish. Condition: structurally sound with \
surface scratches on the seat and legs. Size: standard dining height. Style: simple \
farmhouse design. Value: modest resale value, higher after refinishing. Potential: \
well suited to sanding, painting, reupholstering or conversion into a plant stand.";

const DRYRUN_ITEMS: [(Section, [&str; 3]); 5] = [
    (
        Section::DiyIdeas,
        [
            "Sand and repaint in a bold accent color",
            "Add a cushioned seat with fresh upholstery",
            "Convert into a small plant stand",
        ],
    ),
    (
        Section::Monetization,
        [
            "Sell refinished through local classifieds",
            "Offer custom painting for matching sets",
            "Bundle with a table as a dining set",
        ],
    ),
    (
        Section::Sustainability,
        [
            "Keeps hardwood furniture out of landfill",
            "Avoids the footprint of new manufacturing",
            "Extends the life of existing materials",
        ],
    ),
    (
        Section::Tutorials,
        [
            "Stripping and sanding old varnish",
            "Basic seat reupholstery",
            "Choosing a durable furniture finish",
        ],
    ),
    (
        Section::MarketplaceSuggestions,
        [
            "Etsy",
            "Facebook groups for local resale",
            "Local consignment shops",
        ],
    ),
];

fn dryrun_recommendations() -> String {
    let mut out = String::new();
    for (section, items) in DRYRUN_ITEMS {
        out.push_str(&format!("### {}\n", section.heading()));
        for (idx, item) in items.iter().enumerate() {
            out.push_str(&format!("{}. {item}\n", idx + 1));
        }
        out.push('\n');
    }
    out
}

impl ChatProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn complete(
        &self,
        _api_key: Option<&str>,
        request: &ChatRequest,
    ) -> Result<String, ProviderError> {
        if request.image.is_some() {
            Ok(DRYRUN_ANALYSIS.to_string())
        } else {
            Ok(dryrun_recommendations())
        }
    }
}

/// HTTP 429 or a body mentioning quota is quota-class; anything else is a plain failure.
pub(crate) fn classify_failure(provider: &str, status: u16, body: &str) -> ProviderError {
    let message = truncate_text(body, ERROR_BODY_MAX_CHARS);
    if status == 429 || body.to_lowercase().contains("quota") {
        ProviderError::QuotaExceeded {
            provider: provider.to_string(),
            message,
        }
    } else {
        ProviderError::Http {
            provider: provider.to_string(),
            status,
            body: message,
        }
    }
}

fn extract_message_text(payload: &Value) -> Option<String> {
    let content = payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?;
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

pub(crate) fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    use salvage_contracts::recommendations::{parse_recommendations, Coverage};
    use serde_json::json;

    use super::*;

    fn vision_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".to_string(),
            prompt: "Describe the object.".to_string(),
            image: Some(ImageAttachment {
                mime_type: "image/png".to_string(),
                base64_data: "AAAA".to_string(),
                detail: "high".to_string(),
            }),
            max_tokens: 1000,
            temperature: 0.1,
        }
    }

    #[test]
    fn vision_payload_embeds_data_url_with_detail() {
        let payload = OpenAiProvider::payload(&vision_request());
        assert_eq!(payload["model"], json!("gpt-4o"));
        assert_eq!(payload["max_tokens"], json!(1000));
        let content = &payload["messages"][0]["content"];
        assert_eq!(content[0]["text"], json!("Describe the object."));
        assert_eq!(
            content[1]["image_url"]["url"],
            json!("data:image/png;base64,AAAA")
        );
        assert_eq!(content[1]["image_url"]["detail"], json!("high"));
    }

    #[test]
    fn text_payload_sends_plain_prompt() {
        let mut request = vision_request();
        request.image = None;
        let payload = OpenAiProvider::payload(&request);
        assert_eq!(
            payload["messages"][0]["content"],
            json!("Describe the object.")
        );
    }

    #[test]
    fn quota_failures_are_recognized_by_status_or_body() {
        assert!(classify_failure("openai", 429, "slow down").is_quota());
        assert!(classify_failure(
            "openai",
            400,
            r#"{"error":{"code":"insufficient_quota"}}"#
        )
        .is_quota());
        let err = classify_failure("openai", 500, "internal error");
        assert!(!err.is_quota());
        assert_eq!(err.kind(), "http");
    }

    #[test]
    fn message_text_is_read_from_first_choice() {
        let payload = json!({ "choices": [{ "message": { "content": "A chair." } }] });
        assert_eq!(extract_message_text(&payload).as_deref(), Some("A chair."));
        assert_eq!(extract_message_text(&json!({ "choices": [] })), None);
    }

    #[test]
    fn attachment_uses_extension_mime_and_falls_back_to_jpeg() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let png = temp.path().join("chair.PNG");
        fs::write(&png, b"abc")?;
        let attachment = ImageAttachment::from_path(&png, "high")?;
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.base64_data, "YWJj");

        let odd = temp.path().join("chair.bin");
        fs::write(&odd, b"abc")?;
        assert_eq!(ImageAttachment::from_path(&odd, "high")?.mime_type, "image/jpeg");

        let missing = ImageAttachment::from_path(Path::new("/nope/missing.png"), "high");
        assert!(matches!(missing, Err(StageError::Io { .. })));
        Ok(())
    }

    #[test]
    fn openai_without_key_refuses_before_any_request() {
        let provider = OpenAiProvider::new(Duration::from_secs(1));
        let err = provider.complete(None, &vision_request()).unwrap_err();
        assert_eq!(err.kind(), "missing_credential");
    }

    #[test]
    fn dryrun_recommendations_parse_into_full_coverage() -> anyhow::Result<()> {
        let provider = DryrunProvider;
        assert!(!provider.requires_credential());
        let mut request = vision_request();
        request.image = None;
        let text = provider.complete(None, &request)?;
        let parsed = parse_recommendations(&text);
        assert_eq!(parsed.coverage(), Coverage::Full);
        assert_eq!(parsed.diy_ideas().len(), 3);
        Ok(())
    }

    #[test]
    fn registry_lists_default_providers() {
        let registry = default_provider_registry(Duration::from_secs(5));
        assert_eq!(registry.names(), ["dryrun", "openai"]);
        assert!(registry.get("openai").is_some());
        assert!(registry.get("replicate").is_none());
    }
}
