use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_VISION_ATTEMPTS: u32 = 3;

const MIN_TIMEOUT_S: f64 = 1.0;
const MAX_TIMEOUT_S: f64 = 600.0;

/// API credential for the remote model service.
///
/// `Unconfigured` is a supported mode: remote stages are skipped and every
/// invocation degrades to the fallback analysis and heuristics.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Configured(String),
    Unconfigured,
}

impl Credential {
    /// Blank values count as unconfigured.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Credential::Unconfigured
        } else {
            Credential::Configured(trimmed.to_string())
        }
    }

    pub fn from_env() -> Self {
        non_empty_env("OPENAI_API_KEY")
            .map(Credential::Configured)
            .unwrap_or(Credential::Unconfigured)
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            Credential::Configured(key) => Some(key.as_str()),
            Credential::Unconfigured => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Credential::Configured(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Configured(_) => f.write_str("Configured(<redacted>)"),
            Credential::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub credential: Credential,
    /// Where preprocessed images are written.
    pub processed_dir: PathBuf,
    /// Requested vision model; `None` takes the registry default.
    pub vision_model: Option<String>,
    /// Requested text model; `None` takes the registry default.
    pub text_model: Option<String>,
    pub request_timeout: Duration,
    pub vision_attempts: u32,
}

impl PipelineConfig {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            credential: Credential::Unconfigured,
            processed_dir: processed_dir.into(),
            vision_model: None,
            text_model: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            vision_attempts: DEFAULT_VISION_ATTEMPTS,
        }
    }

    /// Reads `OPENAI_API_KEY`, `SALVAGE_VISION_MODEL`, `SALVAGE_TEXT_MODEL` and
    /// `SALVAGE_REQUEST_TIMEOUT` (seconds).
    pub fn from_env(processed_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(processed_dir);
        config.credential = Credential::from_env();
        config.vision_model = non_empty_env("SALVAGE_VISION_MODEL");
        config.text_model = non_empty_env("SALVAGE_TEXT_MODEL");
        if let Some(timeout) = non_empty_env("SALVAGE_REQUEST_TIMEOUT")
            .as_deref()
            .and_then(parse_timeout_seconds)
        {
            config.request_timeout = timeout;
        }
        config
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_models(mut self, vision_model: Option<String>, text_model: Option<String>) -> Self {
        if vision_model.is_some() {
            self.vision_model = vision_model;
        }
        if text_model.is_some() {
            self.text_model = text_model;
        }
        self
    }
}

/// Seconds, clamped to a sane range. Unparseable or non-finite input is ignored.
pub fn parse_timeout_seconds(raw: &str) -> Option<Duration> {
    timeout_from_seconds(raw.trim().parse::<f64>().ok()?)
}

pub fn timeout_from_seconds(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() {
        return None;
    }
    Some(Duration::from_secs_f64(
        seconds.clamp(MIN_TIMEOUT_S, MAX_TIMEOUT_S),
    ))
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
