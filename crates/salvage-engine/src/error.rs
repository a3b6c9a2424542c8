use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single chat-completion call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Quota or rate-limit class; callers degrade instead of aborting.
    #[error("{provider} quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },
    #[error("{provider} request failed ({status}): {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("{provider} transport failure")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned an unusable payload: {message}")]
    InvalidResponse { provider: String, message: String },
    #[error("{provider} requires an API credential")]
    MissingCredential { provider: String },
}

impl ProviderError {
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::QuotaExceeded { .. } => "quota_exceeded",
            ProviderError::Http { .. } => "http",
            ProviderError::Transport { .. } => "transport",
            ProviderError::InvalidResponse { .. } => "invalid_response",
            ProviderError::MissingCredential { .. } => "missing_credential",
        }
    }
}

/// Failure of a pipeline stage before or around its remote call.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("API credential not configured")]
    Configuration,
    #[error("image file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Remote(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ProviderError, StageError};

    #[test]
    fn messages_name_the_provider_and_path() {
        let quota = ProviderError::QuotaExceeded {
            provider: "openai".to_string(),
            message: "insufficient_quota".to_string(),
        };
        assert!(quota.is_quota());
        assert_eq!(quota.to_string(), "openai quota exceeded: insufficient_quota");

        let missing = StageError::NotFound(PathBuf::from("uploads/chair.jpg"));
        assert_eq!(missing.to_string(), "image file not found: uploads/chair.jpg");

        let remote: StageError = ProviderError::Http {
            provider: "openai".to_string(),
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(remote.to_string(), "openai request failed (500): boom");
    }
}
