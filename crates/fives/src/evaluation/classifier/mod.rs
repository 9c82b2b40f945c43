//! Boundary to the external model that turns photos into raw scores.

mod anthropic;

pub use anthropic::AnthropicClassifier;

use async_trait::async_trait;

/// One outbound request: the fixed scoring instruction plus the photo prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub system: String,
    pub prompt: String,
}

/// Opaque, non-deterministic classifier returning the model's reply text.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError>;

    fn provider_name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier overloaded: {message}")]
    Overloaded { message: String },
    #[error("classifier rate limited: {message}")]
    RateLimited { message: String },
    #[error("classifier rejected credentials: {message}")]
    Unauthorized { message: String },
    #[error("classifier returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("classifier transport failure: {0}")]
    Transport(String),
    #[error("invalid response format from classifier: {0}")]
    InvalidResponse(String),
}

impl ClassifierError {
    /// Overload and rate-limit signals are worth retrying; nothing else is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Overloaded { .. } | Self::RateLimited { .. })
    }
}
