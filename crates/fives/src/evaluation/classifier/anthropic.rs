use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ClassificationRequest, Classifier, ClassifierError};
use crate::config::{ClassifierConfig, ConfigError};

/// Anthropic Messages API client.
pub struct AnthropicClassifier {
    api_key: String,
    endpoint: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            api_key,
            endpoint: format!("{}/v1/messages", config.api_url.trim_end_matches('/')),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client: reqwest::Client::new(),
        })
    }

    fn body(&self, request: &ClassificationRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": request.system,
            "messages": [{
                "role": "user",
                "content": request.prompt,
            }],
        })
    }
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(&self.body(request))
            .send()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ClassifierError::Transport(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            let error = classify_failure(status, &text);
            warn!(status = status.as_u16(), error = %error, "classifier request failed");
            return Err(error);
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|err| ClassifierError::InvalidResponse(format!("body is not JSON: {err}")))?;

        let reply = payload
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|reply| !reply.is_empty())
            .ok_or_else(|| ClassifierError::InvalidResponse("missing content[0].text".to_string()))?;

        debug!(reply_chars = reply.len(), "classifier replied");
        Ok(reply.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

/// Maps an error response onto the classifier taxonomy. The typed `error.type`
/// field wins over the status code when present.
fn classify_failure(status: StatusCode, body: &str) -> ClassifierError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error_type = parsed
        .as_ref()
        .and_then(|value| value.pointer("/error/type"))
        .and_then(Value::as_str);
    let message = parsed
        .as_ref()
        .and_then(|value| value.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        });

    match (error_type, status.as_u16()) {
        (Some("overloaded_error"), _) | (_, 529) => ClassifierError::Overloaded { message },
        (Some("rate_limit_error"), _) | (_, 429) => ClassifierError::RateLimited { message },
        (Some("authentication_error" | "permission_error"), _) | (_, 401 | 403) => {
            ClassifierError::Unauthorized { message }
        }
        (_, code) => ClassifierError::Status {
            status: code,
            message,
        },
    }
}
