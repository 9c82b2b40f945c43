//! Drives one evaluation end to end against the classifier.
//!
//! shape photos -> classify (retrying transient failures with exponential
//! backoff) -> extract JSON object -> validate -> aggregate.

mod parser;
mod prompt;
mod retry;

pub use parser::{extract_json_object, ParseError};
pub use prompt::{
    build_request, shape_photos, PhotoLimits, MAX_PHOTOS, MAX_PHOTO_CHARS, SYSTEM_INSTRUCTION,
};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper, INITIAL_RETRY_DELAY_MS, MAX_RETRIES};

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::classifier::{ClassificationRequest, Classifier, ClassifierError};
use super::domain::{PhotoPayload, Score};
use super::scoring::{
    percentage_score, total_score, validate_and_normalize, RawModelOutput, ValidationError,
};

/// Finalized result of one orchestration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub score: Score,
    pub total_score: u32,
    pub percentage_score: u8,
    pub feedback: String,
    /// Photos actually sent, after shaping.
    #[serde(skip)]
    pub photos: Vec<PhotoPayload>,
    pub attempts: u32,
}

/// Short title + description pair shown to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub title: &'static str,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("no valid photos after processing")]
    Input,
    #[error("classifier failed after {attempts} attempt(s): {source}")]
    Upstream {
        attempts: u32,
        #[source]
        source: ClassifierError,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EvaluationError {
    /// True when the upstream kept reporting overload until the budget ran out.
    pub fn is_exhausted_transient(&self) -> bool {
        matches!(self, Self::Upstream { source, .. } if source.is_transient())
    }

    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::Input => UserMessage {
                title: "No photos",
                description: "Please provide at least one photo".to_string(),
            },
            Self::Upstream { .. } if self.is_exhausted_transient() => UserMessage {
                title: "Evaluation service busy",
                description: "The scoring service is overloaded. Please try again shortly."
                    .to_string(),
            },
            Self::Upstream { .. } => UserMessage {
                title: "Evaluation unavailable",
                description: "The scoring service could not be reached.".to_string(),
            },
            Self::Parse(_) => UserMessage {
                title: "Evaluation failed",
                description: "The evaluation could not be read. Please try again.".to_string(),
            },
            Self::Validation(err) => UserMessage {
                title: "Evaluation incomplete",
                description: format!("The evaluation was incomplete ({err}). Please try again."),
            },
        }
    }
}

/// Stateless orchestration entry point; safe to share across concurrent flows.
#[derive(Clone)]
pub struct EvaluationOrchestrator {
    classifier: Arc<dyn Classifier>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    limits: PhotoLimits,
}

impl EvaluationOrchestrator {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self::with_parts(
            classifier,
            Arc::new(TokioSleeper),
            RetryPolicy::default(),
            PhotoLimits::default(),
        )
    }

    pub fn with_parts(
        classifier: Arc<dyn Classifier>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
        limits: PhotoLimits,
    ) -> Self {
        Self {
            classifier,
            sleeper,
            policy,
            limits,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn evaluate(
        &self,
        photos: &[PhotoPayload],
    ) -> Result<EvaluationResult, EvaluationError> {
        let shaped = shape_photos(photos, self.limits);
        if shaped.is_empty() {
            return Err(EvaluationError::Input);
        }
        info!(
            supplied = photos.len(),
            used = shaped.len(),
            provider = self.classifier.provider_name(),
            "processing photos"
        );

        let request = build_request(&shaped);
        let (reply, attempts) = self.classify_with_retry(&request).await?;

        let object = extract_json_object(&reply)?;
        let assessment = validate_and_normalize(&RawModelOutput(object))?;

        let total = total_score(&assessment.score);
        let percentage = percentage_score(total);
        info!(
            attempts,
            total_score = total,
            percentage_score = percentage,
            disqualified = assessment.score.is_disqualified(),
            "evaluation scored"
        );

        Ok(EvaluationResult {
            score: assessment.score,
            total_score: total,
            percentage_score: percentage,
            feedback: assessment.feedback,
            photos: shaped,
            attempts,
        })
    }

    async fn classify_with_retry(
        &self,
        request: &ClassificationRequest,
    ) -> Result<(String, u32), EvaluationError> {
        let mut retries = 0;

        loop {
            let attempt = retries + 1;
            info!(attempt, "calling classifier");

            match self.classifier.classify(request).await {
                Ok(reply) => return Ok((reply, attempt)),
                Err(err) if err.is_transient() && retries < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retries);
                    warn!(
                        error = %err,
                        retry = retries + 1,
                        max_retries = self.policy.max_retries,
                        backoff_ms = delay.as_millis() as u64,
                        "classifier busy, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    retries += 1;
                }
                Err(source) => {
                    return Err(EvaluationError::Upstream {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}
