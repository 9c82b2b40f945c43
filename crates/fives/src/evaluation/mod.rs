//! 5S workspace evaluation: photo scoring through an external classifier,
//! score validation, feedback derivation and evaluation history.

pub mod classifier;
pub mod domain;
pub mod feedback;
pub mod orchestrator;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{AnthropicClassifier, ClassificationRequest, Classifier, ClassifierError};
pub use domain::{
    Category, CompanyId, EvaluationId, PhotoPayload, Score, WorkspaceId, BASE_SCORE_THRESHOLD,
    MAX_TOTAL_SCORE,
};
pub use feedback::{derive_feedback, CategoryBand, CategoryFeedback, FeedbackReport, OverallTier};
pub use orchestrator::{
    EvaluationError, EvaluationOrchestrator, EvaluationResult, PhotoLimits, RetryPolicy, Sleeper,
    TokioSleeper, UserMessage,
};
pub use repository::{
    EvaluationRecord, EvaluationRepository, EvaluationView, RepositoryError, TrendPoint,
    WorkspaceRecord,
};
pub use router::evaluation_router;
pub use scoring::{
    adjusted_scores, percentage_score, total_score, validate_and_normalize, NormalizedAssessment,
    RawModelOutput, ValidationError,
};
pub use service::{
    EvaluationService, EvaluationServiceError, WorkspaceRegistration, WorkspaceUpdate,
};
