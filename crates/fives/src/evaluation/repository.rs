use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CompanyId, EvaluationId, PhotoPayload, Score, WorkspaceId};
use super::feedback::{derive_feedback, FeedbackReport};
use super::scoring::{adjusted_scores, percentage_score, total_score};

/// Physical area that gets photographed and scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub company_id: CompanyId,
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored evaluation. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    pub workspace_id: WorkspaceId,
    pub company_id: CompanyId,
    pub photos: Vec<PhotoPayload>,
    pub score: Score,
    pub feedback: String,
    pub total_score: u32,
    pub created_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Display view. Always renders the adjusted score, so records stored
    /// before the disqualification rule cannot show inflated values.
    pub fn view(&self) -> EvaluationView {
        let scores = adjusted_scores(&self.score);
        let total = total_score(&scores);
        EvaluationView {
            id: self.id.clone(),
            workspace_id: self.workspace_id.clone(),
            company_id: self.company_id.clone(),
            scores,
            total_score: total,
            percentage_score: percentage_score(total),
            feedback: self.feedback.clone(),
            photo_count: self.photos.len(),
            report: derive_feedback(&scores),
            created_at: self.created_at,
        }
    }

    pub fn trend_point(&self) -> TrendPoint {
        TrendPoint {
            recorded_at: self.created_at,
            total_score: total_score(&self.score),
        }
    }
}

/// Sanitized representation of an evaluation for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationView {
    pub id: EvaluationId,
    pub workspace_id: WorkspaceId,
    pub company_id: CompanyId,
    pub scores: Score,
    pub total_score: u32,
    pub percentage_score: u8,
    pub feedback: String,
    pub photo_count: usize,
    pub report: FeedbackReport,
    pub created_at: DateTime<Utc>,
}

/// One point of the historical trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub recorded_at: DateTime<Utc>,
    pub total_score: u32,
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait EvaluationRepository: Send + Sync {
    fn insert_workspace(&self, record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError>;
    fn fetch_workspace(&self, id: &WorkspaceId) -> Result<Option<WorkspaceRecord>, RepositoryError>;
    fn workspaces(&self, company_id: &CompanyId) -> Result<Vec<WorkspaceRecord>, RepositoryError>;
    /// Replaces an existing workspace. `NotFound` when the id is unknown.
    fn update_workspace(&self, record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError>;
    /// Removes the workspace together with its evaluation history.
    fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), RepositoryError>;
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError>;
    /// Every evaluation recorded for the workspace, in any order.
    fn history(&self, workspace_id: &WorkspaceId) -> Result<Vec<EvaluationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
