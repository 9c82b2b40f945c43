use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{CompanyId, EvaluationId, PhotoPayload, WorkspaceId};
use super::orchestrator::{EvaluationError, EvaluationOrchestrator, UserMessage};
use super::repository::{
    EvaluationRecord, EvaluationRepository, RepositoryError, TrendPoint, WorkspaceRecord,
};

/// Input for registering a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRegistration {
    pub company_id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Editable workspace fields. The owning company never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceUpdate {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Service composing the orchestrator with the evaluation history store.
pub struct EvaluationService<R> {
    orchestrator: EvaluationOrchestrator,
    repository: Arc<R>,
}

static WORKSPACE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_workspace_id() -> WorkspaceId {
    let id = WORKSPACE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    WorkspaceId(format!("ws-{id:06}"))
}

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

impl<R> EvaluationService<R>
where
    R: EvaluationRepository + 'static,
{
    pub fn new(orchestrator: EvaluationOrchestrator, repository: Arc<R>) -> Self {
        Self {
            orchestrator,
            repository,
        }
    }

    pub fn register_workspace(
        &self,
        registration: WorkspaceRegistration,
    ) -> Result<WorkspaceRecord, EvaluationServiceError> {
        let name = required_name(&registration.name)?;
        if registration.company_id.0.trim().is_empty() {
            return Err(EvaluationServiceError::InvalidWorkspace(
                "company id is required".to_string(),
            ));
        }

        let record = WorkspaceRecord {
            id: next_workspace_id(),
            company_id: registration.company_id,
            name,
            location: non_blank(registration.location),
            description: non_blank(registration.description),
            created_at: Utc::now(),
        };

        let stored = self.repository.insert_workspace(record)?;
        info!(workspace_id = %stored.id, company_id = %stored.company_id, "workspace registered");
        Ok(stored)
    }

    pub fn workspace(&self, workspace_id: &WorkspaceId) -> Result<WorkspaceRecord, EvaluationServiceError> {
        let record = self
            .repository
            .fetch_workspace(workspace_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Replaces name, location and description. Same name rule as registration.
    pub fn update_workspace(
        &self,
        workspace_id: &WorkspaceId,
        update: WorkspaceUpdate,
    ) -> Result<WorkspaceRecord, EvaluationServiceError> {
        let name = required_name(&update.name)?;
        let current = self.workspace(workspace_id)?;

        let record = WorkspaceRecord {
            name,
            location: non_blank(update.location),
            description: non_blank(update.description),
            ..current
        };

        let stored = self.repository.update_workspace(record)?;
        info!(workspace_id = %stored.id, "workspace updated");
        Ok(stored)
    }

    /// Deletes the workspace and every evaluation recorded against it.
    pub fn delete_workspace(&self, workspace_id: &WorkspaceId) -> Result<(), EvaluationServiceError> {
        self.repository.delete_workspace(workspace_id)?;
        info!(workspace_id = %workspace_id, "workspace deleted");
        Ok(())
    }

    /// Workspaces for a company, ordered by name.
    pub fn workspaces(
        &self,
        company_id: &CompanyId,
    ) -> Result<Vec<WorkspaceRecord>, EvaluationServiceError> {
        let mut workspaces = self.repository.workspaces(company_id)?;
        workspaces.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(workspaces)
    }

    /// Scores the photos and records the evaluation against the workspace.
    pub async fn evaluate(
        &self,
        workspace_id: &WorkspaceId,
        photos: &[PhotoPayload],
    ) -> Result<EvaluationRecord, EvaluationServiceError> {
        let workspace = self
            .repository
            .fetch_workspace(workspace_id)?
            .ok_or(RepositoryError::NotFound)?;

        let result = self.orchestrator.evaluate(photos).await?;

        let record = EvaluationRecord {
            id: next_evaluation_id(),
            workspace_id: workspace.id,
            company_id: workspace.company_id,
            photos: result.photos,
            score: result.score,
            feedback: result.feedback,
            total_score: result.total_score,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(record)?;
        info!(
            evaluation_id = %stored.id,
            workspace_id = %stored.workspace_id,
            total_score = stored.total_score,
            "evaluation recorded"
        );
        Ok(stored)
    }

    pub fn get(&self, evaluation_id: &EvaluationId) -> Result<EvaluationRecord, EvaluationServiceError> {
        let record = self
            .repository
            .fetch(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Time-ascending totals for the workspace.
    pub fn trend(&self, workspace_id: &WorkspaceId) -> Result<Vec<TrendPoint>, EvaluationServiceError> {
        if self.repository.fetch_workspace(workspace_id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let mut points: Vec<TrendPoint> = self
            .repository
            .history(workspace_id)?
            .iter()
            .map(EvaluationRecord::trend_point)
            .collect();
        points.sort_by_key(|point| point.recorded_at);
        Ok(points)
    }
}

fn required_name(raw: &str) -> Result<String, EvaluationServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(EvaluationServiceError::InvalidWorkspace(
            "workspace name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("invalid workspace: {0}")]
    InvalidWorkspace(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EvaluationServiceError {
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::InvalidWorkspace(reason) => UserMessage {
                title: "Invalid workspace",
                description: reason.clone(),
            },
            Self::InvalidRequest(reason) => UserMessage {
                title: "Invalid request",
                description: reason.clone(),
            },
            Self::Evaluation(err) => err.user_message(),
            Self::Repository(RepositoryError::NotFound) => UserMessage {
                title: "Not found",
                description: "The requested workspace or evaluation does not exist.".to_string(),
            },
            Self::Repository(RepositoryError::Conflict) => UserMessage {
                title: "Already exists",
                description: "A record with this identifier already exists.".to_string(),
            },
            Self::Repository(RepositoryError::Unavailable(_)) => UserMessage {
                title: "Storage unavailable",
                description: "Evaluation history could not be accessed.".to_string(),
            },
        }
    }
}
