use fives::evaluation::{
    CompanyId, EvaluationId, EvaluationRecord, EvaluationRepository, RepositoryError,
    WorkspaceId, WorkspaceRecord,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local evaluation history. Lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    workspaces: Arc<Mutex<HashMap<WorkspaceId, WorkspaceRecord>>>,
    evaluations: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert_workspace(&self, record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError> {
        let mut guard = self.workspaces.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_workspace(&self, id: &WorkspaceId) -> Result<Option<WorkspaceRecord>, RepositoryError> {
        let guard = self.workspaces.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn workspaces(&self, company_id: &CompanyId) -> Result<Vec<WorkspaceRecord>, RepositoryError> {
        let guard = self.workspaces.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.company_id == company_id)
            .cloned()
            .collect())
    }

    fn update_workspace(&self, record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError> {
        let mut guard = self.workspaces.lock().expect("repository mutex poisoned");
        let slot = guard.get_mut(&record.id).ok_or(RepositoryError::NotFound)?;
        *slot = record.clone();
        Ok(record)
    }

    /// Drops the workspace and its evaluations together.
    fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), RepositoryError> {
        let mut workspaces = self.workspaces.lock().expect("repository mutex poisoned");
        workspaces.remove(id).ok_or(RepositoryError::NotFound)?;
        self.evaluations
            .lock()
            .expect("repository mutex poisoned")
            .retain(|_, record| &record.workspace_id != id);
        Ok(())
    }

    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.evaluations.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.evaluations.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn history(&self, workspace_id: &WorkspaceId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.evaluations.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.workspace_id == workspace_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fives::evaluation::Score;

    fn workspace(id: &str, company: &str) -> WorkspaceRecord {
        WorkspaceRecord {
            id: WorkspaceId(id.to_string()),
            company_id: CompanyId(company.to_string()),
            name: format!("Area {id}"),
            location: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn evaluation(id: &str, workspace_id: &str) -> EvaluationRecord {
        EvaluationRecord {
            id: EvaluationId(id.to_string()),
            workspace_id: WorkspaceId(workspace_id.to_string()),
            company_id: CompanyId("acme".to_string()),
            photos: Vec::new(),
            score: Score::new(8, 8, 8, 6, 6),
            feedback: "steady".to_string(),
            total_score: 36,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_ids_conflict() {
        let repository = InMemoryEvaluationRepository::default();
        repository
            .insert_workspace(workspace("ws-1", "acme"))
            .expect("first insert");
        assert!(matches!(
            repository.insert_workspace(workspace("ws-1", "acme")),
            Err(RepositoryError::Conflict)
        ));

        repository
            .insert(evaluation("eval-1", "ws-1"))
            .expect("first insert");
        assert!(matches!(
            repository.insert(evaluation("eval-1", "ws-1")),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn queries_filter_by_owner() {
        let repository = InMemoryEvaluationRepository::default();
        repository
            .insert_workspace(workspace("ws-1", "acme"))
            .expect("insert");
        repository
            .insert_workspace(workspace("ws-2", "globex"))
            .expect("insert");
        repository
            .insert(evaluation("eval-1", "ws-1"))
            .expect("insert");
        repository
            .insert(evaluation("eval-2", "ws-2"))
            .expect("insert");

        let acme = repository
            .workspaces(&CompanyId("acme".to_string()))
            .expect("listing");
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].id.0, "ws-1");

        let history = repository
            .history(&WorkspaceId("ws-2".to_string()))
            .expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id.0, "eval-2");
    }

    #[test]
    fn updates_replace_known_workspaces_only() {
        let repository = InMemoryEvaluationRepository::default();
        repository
            .insert_workspace(workspace("ws-1", "acme"))
            .expect("insert");

        let mut renamed = workspace("ws-1", "acme");
        renamed.name = "Paint shop".to_string();
        repository
            .update_workspace(renamed)
            .expect("update succeeds");
        let stored = repository
            .fetch_workspace(&WorkspaceId("ws-1".to_string()))
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.name, "Paint shop");

        assert!(matches!(
            repository.update_workspace(workspace("ws-9", "acme")),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn deletes_cascade_to_history() {
        let repository = InMemoryEvaluationRepository::default();
        repository
            .insert_workspace(workspace("ws-1", "acme"))
            .expect("insert");
        repository
            .insert_workspace(workspace("ws-2", "acme"))
            .expect("insert");
        repository
            .insert(evaluation("eval-1", "ws-1"))
            .expect("insert");
        repository
            .insert(evaluation("eval-2", "ws-2"))
            .expect("insert");

        repository
            .delete_workspace(&WorkspaceId("ws-1".to_string()))
            .expect("delete succeeds");

        assert!(repository
            .fetch(&EvaluationId("eval-1".to_string()))
            .expect("fetch")
            .is_none());
        assert!(repository
            .fetch(&EvaluationId("eval-2".to_string()))
            .expect("fetch")
            .is_some());
        assert!(matches!(
            repository.delete_workspace(&WorkspaceId("ws-1".to_string())),
            Err(RepositoryError::NotFound)
        ));
    }
}
