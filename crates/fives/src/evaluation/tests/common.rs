use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::evaluation::classifier::{ClassificationRequest, Classifier, ClassifierError};
use crate::evaluation::domain::{CompanyId, EvaluationId, PhotoPayload, WorkspaceId};
use crate::evaluation::orchestrator::{EvaluationOrchestrator, PhotoLimits, RetryPolicy, Sleeper};
use crate::evaluation::repository::{
    EvaluationRecord, EvaluationRepository, RepositoryError, WorkspaceRecord,
};
use crate::evaluation::scoring::RawModelOutput;
use crate::evaluation::service::{EvaluationService, WorkspaceRegistration};

/// Classifier stub replaying a fixed script of replies and failures.
#[derive(Default)]
pub(super) struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<String, ClassifierError>>>,
    requests: Mutex<Vec<ClassificationRequest>>,
}

impl ScriptedClassifier {
    pub(super) fn new(script: Vec<Result<String, ClassifierError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reports overload `failures` times, then answers with `reply`.
    pub(super) fn overloaded_then(failures: usize, reply: String) -> Self {
        let mut script: Vec<_> = (0..failures).map(|_| Err(overloaded())).collect();
        script.push(Ok(reply));
        Self::new(script)
    }

    pub(super) fn calls(&self) -> usize {
        self.requests.lock().expect("request log poisoned").len()
    }

    pub(super) fn requests(&self) -> Vec<ClassificationRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ClassifierError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());
        self.script
            .lock()
            .expect("script poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::InvalidResponse("script exhausted".to_string())))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Default)]
pub(super) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(super) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("sleeper poisoned").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().expect("sleeper poisoned").push(duration);
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) workspaces: Arc<Mutex<HashMap<WorkspaceId, WorkspaceRecord>>>,
    pub(super) evaluations: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for MemoryRepository {
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
        match guard.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_workspace(&self, id: &WorkspaceId) -> Result<(), RepositoryError> {
        let mut workspaces = self.workspaces.lock().expect("repository mutex poisoned");
        if workspaces.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let mut evaluations = self.evaluations.lock().expect("repository mutex poisoned");
        evaluations.retain(|_, record| &record.workspace_id != id);
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

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn insert_workspace(&self, _record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_workspace(&self, _id: &WorkspaceId) -> Result<Option<WorkspaceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn workspaces(&self, _company_id: &CompanyId) -> Result<Vec<WorkspaceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_workspace(&self, _record: WorkspaceRecord) -> Result<WorkspaceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_workspace(&self, _id: &WorkspaceId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _workspace_id: &WorkspaceId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn overloaded() -> ClassifierError {
    ClassifierError::Overloaded {
        message: "Overloaded".to_string(),
    }
}

pub(super) fn raw_payload(
    sort: Value,
    set_in_order: Value,
    shine: Value,
    standardize: Value,
    sustain: Value,
    feedback: &str,
) -> Value {
    json!({
        "sortScore": sort,
        "setInOrderScore": set_in_order,
        "shineScore": shine,
        "standardizeScore": standardize,
        "sustainScore": sustain,
        "feedback": feedback,
    })
}

pub(super) fn raw_output(value: Value) -> RawModelOutput {
    match value {
        Value::Object(map) => RawModelOutput(map),
        other => panic!("expected object payload, got {other}"),
    }
}

pub(super) fn raw_without(key: &str) -> RawModelOutput {
    let mut map: Map<String, Value> = raw_output(scenario_a_payload()).0;
    map.remove(key);
    RawModelOutput(map)
}

pub(super) fn scenario_a_payload() -> Value {
    raw_payload(json!(9), json!(8), json!(8), json!(7), json!(6), "ok")
}

pub(super) fn scenario_a_reply() -> String {
    format!("Here is the result: {} Thanks!", scenario_a_payload())
}

pub(super) fn photos(count: usize) -> Vec<PhotoPayload> {
    (0..count)
        .map(|index| PhotoPayload(format!("data:image/jpeg;base64,photo{index}")))
        .collect()
}

pub(super) fn orchestrator(
    classifier: Arc<ScriptedClassifier>,
    sleeper: Arc<RecordingSleeper>,
) -> EvaluationOrchestrator {
    EvaluationOrchestrator::with_parts(
        classifier,
        sleeper,
        RetryPolicy::default(),
        PhotoLimits::default(),
    )
}

pub(super) fn build_service(
    script: Vec<Result<String, ClassifierError>>,
) -> (
    EvaluationService<MemoryRepository>,
    Arc<MemoryRepository>,
    Arc<ScriptedClassifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let classifier = Arc::new(ScriptedClassifier::new(script));
    let sleeper = Arc::new(RecordingSleeper::default());
    let service = EvaluationService::new(orchestrator(classifier.clone(), sleeper), repository.clone());
    (service, repository, classifier)
}

pub(super) fn registration(company: &str, name: &str) -> WorkspaceRegistration {
    WorkspaceRegistration {
        company_id: CompanyId(company.to_string()),
        name: name.to_string(),
        location: Some("Building 2".to_string()),
        description: None,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
