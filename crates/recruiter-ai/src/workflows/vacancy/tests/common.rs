use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::workflows::assistant::{
    AssistantError, GenerationRequest, GenerativeModel, RecruiterAssistant,
};
use crate::workflows::persistence::{
    MemoryKeyValueStore, RecruiterPreferences, WorkspaceRepository,
};
use crate::workflows::vacancy::{
    CandidateResume, DocumentRef, SequenceClock, StoreObserver, Vacancy, VacancyDraft,
    VacancyService, VacancyStore,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date")
}

pub(super) fn store() -> VacancyStore {
    VacancyStore::new(SequenceClock::new(today()))
}

pub(super) fn resume_text() -> DocumentRef {
    DocumentRef {
        url: None,
        text: Some("Seven years of Rust and Postgres; led an on-call rotation.".to_string()),
    }
}

pub(super) fn analysis_reply(score: u8) -> String {
    json!({
        "match_score": score,
        "summary": "Strong backend background.",
        "strengths": ["Rust", "Postgres"],
        "gaps": ["No Kubernetes"],
        "recommendation": "Invite to a technical interview"
    })
    .to_string()
}

/// Model that replays canned replies in order and records every request.
#[derive(Clone, Default)]
pub(super) struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Result<String, AssistantError>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedModel {
    pub(super) fn replying<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, AssistantError>>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub(super) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AssistantError> {
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());
        self.replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front()
            .unwrap_or(Err(AssistantError::EmptyResponse))
    }
}

pub(super) struct Fixture {
    pub(super) service: Arc<VacancyService<ScriptedModel>>,
    pub(super) model: ScriptedModel,
    pub(super) repository: WorkspaceRepository,
}

pub(super) fn fixture(model: ScriptedModel) -> Fixture {
    let repository = WorkspaceRepository::new(Arc::new(MemoryKeyValueStore::default()));
    let service = VacancyService::new(
        store(),
        RecruiterAssistant::new(model.clone()),
        repository.clone(),
        RecruiterPreferences::default(),
    );
    Fixture {
        service: Arc::new(service),
        model,
        repository,
    }
}

/// Seed one vacancy with one text resume through the service.
pub(super) fn seeded(fixture: &Fixture) -> (Vacancy, CandidateResume) {
    let vacancy = fixture
        .service
        .upsert(VacancyDraft::titled("Backend Engineer"))
        .expect("upsert succeeds")
        .vacancy;
    let resume = fixture
        .service
        .attach_resume(&vacancy.id, "jane-doe.pdf".to_string(), resume_text())
        .expect("resume attached");
    (vacancy, resume)
}

/// Counts how often the store reported a change.
#[derive(Clone, Default)]
pub(super) struct CountingObserver {
    pub(super) calls: Arc<AtomicUsize>,
}

impl CountingObserver {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StoreObserver for CountingObserver {
    fn on_change(&mut self, _vacancies: &[Vacancy]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
