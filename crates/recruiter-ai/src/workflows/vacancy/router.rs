use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use super::domain::{
    DocumentRef, RecruiterId, ResumeId, VacancyDraft, VacancyId, VacancyPriority, VacancyStage,
};
use super::service::{VacancyFilter, VacancyService, VacancyServiceError};
use crate::workflows::assistant::{AssistantError, ChatTurn, GenerativeModel};
use crate::workflows::persistence::SavedLink;

#[derive(Debug, Deserialize)]
pub(crate) struct StageChange {
    stage: VacancyStage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriorityChange {
    priority: VacancyPriority,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecruiterAssignment {
    /// Required; `null` clears the assignment.
    #[serde(deserialize_with = "nullable")]
    recruiter_id: Option<RecruiterId>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResumeUpload {
    file_name: String,
    #[serde(default)]
    document: DocumentRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InterviewRequest {
    #[serde(default)]
    vacancy_id: Option<VacancyId>,
    transcript: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    messages: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveVacancyRequest {
    vacancy_id: VacancyId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkQuery {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoiceSetting {
    enabled: bool,
}

/// Router builder exposing the vacancy board, resume analysis and recruiter preferences.
pub fn vacancy_router<M>(service: Arc<VacancyService<M>>) -> Router
where
    M: GenerativeModel + 'static,
{
    Router::new()
        .route(
            "/api/v1/vacancies",
            get(list_handler::<M>).post(upsert_handler::<M>),
        )
        .route(
            "/api/v1/vacancies/:id",
            get(get_handler::<M>).delete(delete_handler::<M>),
        )
        .route("/api/v1/vacancies/:id/stage", put(stage_handler::<M>))
        .route("/api/v1/vacancies/:id/priority", put(priority_handler::<M>))
        .route(
            "/api/v1/vacancies/:id/recruiter",
            put(recruiter_handler::<M>),
        )
        .route(
            "/api/v1/vacancies/:id/resumes",
            post(attach_resume_handler::<M>),
        )
        .route(
            "/api/v1/vacancies/:id/resumes/:resume_id",
            axum::routing::delete(remove_resume_handler::<M>),
        )
        .route(
            "/api/v1/vacancies/:id/resumes/:resume_id/analysis",
            post(analyze_resume_handler::<M>),
        )
        .route("/api/v1/pipeline/stages", get(stage_counts_handler::<M>))
        .route(
            "/api/v1/interviews/analysis",
            post(interview_handler::<M>),
        )
        .route("/api/v1/assistant/chat", post(chat_handler::<M>))
        .route(
            "/api/v1/recruiters/:id/active-vacancy",
            get(active_vacancy_handler::<M>)
                .put(set_active_vacancy_handler::<M>)
                .delete(clear_active_vacancy_handler::<M>),
        )
        .route(
            "/api/v1/recruiters/:id/links",
            get(links_handler::<M>)
                .post(add_link_handler::<M>)
                .delete(remove_link_handler::<M>),
        )
        .route(
            "/api/v1/settings/voice",
            get(voice_handler::<M>).put(set_voice_handler::<M>),
        )
        .with_state(service)
}

fn error_response(error: VacancyServiceError) -> Response {
    let (status, message) = match &error {
        VacancyServiceError::VacancyNotFound(_) | VacancyServiceError::ResumeNotFound { .. } => {
            (StatusCode::NOT_FOUND, error.to_string())
        }
        VacancyServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, error.to_string()),
        VacancyServiceError::Assistant(AssistantError::NotConfigured) => {
            (StatusCode::SERVICE_UNAVAILABLE, AssistantError::NotConfigured.user_message())
        }
        VacancyServiceError::Assistant(err) => (StatusCode::BAD_GATEWAY, err.user_message()),
        VacancyServiceError::Poisoned => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    let payload = json!({ "error": message });
    (status, Json(payload)).into_response()
}

fn ok_json<T: serde::Serialize>(result: Result<T, VacancyServiceError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

fn no_content(result: Result<(), VacancyServiceError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Query(filter): Query<VacancyFilter>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.list(&filter))
}

pub(crate) async fn upsert_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Json(draft): Json<VacancyDraft>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    match service.upsert(draft) {
        Ok(outcome) => {
            let status = if outcome.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(outcome.vacancy)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.get(&VacancyId(id)))
}

pub(crate) async fn delete_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    no_content(service.delete(&VacancyId(id)))
}

pub(crate) async fn stage_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
    Json(body): Json<StageChange>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.change_stage(&VacancyId(id), body.stage))
}

pub(crate) async fn priority_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
    Json(body): Json<PriorityChange>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.change_priority(&VacancyId(id), body.priority))
}

pub(crate) async fn recruiter_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
    Json(body): Json<RecruiterAssignment>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.assign_recruiter(&VacancyId(id), body.recruiter_id))
}

pub(crate) async fn attach_resume_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(id): Path<String>,
    Json(body): Json<ResumeUpload>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    match service.attach_resume(&VacancyId(id), body.file_name, body.document) {
        Ok(resume) => (StatusCode::CREATED, Json(resume)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_resume_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path((id, resume_id)): Path<(String, String)>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    no_content(service.remove_resume(&VacancyId(id), &ResumeId(resume_id)))
}

pub(crate) async fn analyze_resume_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path((id, resume_id)): Path<(String, String)>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .analyze_resume(&VacancyId(id), &ResumeId(resume_id))
            .await,
    )
}

pub(crate) async fn stage_counts_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.stage_counts())
}

pub(crate) async fn interview_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Json(body): Json<InterviewRequest>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .analyze_interview(body.vacancy_id.as_ref(), &body.transcript)
            .await,
    )
}

pub(crate) async fn chat_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Json(body): Json<ChatRequest>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .chat(body.messages)
            .await
            .map(|reply| json!({ "reply": reply })),
    )
}

pub(crate) async fn active_vacancy_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .active_vacancy(&RecruiterId(recruiter))
            .map(|vacancy| json!({ "vacancy": vacancy })),
    )
}

pub(crate) async fn set_active_vacancy_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
    Json(body): Json<ActiveVacancyRequest>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .set_active_vacancy(RecruiterId(recruiter), body.vacancy_id)
            .map(|vacancy| json!({ "vacancy": vacancy })),
    )
}

pub(crate) async fn clear_active_vacancy_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    no_content(service.clear_active_vacancy(&RecruiterId(recruiter)))
}

pub(crate) async fn links_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(service.links(&RecruiterId(recruiter)))
}

pub(crate) async fn add_link_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
    Json(link): Json<SavedLink>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    match service.add_link(RecruiterId(recruiter), link) {
        Ok(links) => (StatusCode::CREATED, Json(links)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_link_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Path(recruiter): Path<String>,
    Query(query): Query<LinkQuery>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    no_content(service.remove_link(&RecruiterId(recruiter), &query.url))
}

pub(crate) async fn voice_handler<M>(State(service): State<Arc<VacancyService<M>>>) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .voice_enabled()
            .map(|enabled| json!({ "enabled": enabled })),
    )
}

pub(crate) async fn set_voice_handler<M>(
    State(service): State<Arc<VacancyService<M>>>,
    Json(body): Json<VoiceSetting>,
) -> Response
where
    M: GenerativeModel + 'static,
{
    ok_json(
        service
            .set_voice_enabled(body.enabled)
            .map(|enabled| json!({ "enabled": enabled })),
    )
}
