use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use recruiter_ai::workflows::assistant::GenerativeModel;
use recruiter_ai::workflows::vacancy::{vacancy_router, VacancyService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_vacancy_routes<M>(service: Arc<VacancyService<M>>) -> axum::Router
where
    M: GenerativeModel + 'static,
{
    vacancy_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use recruiter_ai::workflows::assistant::{RecruiterAssistant, UnconfiguredModel};
    use recruiter_ai::workflows::persistence::{
        MemoryKeyValueStore, RecruiterPreferences, WorkspaceRepository,
    };
    use recruiter_ai::workflows::vacancy::{SequenceClock, VacancyStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let store = VacancyStore::new(SequenceClock::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        ));
        let service = VacancyService::new(
            store,
            RecruiterAssistant::new(UnconfiguredModel),
            WorkspaceRepository::new(Arc::new(MemoryKeyValueStore::default())),
            RecruiterPreferences::default(),
        );
        with_vacancy_routes(Arc::new(service)).layer(Extension(state))
    }

    async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::get(uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("response")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let state = app_state(false);
        let response = get(app(state.clone()), "/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = get(app(state), "/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn vacancy_routes_are_mounted_next_to_health_checks() {
        let response = get(app(app_state(true)), "/api/v1/vacancies").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        assert_eq!(&body[..], b"[]");

        let response = get(app(app_state(true)), "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_without_api_key_is_unavailable() {
        let response = app(app_state(true))
            .oneshot(
                Request::post("/api/v1/assistant/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "messages": [{ "role": "user", "content": "hi" }] }).to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
