use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use rating_prompt::rating::{rating_router, PendingPromptPresenter, RatingService, RecordStore};
use serde_json::json;
use std::sync::Arc;

/// Engine routes plus the operational endpoints.
pub(crate) fn with_rating_routes<S>(
    service: Arc<RatingService<S>>,
    prompts: Arc<PendingPromptPresenter>,
) -> axum::Router
where
    S: RecordStore + ?Sized + 'static,
{
    rating_router(service, prompts)
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
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rating_prompt::rating::InMemoryRecordStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn router(state: AppState) -> axum::Router {
        let prompts = Arc::new(PendingPromptPresenter::new());
        let service = RatingService::builder(Arc::new(InMemoryRecordStore::default()))
            .request_to_rate_presenter(prompts.clone())
            .build();
        with_rating_routes(Arc::new(service), prompts).layer(Extension(state))
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let state = app_state(false);
        let response = router(state.clone())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = router(state)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rating_routes_are_mounted_next_to_health() {
        let app = router(app_state(true));

        let health = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let status = app
            .oneshot(
                Request::get("/api/v1/rating/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(status.status(), StatusCode::OK);
    }
}
