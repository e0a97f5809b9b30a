use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::orchestrator::PromptRequest;
use super::presenter::{PendingPromptPresenter, PromptDetails, PromptOutcome};
use super::service::{RatingService, RatingServiceError, RatingStatus, ResetScope};
use super::store::RecordStore;

/// Shared state for the rating routes.
pub struct RatingRouterState<S: ?Sized> {
    pub service: Arc<RatingService<S>>,
    /// Presenter the service was built with; answers arrive through it.
    pub prompts: Arc<PendingPromptPresenter>,
}

impl<S: ?Sized> Clone for RatingRouterState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            prompts: self.prompts.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SignificantEventRequest {
    #[serde(default = "default_can_prompt")]
    pub can_prompt: bool,
}

fn default_can_prompt() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PromptResponseRequest {
    pub outcome: PromptOutcome,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResetRequest {
    pub scope: ResetScope,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub status: RatingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_prompt: Option<PromptDetails>,
}

/// Router builder exposing the tracking, prompt and reset endpoints.
pub fn rating_router<S>(
    service: Arc<RatingService<S>>,
    prompts: Arc<PendingPromptPresenter>,
) -> Router
where
    S: RecordStore + ?Sized + 'static,
{
    Router::new()
        .route("/api/v1/rating/launch", post(launch_handler::<S>))
        .route(
            "/api/v1/rating/significant-event",
            post(significant_event_handler::<S>),
        )
        .route("/api/v1/rating/status", get(status_handler::<S>))
        .route("/api/v1/rating/prompt", post(prompt_handler::<S>))
        .route(
            "/api/v1/rating/prompt/response",
            post(prompt_response_handler::<S>),
        )
        .route(
            "/api/v1/rating/prompt/dismiss",
            post(prompt_dismiss_handler::<S>),
        )
        .route("/api/v1/rating/native-prompt", post(native_prompt_handler::<S>))
        .route("/api/v1/rating/reset", post(reset_handler::<S>))
        .with_state(RatingRouterState { service, prompts })
}

fn service_error(error: RatingServiceError) -> Response {
    tracing::warn!(%error, "rating request failed");
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

/// Runs store work off the async workers; the stores do blocking file I/O.
async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|error| {
        tracing::warn!(%error, "rating task did not complete");
        let payload = json!({ "error": "rating task did not complete" });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    })
}

pub(crate) async fn launch_handler<S>(State(state): State<RatingRouterState<S>>) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let service = state.service.clone();
    match run_blocking(move || service.track_app_launch()).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(Err(error)) => service_error(error),
        Err(response) => response,
    }
}

pub(crate) async fn significant_event_handler<S>(
    State(state): State<RatingRouterState<S>>,
    Json(request): Json<SignificantEventRequest>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let service = state.service.clone();
    match run_blocking(move || service.track_significant_event(request.can_prompt)).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(Err(error)) => service_error(error),
        Err(response) => response,
    }
}

pub(crate) async fn status_handler<S>(State(state): State<RatingRouterState<S>>) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let service = state.service.clone();
    match run_blocking(move || service.status()).await {
        Ok(Ok(status)) => {
            let view = StatusView {
                status,
                pending_prompt: state.prompts.pending_details(),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Ok(Err(error)) => service_error(error),
        Err(response) => response,
    }
}

pub(crate) async fn prompt_handler<S>(State(state): State<RatingRouterState<S>>) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let service = state.service.clone();
    let prompt = match run_blocking(move || service.show_request_prompt()).await {
        Ok(prompt) => prompt,
        Err(response) => return response,
    };
    let status = match prompt {
        PromptRequest::Shown => StatusCode::ACCEPTED,
        PromptRequest::AlreadyShowing | PromptRequest::ConditionsNotMet => StatusCode::OK,
    };
    (status, Json(json!({ "prompt": prompt }))).into_response()
}

pub(crate) async fn prompt_response_handler<S>(
    State(state): State<RatingRouterState<S>>,
    Json(request): Json<PromptResponseRequest>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let Some(responder) = state.prompts.take() else {
        let payload = json!({ "error": "no rating prompt is awaiting a response" });
        return (StatusCode::CONFLICT, Json(payload)).into_response();
    };

    let service = state.service.clone();
    let outcome = request.outcome;
    let answered = run_blocking(move || -> Result<_, RatingServiceError> {
        responder.respond(outcome)?;
        service.record()
    })
    .await;

    match answered {
        Ok(Ok(record)) => {
            let payload = json!({ "outcome": outcome, "record": record });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(Err(error)) => service_error(error),
        Err(response) => response,
    }
}

/// Closes the pending prompt without an answer. Nothing is recorded.
pub(crate) async fn prompt_dismiss_handler<S>(
    State(state): State<RatingRouterState<S>>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let Some(responder) = state.prompts.take() else {
        let payload = json!({ "error": "no rating prompt is awaiting a response" });
        return (StatusCode::CONFLICT, Json(payload)).into_response();
    };

    responder.dismiss();
    let outstanding = state.service.is_prompt_outstanding();
    (
        StatusCode::OK,
        Json(json!({ "dismissed": true, "prompt_outstanding": outstanding })),
    )
        .into_response()
}

pub(crate) async fn native_prompt_handler<S>(
    State(state): State<RatingRouterState<S>>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    state.service.show_native_rating_flow();
    (StatusCode::ACCEPTED, Json(json!({ "native_prompt": "requested" }))).into_response()
}

pub(crate) async fn reset_handler<S>(
    State(state): State<RatingRouterState<S>>,
    Json(request): Json<ResetRequest>,
) -> Response
where
    S: RecordStore + ?Sized + 'static,
{
    let service = state.service.clone();
    match run_blocking(move || service.reset(request.scope)).await {
        Ok(Ok(record)) => (StatusCode::OK, Json(json!({ "scope": request.scope, "record": record })))
            .into_response(),
        Ok(Err(error)) => service_error(error),
        Err(response) => response,
    }
}
