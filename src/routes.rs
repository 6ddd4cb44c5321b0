//! REST endpoints driving the wizard.
//!
//! `POST /api/wizard` opens a session; every other call names it in the
//! path, so visitors never see each other's answers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use uuid::Uuid;

use crate::config::CalculatorConfig;
use crate::error::{BackendError, WizardError};
use crate::form::{ALL_DAYS_TAG, FieldId, Weekday};
use crate::wizard::{SessionStore, WizardController};

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

#[derive(Deserialize)]
struct FieldValue {
    value: String,
}

#[derive(Deserialize)]
struct Consent {
    accepted: bool,
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Resolve the session named in the path.
async fn session(state: &AppState, id: &str) -> Result<Arc<WizardController>, Response> {
    let Ok(id) = Uuid::parse_str(id) else {
        return Err(bad_request("Invalid session ID".to_string()));
    };
    state.sessions.get(id).await.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Session not found or expired"})),
        )
            .into_response()
    })
}

/// Map a refused wizard action onto an HTTP response.
async fn wizard_error(controller: &WizardController, err: WizardError) -> Response {
    let message = err.to_string();
    match err {
        WizardError::Invalid { step, errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": message, "step": step, "errors": errors})),
        )
            .into_response(),
        WizardError::ConsentRequired => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::DuplicateEmail { .. } => {
            let conflict = controller.status().await.conflict;
            (
                StatusCode::CONFLICT,
                Json(serde_json::json!({"error": message, "conflict": conflict})),
            )
                .into_response()
        }
        WizardError::SubmissionInFlight
        | WizardError::AlreadySubmitted
        | WizardError::SessionReset => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::Backend(e) => {
            warn!(error = %e, "Backend call failed during wizard action");
            let upstream_status = match e {
                BackendError::Submission { status, .. } => status,
                _ => None,
            };
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": message, "upstreamStatus": upstream_status})),
            )
                .into_response()
        }
    }
}

/// Respond with the fresh snapshot, or the mapped error.
async fn snapshot_or_error(
    controller: &WizardController,
    outcome: Result<(), WizardError>,
) -> Response {
    match outcome {
        Ok(()) => Json(controller.status().await).into_response(),
        Err(e) => wizard_error(controller, e).await,
    }
}

/// POST /api/wizard
///
/// Opens a session and returns its id with the initial snapshot.
async fn open_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, controller) = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(serde_json::json!({"sessionId": id, "status": controller.status().await})),
    )
}

/// GET /api/wizard/{session}
async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match session(&state, &id).await {
        Ok(controller) => Json(controller.status().await).into_response(),
        Err(resp) => resp,
    }
}

/// DELETE /api/wizard/{session}
async fn close_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(uuid) = Uuid::parse_str(&id) else {
        return bad_request("Invalid session ID".to_string());
    };
    if state.sessions.remove(uuid).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Session not found or expired"})),
        )
            .into_response()
    }
}

/// PUT /api/wizard/{session}/fields/{field}
///
/// Writes one answer. A complete postal code triggers the address lookup
/// before the response is sent.
async fn put_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
    Json(body): Json<FieldValue>,
) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    let field: FieldId = match field.parse() {
        Ok(field) => field,
        Err(e) => return bad_request(e),
    };
    let outcome = controller.set_field(field, &body.value).await.map(|_| ());
    snapshot_or_error(&controller, outcome).await
}

/// POST /api/wizard/{session}/days/{day}
///
/// Toggles one weekday, or the "allDays" shortcut.
async fn toggle_day(
    State(state): State<AppState>,
    Path((id, day)): Path<(String, String)>,
) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    let outcome = if day == ALL_DAYS_TAG {
        controller.toggle_all_days().await
    } else {
        match day.parse::<Weekday>() {
            Ok(day) => controller.toggle_day(day).await,
            Err(e) => return bad_request(e),
        }
    };
    snapshot_or_error(&controller, outcome).await
}

/// POST /api/wizard/{session}/consent
async fn set_consent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Consent>,
) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    let outcome = controller.set_consent(body.accepted).await;
    snapshot_or_error(&controller, outcome).await
}

/// POST /api/wizard/{session}/next
async fn next(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    let outcome = controller.go_next().await.map(|_| ());
    snapshot_or_error(&controller, outcome).await
}

/// POST /api/wizard/{session}/back
async fn back(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    controller.go_back().await;
    Json(controller.status().await).into_response()
}

/// POST /api/wizard/{session}/conflict/dismiss
async fn dismiss_conflict(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    controller.dismiss_conflict().await;
    Json(controller.status().await).into_response()
}

/// POST /api/wizard/{session}/reset
async fn reset(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    let outcome = controller.reset().await;
    snapshot_or_error(&controller, outcome).await
}

/// GET /api/wizard/{session}/result
///
/// Recommendations for the submitted lead, or 404 before submission.
async fn get_result(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let controller = match session(&state, &id).await {
        Ok(controller) => controller,
        Err(resp) => return resp,
    };
    match controller.result().await {
        Some(result) => Json(result).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No lead submitted yet"})),
        )
            .into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

fn cors_layer(config: &CalculatorConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    match config
        .allowed_origin
        .as_deref()
        .map(HeaderValue::from_str)
    {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            warn!(error = %e, "Unusable allowed origin, accepting any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

/// Build the wizard REST routes.
pub fn wizard_routes(sessions: Arc<SessionStore>, config: &CalculatorConfig) -> Router {
    let state = AppState { sessions };
    Router::new()
        .route("/health", get(health))
        .route("/api/wizard", post(open_session))
        .route("/api/wizard/{session}", get(get_status).delete(close_session))
        .route("/api/wizard/{session}/fields/{field}", put(put_field))
        .route("/api/wizard/{session}/days/{day}", post(toggle_day))
        .route("/api/wizard/{session}/consent", post(set_consent))
        .route("/api/wizard/{session}/next", post(next))
        .route("/api/wizard/{session}/back", post(back))
        .route("/api/wizard/{session}/conflict/dismiss", post(dismiss_conflict))
        .route("/api/wizard/{session}/reset", post(reset))
        .route("/api/wizard/{session}/result", get(get_result))
        .layer(cors_layer(config))
        .with_state(state)
}
