//! HTTP gateway: the agent endpoint plus meeting index maintenance.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::Agent;
use crate::error::Error;
use crate::search::SimilaritySearch;

/// Shared read-only state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub search: Arc<dyn SimilaritySearch>,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agent/invoke", post(invoke))
        .route("/meetings", post(create_meeting))
        .route("/meetings/{id}", delete(delete_meeting))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn invoke(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    // Accept both a wrapped {"user_input": {...}} body and a bare payload.
    let input = payload.get("user_input").unwrap_or(&payload);
    let answer = state.agent.invoke(input).await?;
    Ok(Json(json!({"final_answer": answer})))
}

/// A meeting to index for similarity matching.
#[derive(Debug, Deserialize)]
struct CreateMeeting {
    id: Option<String>,
    title: String,
    description: String,
    time: Option<String>,
    location: Option<String>,
}

async fn create_meeting(
    State(state): State<AppState>,
    Json(meeting): Json<CreateMeeting>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = meeting
        .id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut text = format!("{} {}", meeting.title, meeting.description);
    if let Some(time) = &meeting.time {
        text.push(' ');
        text.push_str(time);
    }
    if let Some(location) = &meeting.location {
        text.push(' ');
        text.push_str(location);
    }

    let mut metadata = Map::new();
    metadata.insert("id".to_string(), Value::String(id.clone()));
    metadata.insert("title".to_string(), Value::String(meeting.title.clone()));

    state
        .search
        .upsert(&id, &text, metadata)
        .await
        .map_err(Error::Search)?;

    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

async fn delete_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.search.delete(&id).await.map_err(Error::Search)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Wraps [`Error`] so every failure leaves the gateway as a structured
/// JSON body, never a bare string or stack trace.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Route(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Llm(_) | Error::Search(_) => StatusCode::BAD_GATEWAY,
            Error::Catalog(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) | Error::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RouteError, ValidationError};

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = ApiError(Error::Validation(ValidationError::MissingField {
            field: "title".to_string(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unroutable_requests_map_to_unprocessable_entity() {
        let err = ApiError(Error::Route(RouteError::NoMarkers));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
