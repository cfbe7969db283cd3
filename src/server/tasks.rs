//! Queue delivery endpoints.
//!
//! The status returned here is what the queue uses to decide between done,
//! retry and dead, so the mapping in [`IntoResponse`] for [`DeployError`]
//! matters:
//!
//! - 200: deployed
//! - 400: malformed task, never retried
//! - 500: not configured yet (or storage failure), retried
//! - 502: deploy service failed or timed out, retried

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::debug;

use super::AppState;
use crate::deploy::{DeployError, DeployTask};
use crate::queue::runner::{HEADER_TASK_ATTEMPT, HEADER_TASK_ID};

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        let status = match &self {
            DeployError::MalformedTask(_) => StatusCode::BAD_REQUEST,
            DeployError::Encode(_) | DeployError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DeployError::Downstream { .. } | DeployError::Transport(_) => StatusCode::BAD_GATEWAY,
        };

        (status, Json(json!({"success": false, "error": self.to_string()}))).into_response()
    }
}

/// Deploy task handler, invoked by the queue.
pub async fn deploy_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, DeployError> {
    debug!(
        task_id = header_str(&headers, HEADER_TASK_ID),
        attempt = header_str(&headers, HEADER_TASK_ATTEMPT),
        "Deploy task received"
    );

    let task: DeployTask = serde_json::from_slice(&body).map_err(DeployError::MalformedTask)?;
    state.worker().handle(&task).await?;

    Ok(Json(json!({"success": true})))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
