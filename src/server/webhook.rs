//! GitHub push webhook endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::deploy::TriggerError;
use crate::settings::keys::GITHUB_WEBHOOK_SECRET;
use crate::settings::{SettingsError, require_string};
use crate::webhooks::{PushEvent, verify_signature};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for the HMAC-SHA1 signature.
const HEADER_SIGNATURE: &str = "x-hub-signature";

const EVENT_PUSH: &str = "push";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    fn ok() -> Self {
        WebhookResponse {
            success: true,
            error: None,
        }
    }
}

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or non-matching signature.
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Typically the webhook secret not being configured.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            // The sender gets a plain rejection, not an HTTP error.
            WebhookError::InvalidSignature => (
                StatusCode::OK,
                WebhookResponse {
                    success: false,
                    error: None,
                },
            ),
            WebhookError::InvalidJson(_) | WebhookError::Settings(_) | WebhookError::Trigger(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                WebhookResponse {
                    success: false,
                    error: Some(self.to_string()),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers:
///   - `X-Hub-Signature`: `sha1=<hex>` HMAC of the body, keyed by the configured secret
///   - `X-GitHub-Event` (optional): anything but `push` is acknowledged and ignored
/// - Body: JSON push event
///
/// # Response
///
/// - 200 `{"success": true}`: processed (whether or not a deploy was queued)
/// - 200 `{"success": false}`: signature rejected; nothing processed
/// - 500 `{"success": false, "error": ...}`: unparsable body, or missing configuration
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let secret = require_string(state.settings(), GITHUB_WEBHOOK_SECRET)?;

    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok());

    if !verify_signature(&body, signature, secret.as_bytes()) {
        warn!(has_signature = signature.is_some(), "Webhook signature verification failed");
        return Err(WebhookError::InvalidSignature);
    }

    let event = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(EVENT_PUSH);

    if event != EVENT_PUSH {
        debug!(event, "Ignoring non-push event");
        return Ok(Json(WebhookResponse::ok()));
    }

    let push: PushEvent = serde_json::from_slice(&body)?;

    match state.trigger().on_push(&push).await? {
        Some(task_id) => info!(git_ref = %push.git_ref, commit_id = %push.after, %task_id, "Push queued for deploy"),
        None => debug!(git_ref = %push.git_ref, "Push not deployed"),
    }

    Ok(Json(WebhookResponse::ok()))
}
