//! Shared test utilities: a recording queue, a fake deploy service, and
//! request builders.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};

use crate::queue::{QueueError, TaskQueue};
use crate::types::TaskId;
use crate::webhooks::{compute_signature, format_signature_header};

/// A [`TaskQueue`] that only records what was enqueued.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    tasks: Mutex<Vec<(String, Value)>>,
}

impl RecordingQueue {
    /// `(target, payload)` pairs in enqueue order.
    pub fn tasks(&self) -> Vec<(String, Value)> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn enqueue(&self, target: &str, payload: Value) -> Result<TaskId, QueueError> {
        self.tasks
            .lock()
            .unwrap()
            .push((target.to_string(), payload));
        Ok(TaskId::generate())
    }
}

/// An in-process stand-in for the external deploy RPC service.
#[derive(Debug, Clone)]
pub struct FakeDeployService {
    pub base_url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FakeDeployService {
    /// Request bodies received on `/_/rpc`, in arrival order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a fake deploy service on `127.0.0.1:0` that answers `/_/rpc` with
/// `status` after waiting `delay`.
pub async fn spawn_deploy_service(status: StatusCode, delay: Duration) -> FakeDeployService {
    let received = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&received);

    let app = Router::new().route(
        "/_/rpc",
        post(move |Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().unwrap().push(body);
                tokio::time::sleep(delay).await;
                (status, Json(json!({"result": {"success": true}})))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeDeployService {
        base_url: format!("http://{}", addr),
        received,
    }
}

/// Builds a signed `POST /_/github/webhook` request.
pub fn signed_webhook_request(secret: &[u8], event: &str, body: &Value) -> Request<Body> {
    let body_bytes = serde_json::to_vec(body).unwrap();
    let signature = format_signature_header(&compute_signature(&body_bytes, secret));

    Request::builder()
        .method("POST")
        .uri("/_/github/webhook")
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-hub-signature", signature)
        .body(Body::from(body_bytes))
        .unwrap()
}

/// Builds a `POST /_/rpc` request.
pub fn rpc_request(method: &str, params: Value) -> Request<Body> {
    let body = json!({"method": method, "params": [params]});

    Request::builder()
        .method("POST")
        .uri("/_/rpc")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}
