//! HTTP server for the deploy relay.
//!
//! # Endpoints
//!
//! - `POST /_/github/webhook` - Verifies GitHub push webhooks and queues deploys
//! - `POST /_/rpc` - JSON RPC for configuration and manual deploys
//! - `POST /_/tasks/deploy` - Deploy task delivery from the queue
//! - `GET /` - Liveness probe

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::deploy::{DeployServiceClient, DeployTrigger, DeployWorker};
use crate::queue::TaskQueue;
use crate::rpc::RpcRegistry;
use crate::services::default_registry;
use crate::settings::SettingsStore;

pub mod health;
pub mod rpc;
pub mod tasks;
pub mod webhook;

pub use health::health_handler;
pub use rpc::rpc_handler;
pub use tasks::deploy_task_handler;
pub use webhook::webhook_handler;

/// Shared application state, passed to handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: Arc<dyn SettingsStore>,
    registry: RpcRegistry,
    trigger: DeployTrigger,
    worker: DeployWorker,
}

impl AppState {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        registry: RpcRegistry,
        trigger: DeployTrigger,
        worker: DeployWorker,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                settings,
                registry,
                trigger,
                worker,
            }),
        }
    }

    /// Wires the standard services around a settings store, a queue and a
    /// deploy client.
    pub fn assemble(
        settings: Arc<dyn SettingsStore>,
        queue: Arc<dyn TaskQueue>,
        deploy_client: DeployServiceClient,
    ) -> Self {
        let trigger = DeployTrigger::new(settings.clone(), queue);
        let registry = default_registry(settings.clone(), trigger.clone());
        let worker = DeployWorker::new(settings.clone(), deploy_client);
        AppState::new(settings, registry, trigger, worker)
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.inner.settings.as_ref()
    }

    pub fn registry(&self) -> &RpcRegistry {
        &self.inner.registry
    }

    pub fn trigger(&self) -> &DeployTrigger {
        &self.inner.trigger
    }

    pub fn worker(&self) -> &DeployWorker {
        &self.inner.worker
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/_/github/webhook", post(webhook_handler))
        .route("/_/rpc", post(rpc_handler))
        .route("/_/tasks/deploy", post(deploy_task_handler))
        .route("/", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
