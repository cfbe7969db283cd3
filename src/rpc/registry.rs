//! Service registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::{RpcError, RpcRequest, RpcResponse, RpcService};

/// Named RPC services.
///
/// Built once at startup and then shared immutably behind an `Arc`.
#[derive(Default, Clone)]
pub struct RpcRegistry {
    services: HashMap<String, Arc<dyn RpcService>>,
}

impl RpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under `name`, replacing (and returning) any
    /// service already registered under that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        service: Arc<dyn RpcService>,
    ) -> Option<Arc<dyn RpcService>> {
        self.services.insert(name.into(), service)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_service(mut self, name: impl Into<String>, service: Arc<dyn RpcService>) -> Self {
        self.register(name, service);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RpcService>> {
        self.services.get(name)
    }

    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parses, resolves and invokes a raw request body.
    pub async fn call(&self, body: &[u8]) -> Result<Value, RpcError> {
        let request = RpcRequest::parse(body)?;
        let (service_name, method) = request.target()?;
        let (service_name, method) = (service_name.to_string(), method.to_string());

        let service = self
            .get(&service_name)
            .ok_or_else(|| RpcError::UnknownService(service_name.clone()))?;

        if !service.methods().contains(&method.as_str()) {
            return Err(RpcError::MethodNotFound {
                service: service_name,
                method,
            });
        }

        let kwargs = request.into_kwargs()?;
        debug!(service = %service_name, %method, "Dispatching RPC");
        service.call(&method, kwargs).await
    }

    /// Like [`call`](Self::call), but folds the outcome into a response
    /// envelope and status: 200 `{result}` or 500 `{error}`.
    pub async fn dispatch(&self, body: &[u8]) -> (StatusCode, RpcResponse) {
        match self.call(body).await {
            Ok(result) => (StatusCode::OK, RpcResponse::Result { result }),
            Err(e) => {
                warn!(error = %e, "RPC failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RpcResponse::Error {
                        error: e.to_string(),
                    },
                )
            }
        }
    }
}

impl std::fmt::Debug for RpcRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}
