//! JSON RPC dispatch.
//!
//! A request names `Service.Method`; the [`RpcRegistry`] resolves the service,
//! checks the method against that service's allowlist, and invokes it with the
//! request's params object as named arguments.

pub mod envelope;
pub mod registry;
pub mod service;

use thiserror::Error;

use crate::deploy::TriggerError;
use crate::settings::SettingsError;

pub use envelope::{RpcRequest, RpcResponse, split_method};
pub use registry::RpcRegistry;
pub use service::{RpcService, parse_params, success};

/// Errors produced while resolving or running an RPC method.
///
/// All of them are reported to the caller as `{"error": "<message>"}` with
/// status 500.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("malformed RPC request: {0}")]
    MalformedEnvelope(String),

    #[error("invalid method name {0:?}: expected Service.Method")]
    InvalidMethodName(String),

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("method not found: {service}.{method}")]
    MethodNotFound { service: String, method: String },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}
