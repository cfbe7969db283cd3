//! The trait RPC services implement.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::RpcError;

/// A named group of RPC methods.
///
/// Only names returned by [`RpcService::methods`] are ever passed to
/// [`RpcService::call`]; the registry checks the allowlist before invoking.
#[async_trait]
pub trait RpcService: Send + Sync {
    /// Method names reachable through the dispatcher.
    fn methods(&self) -> &'static [&'static str];

    /// Invokes `method` with named arguments.
    async fn call(&self, method: &str, params: Map<String, Value>) -> Result<Value, RpcError>;
}

/// Decodes named arguments into a typed argument struct.
///
/// Argument structs use `#[serde(deny_unknown_fields)]`, so unexpected names
/// are rejected the same way missing required ones are.
pub fn parse_params<T: DeserializeOwned>(params: Map<String, Value>) -> Result<T, RpcError> {
    serde_json::from_value(Value::Object(params)).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

/// Standard acknowledgement returned by setter methods.
pub fn success() -> Value {
    serde_json::json!({"success": true})
}
