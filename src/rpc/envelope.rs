//! Request and response envelopes for the JSON RPC surface.
//!
//! Requests look like `{"method": "Service.Method", "params": [{...}]}`: one
//! positional params object whose fields are the method's named arguments.
//! Responses are `{"result": ...}` or `{"error": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RpcError;

/// An RPC request envelope. Also used for outbound calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,

    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Builds a request with a single params object.
    pub fn new(method: impl Into<String>, params: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(RpcRequest {
            method: method.into(),
            params: vec![serde_json::to_value(params)?],
        })
    }

    /// Parses a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, RpcError> {
        serde_json::from_slice(body).map_err(|e| RpcError::MalformedEnvelope(e.to_string()))
    }

    /// Splits `method` into its service and method names.
    pub fn target(&self) -> Result<(&str, &str), RpcError> {
        split_method(&self.method)
    }

    /// Takes the first params entry as the named-argument object.
    pub fn into_kwargs(self) -> Result<Map<String, Value>, RpcError> {
        match self.params.into_iter().next() {
            Some(Value::Object(kwargs)) => Ok(kwargs),
            Some(other) => Err(RpcError::MalformedEnvelope(format!(
                "params[0] must be an object, got {}",
                json_kind(&other)
            ))),
            None => Err(RpcError::MalformedEnvelope(
                "params must contain one object".to_string(),
            )),
        }
    }
}

/// Splits `Service.Method` into exactly two non-empty segments.
///
/// # Examples
///
/// ```
/// use scv::rpc::split_method;
///
/// assert_eq!(split_method("GrowService.Deploy").unwrap(), ("GrowService", "Deploy"));
/// assert!(split_method("Deploy").is_err());
/// assert!(split_method("a.b.c").is_err());
/// assert!(split_method(".Deploy").is_err());
/// ```
pub fn split_method(method: &str) -> Result<(&str, &str), RpcError> {
    match method.split_once('.') {
        Some((service, name)) if !service.is_empty() && !name.is_empty() && !name.contains('.') => {
            Ok((service, name))
        }
        _ => Err(RpcError::InvalidMethodName(method.to_string())),
    }
}

/// An RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Result { result: Value },
    Error { error: String },
}

impl RpcResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, RpcResponse::Error { .. })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
