//! JSON RPC endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use crate::rpc::RpcResponse;

/// RPC handler.
///
/// Takes the raw body so that malformed envelopes are reported in the RPC
/// error format rather than as an extractor rejection.
pub async fn rpc_handler(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<RpcResponse>) {
    let (status, response) = state.registry().dispatch(&body).await;
    (status, Json(response))
}
