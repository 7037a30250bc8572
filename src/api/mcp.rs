use std::sync::Arc;

use axum::{
    Extension,
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::{
    Error,
    error::INTERNAL_ERROR_CODE,
    mcp::McpServer,
    server::AppState,
};

/// Header carrying an OAuth authorization code from the MCP client.
pub const SESSION_CODE_HEADER: &str = "x-session-id";

/// `POST /mcp`: one protocol server per request, no session state.
///
/// The request is handled on its own task, so a client that drops the
/// connection does not cancel Spotify calls already in flight.
pub async fn mcp(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    debug!("Received MCP request ({} bytes)", body.len());

    if let Some(code) = headers
        .get(SESSION_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        state.tokens.set_code(code).await;
    }

    let server = McpServer::new(Arc::clone(&state.spotify));
    let handle = tokio::spawn(async move { server.handle_payload(&body).await });

    let outcome = handle
        .await
        .unwrap_or_else(|e| Err(Error::Internal(format!("request task failed: {}", e))));

    match outcome {
        Ok(Some(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!("Error handling MCP request: {}", e);
            internal_error()
        }
    }
}

/// `GET` and `DELETE /mcp`: streams and sessions are not offered.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(rpc_error(-32000, "Method not allowed.")),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(rpc_error(INTERNAL_ERROR_CODE, "Internal server error")),
    )
        .into_response()
}

fn rpc_error(code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": null
    })
}
