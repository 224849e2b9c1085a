//! The Streamable-HTTP surface (spec §4.6, §4.7): `POST /mcp`,
//! `GET /mcp/sse/:operation_id`, `GET /health`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use contextd_domain::constants::SSE_HEARTBEAT_SECS;
use contextd_domain::entities::{ClientInfo, Session};
use contextd_domain::error::Error;
use contextd_domain::identity;

use crate::identity::resolve_owner_id;
use crate::scrub::scrub_result;
use crate::state::AppState;
use crate::tools;
use crate::transport::error_code;
use crate::transport::headers::{PROTOCOL_VERSION_HEADER, SESSION_ID_HEADER, accepts_streamable_http, session_id};
use crate::transport::{JsonRpcRequest, JsonRpcResponse, negotiate_protocol_version};

/// Build the axum router, including the health check and SSE endpoint.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/mcp/sse/{operation_id}", get(handle_sse))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store = match state.vector_store.health().await {
        Ok(()) => "ok",
        Err(_) => "degraded",
    };
    Json(json!({"status": "healthy", "store": store}))
}

async fn handle_mcp(State(state): State<Arc<AppState>>, headers: HeaderMap, body: axum::body::Bytes) -> Response {
    let trace_id = Uuid::new_v4().to_string();

    if !accepts_streamable_http(&headers) {
        return not_acceptable(Value::Null, &trace_id);
    }

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(err) => return bad_request(Value::Null, &trace_id, &err.to_string()),
    };

    if request.jsonrpc != "2.0" {
        return bad_request(request.id, &trace_id, "jsonrpc must be \"2.0\"");
    }

    if request.method != "initialize" && session_id(&headers).and_then(|id| state.sessions.get(id)).is_none() {
        return session_required(request.id, &trace_id);
    }

    let owner_id = resolve_owner_id();
    let method = request.method.clone();
    let id = request.id.clone();
    let result = dispatch_method(&state, &owner_id, &trace_id, &request).await;

    match result {
        Ok(body) => {
            let mut response = Json(JsonRpcResponse::success(id, body.clone())).into_response();
            if method == "initialize" {
                set_initialize_headers(&mut response, &body);
            }
            response
        }
        Err(err) => {
            let mapped = error_code::from_error(&err, &trace_id);
            Json(JsonRpcResponse::failure(id, mapped)).into_response()
        }
    }
}

/// Spec §4.6: `initialize`'s response carries `Mcp-Session-Id` and
/// `Mcp-Protocol-Version` as headers, not just in the JSON body.
fn set_initialize_headers(response: &mut Response, body: &Value) {
    if let Some(session_id) = body.get("sessionId").and_then(Value::as_str) {
        if let Ok(value) = HeaderValue::from_str(session_id) {
            response.headers_mut().insert(SESSION_ID_HEADER, value);
        }
    }
    if let Some(protocol_version) = body.get("protocolVersion").and_then(Value::as_str) {
        if let Ok(value) = HeaderValue::from_str(protocol_version) {
            response.headers_mut().insert(PROTOCOL_VERSION_HEADER, value);
        }
    }
}

async fn dispatch_method(state: &Arc<AppState>, owner_id: &str, trace_id: &str, request: &JsonRpcRequest) -> contextd_domain::error::Result<Value> {
    match request.method.as_str() {
        "initialize" => handle_initialize(state, owner_id, &request.params),
        "tools/list" => Ok(tools::list()),
        "tools/call" => handle_tools_call(state, owner_id, trace_id, &request.params).await,
        "resources/list" => handle_resources_list(state, owner_id).await,
        "resources/read" => handle_resources_read(state, owner_id, &request.params).await,
        other => Err(Error::invalid_argument(format!("unknown method: {other}"))),
    }
}

fn handle_initialize(state: &Arc<AppState>, owner_id: &str, params: &Value) -> contextd_domain::error::Result<Value> {
    let requested_version = params.get("protocolVersion").and_then(Value::as_str).unwrap_or_default();
    let protocol_version = negotiate_protocol_version(requested_version);

    let client_info: ClientInfo = params
        .get("clientInfo")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err: serde_json::Error| Error::invalid_argument(err.to_string()))?
        .unwrap_or(ClientInfo { name: "unknown".to_owned(), version: "0".to_owned() });

    let session = state.sessions.create(Session::new(owner_id, protocol_version.clone(), client_info));

    Ok(json!({
        "protocolVersion": protocol_version,
        "serverInfo": {"name": "contextd", "version": crate::tools::handlers::SERVER_VERSION},
        "sessionId": session.id,
        "capabilities": {"tools": {}, "resources": {}},
    }))
}

async fn handle_tools_call(state: &Arc<AppState>, owner_id: &str, trace_id: &str, params: &Value) -> contextd_domain::error::Result<Value> {
    let name = params.get("name").and_then(Value::as_str).ok_or_else(|| Error::invalid_argument("missing tool name"))?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Object(Default::default()));
    let result = tools::dispatch(state, owner_id, trace_id, name, arguments).await?;
    if state.scrub_enabled { scrub_result(&state.secret_scanner, result).await } else { Ok(result) }
}

async fn handle_resources_list(state: &Arc<AppState>, owner_id: &str) -> contextd_domain::error::Result<Value> {
    let names = state.admin.list_collections(owner_id).await?;
    let mut resources = Vec::with_capacity(names.len());
    for name in names {
        let parsed = match identity::CollectionName::parse(&name) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(collection = %name, error = %err, "skipping malformed collection name in resources/list");
                continue;
            }
        };
        match state.vector_store.get_collection_info(&name).await {
            Ok(info) => resources.push(json!({
                "uri": identity::collection_uri(&parsed),
                "name": info.name,
                "mimeType": "application/json",
                "metadata": {"vectorSize": info.vector_size, "pointCount": info.point_count},
            })),
            Err(err) => tracing::warn!(collection = %name, error = %err, "skipping collection in resources/list"),
        }
    }
    Ok(json!({"resources": resources}))
}

async fn handle_resources_read(state: &Arc<AppState>, owner_id: &str, params: &Value) -> contextd_domain::error::Result<Value> {
    let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| Error::invalid_argument("missing uri"))?;
    let (uri_owner_id, name) = identity::parse_collection_uri(uri)?;
    if uri_owner_id != owner_id {
        return Err(Error::auth(format!("owner {owner_id} does not own collection {name}")));
    }
    let info = state.vector_store.get_collection_info(&name).await?;
    Ok(json!({
        "uri": uri,
        "name": info.name,
        "mimeType": "application/json",
        "metadata": {"vectorSize": info.vector_size, "pointCount": info.point_count},
    }))
}

async fn handle_sse(State(state): State<Arc<AppState>>, Path(operation_id): Path<String>) -> Response {
    let owner_id = resolve_owner_id();
    if state.registry.get(&owner_id, &operation_id).is_none() {
        return (StatusCode::NOT_FOUND, "operation not found").into_response();
    }

    let stream = state.events.subscribe_operation(operation_id).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        let kind = serde_json::to_value(event.kind).ok().and_then(|v| v.as_str().map(str::to_owned)).unwrap_or_else(|| "event".to_owned());
        Ok::<_, std::convert::Infallible>(Event::default().event(kind).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(SSE_HEARTBEAT_SECS)).text("heartbeat")).into_response()
}

fn bad_request(id: Value, trace_id: &str, message: &str) -> Response {
    let err = error_code::from_error(&Error::invalid_argument(message), trace_id);
    (StatusCode::BAD_REQUEST, Json(JsonRpcResponse::failure(id, err))).into_response()
}

/// Spec §4.6/§8 scenario (b): a missing or incomplete `Accept` header is
/// HTTP 406, not 400, carrying a `VectorStoreError`-range `-32000` code and
/// a message naming both required media types.
fn not_acceptable(id: Value, trace_id: &str) -> Response {
    let err = error_code::from_error(
        &Error::vector_store("Not Acceptable: Accept header must include both application/json and text/event-stream"),
        trace_id,
    );
    (StatusCode::NOT_ACCEPTABLE, Json(JsonRpcResponse::failure(id, err))).into_response()
}

/// Spec §4.6/§8 scenario (c): a missing or unknown `Mcp-Session-Id` is an
/// `AuthError` (`-32005`), with the exact message `"Valid session ID
/// required"`.
fn session_required(id: Value, trace_id: &str) -> Response {
    let mut err = error_code::from_error(&Error::auth("missing or unknown Mcp-Session-Id"), trace_id);
    err.message = "Valid session ID required".to_owned();
    (StatusCode::BAD_REQUEST, Json(JsonRpcResponse::failure(id, err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_is_reexported_and_works() {
        assert_eq!(negotiate_protocol_version("2024-11-05"), "2024-11-05");
    }

    #[test]
    fn accept_header_gate_rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(!accepts_streamable_http(&headers));
    }

    #[test]
    fn accept_header_gate_accepts_both_media_types() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));
        assert!(accepts_streamable_http(&headers));
    }
}
