//! End-to-end scenarios over the `/mcp` surface: initialize handshake,
//! header/session gating, unknown tool, and the async-operation
//! lifecycle (the single most important one: the worker must still run
//! to completion after the HTTP response that started it has returned).

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use contextd_application::{AdminService, CheckpointService, Distiller, MemoryService, RemediationService, RepositoryService, Scheduler, TroubleshootService};
use contextd_infrastructure::{EventBus, EmbeddedVectorStore, Git2VcsProvider, LocalEmbedder, OperationRegistry, RegexSecretScanner, SessionStore};
use contextd_server::AppState;

const STREAMABLE_ACCEPT: &str = "application/json, text/event-stream";

async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let (store, _quarantined) = EmbeddedVectorStore::open(dir.path()).await.unwrap();
    let vector_store: Arc<dyn contextd_domain::ports::VectorStoreProvider> = Arc::new(store);

    let embedder = Arc::new(LocalEmbedder::new(8));
    let memory = Arc::new(MemoryService::new(Arc::clone(&vector_store), embedder.clone()));
    let checkpoint = Arc::new(CheckpointService::new(Arc::clone(&vector_store), embedder.clone()));
    let remediation = Arc::new(RemediationService::new(Arc::clone(&vector_store), embedder.clone()));
    let repository = Arc::new(RepositoryService::new(Arc::clone(&vector_store), embedder.clone()));
    let admin = Arc::new(AdminService::new(Arc::clone(&vector_store)));
    let troubleshoot = Arc::new(TroubleshootService::new(Arc::clone(&remediation), None));
    let distiller = Arc::new(Distiller::new(Arc::clone(&vector_store), embedder, None));
    let scheduler = Arc::new(Scheduler::new(Arc::clone(&distiller), Arc::clone(&vector_store), std::time::Duration::from_secs(3600)));

    let events = Arc::new(EventBus::new());
    let state = Arc::new(AppState {
        sessions: Arc::new(SessionStore::new()),
        registry: Arc::new(OperationRegistry::new(Arc::clone(&events))),
        events,
        vcs: Arc::new(Git2VcsProvider::new()),
        vector_store,
        secret_scanner: Arc::new(RegexSecretScanner::new()),
        scrub_enabled: true,
        memory,
        checkpoint,
        remediation,
        repository,
        admin,
        troubleshoot,
        distiller,
        scheduler,
    });
    (state, dir)
}

fn router(state: Arc<AppState>) -> Router {
    contextd_server::router(state)
}

fn mcp_request(body: Value, session_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, STREAMABLE_ACCEPT);
    if let Some(id) = session_id {
        builder = builder.header("Mcp-Session-Id", id);
    }
    builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn initialize_without_session_header_succeeds_and_mints_one() {
    let (state, _dir) = test_state().await;
    let app = router(state);

    let request = mcp_request(
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "test", "version": "1"}}}),
        None,
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_header = response.headers().get("Mcp-Session-Id").unwrap().to_str().unwrap().to_owned();
    let protocol_header = response.headers().get("Mcp-Protocol-Version").unwrap().to_str().unwrap().to_owned();
    assert_eq!(protocol_header, "2024-11-05");

    let body = body_json(response).await;
    assert!(body["error"].is_null());
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(body["result"]["sessionId"], session_header);
}

#[tokio::test]
async fn missing_accept_header_is_not_acceptable() {
    let (state, _dir) = test_state().await;
    let app = router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32000);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("application/json"));
    assert!(message.contains("text/event-stream"));
}

#[tokio::test]
async fn tools_call_without_session_requires_valid_session_id() {
    let (state, _dir) = test_state().await;
    let app = router(state);

    let request = mcp_request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {"name": "status", "arguments": {}}}), None);
    let response = app.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], contextd_server::transport::error_code::AUTH_ERROR);
    assert_eq!(body["error"]["message"], "Valid session ID required");
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let (state, _dir) = test_state().await;
    let app = router(Arc::clone(&state));

    let init = mcp_request(
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "t", "version": "1"}}}),
        None,
    );
    let init_body = body_json(app.oneshot(init).await.unwrap()).await;
    let session_id = init_body["result"]["sessionId"].as_str().unwrap().to_owned();

    let app = router(state);
    let request = mcp_request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "not_a_real_tool", "arguments": {}}}), Some(&session_id));
    let response = app.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], contextd_server::transport::error_code::INVALID_PARAMS);
}

#[tokio::test]
async fn status_without_operation_id_reports_running() {
    let (state, _dir) = test_state().await;
    let app = router(Arc::clone(&state));

    let init = mcp_request(
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "t", "version": "1"}}}),
        None,
    );
    let init_body = body_json(app.oneshot(init).await.unwrap()).await;
    let session_id = init_body["result"]["sessionId"].as_str().unwrap().to_owned();

    let app = router(state);
    let request = mcp_request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "status", "arguments": {}}}), Some(&session_id));
    let response = app.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["status"], "running");
}

/// Property 8: the async worker must keep running, and its result must
/// become observable through `status`, after the request that spawned it
/// has already returned its `pending` envelope.
#[tokio::test]
async fn async_operation_completes_after_response_returns() {
    let (state, _dir) = test_state().await;
    let app = router(Arc::clone(&state));

    let init = mcp_request(
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "t", "version": "1"}}}),
        None,
    );
    let init_body = body_json(app.oneshot(init).await.unwrap()).await;
    let session_id = init_body["result"]["sessionId"].as_str().unwrap().to_owned();

    let owner_id = contextd_server::identity::resolve_owner_id();
    let collection_name = format!("owner_{owner_id}/project_p/main");

    let app = router(Arc::clone(&state));
    let collection_request = mcp_request(
        json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "collection_create", "arguments": {"collection_name": collection_name, "vector_size": 8}},
        }),
        Some(&session_id),
    );
    let response = app.oneshot(collection_request).await.unwrap();
    let body = body_json(response).await;
    assert!(body["error"].is_null(), "collection_create failed: {body:?}");
    let operation_id = body["result"]["operation_id"].as_str().unwrap().to_owned();
    assert_eq!(body["result"]["status"], "pending");

    // The spawned worker is detached from this already-completed request;
    // give the runtime a tick to drive it to completion.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let app = router(state);
    let poll = mcp_request(
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "status", "arguments": {"operation_id": operation_id}}}),
        Some(&session_id),
    );
    let response = app.oneshot(poll).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["status"], "completed", "operation did not complete: {body:?}");
}
