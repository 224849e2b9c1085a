//! Maps every [`Error`] variant to its JSON-RPC error code (spec §4.6's
//! 13-row table). The match has no wildcard arm on purpose: adding a new
//! `Error` variant without updating this file is a compile error.

use serde_json::json;

use contextd_domain::error::Error;

use super::JsonRpcError;

/// Standard JSON-RPC parse failure: the request body wasn't valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// Malformed request: wrong `jsonrpc` version, missing `method`, bad headers.
pub const INVALID_REQUEST: i64 = -32600;
/// Unknown JSON-RPC `method`.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Well-formed request, invalid parameters for the method/tool.
pub const INVALID_PARAMS: i64 = -32602;
/// Unclassified internal failure.
pub const INTERNAL_ERROR: i64 = -32603;
/// Vector store backend failure.
pub const VECTOR_STORE_ERROR: i64 = -32000;
/// Secret scrubbing failed; the caller must fail closed.
pub const SECRET_SCRUB_ERROR: i64 = -32001;
/// Git/VCS operation failure (unused by this implementation; branch
/// resolution degrades instead of failing — see `DESIGN.md`).
pub const GIT_ERROR: i64 = -32002;
/// Operation event bus failure.
pub const BUS_ERROR: i64 = -32003;
/// Embedding provider failure.
pub const EMBEDDING_ERROR: i64 = -32004;
/// Caller is not the owner of the requested resource.
pub const AUTH_ERROR: i64 = -32005;
/// Configuration error.
pub const CONFIG_ERROR: i64 = -32006;
/// Referenced operation ID not found (or not owned by caller).
pub const OPERATION_NOT_FOUND: i64 = -32007;

/// One of the classification tags named in spec §7's error taxonomy,
/// carried in every JSON-RPC error's `data.classification`.
fn classify(err: &Error) -> &'static str {
    match err {
        Error::NotFound { .. } | Error::OperationNotFound { .. } => "not-found",
        Error::InvalidArgument { .. }
        | Error::InvalidCollectionName { .. }
        | Error::AlreadyExists { .. }
        | Error::DimensionMismatch { .. } => "validation",
        Error::AuthError { .. } => "auth",
        Error::VectorStore { transient: true, .. } | Error::Embedding { .. } | Error::Bus { .. } => "transient-infra",
        Error::VectorStore { transient: false, .. } | Error::Llm { .. } | Error::Io { .. } | Error::Internal { .. } => {
            "permanent-infra"
        }
        Error::SecretScrub { .. } => "secret-scrub-failure",
        Error::Config { .. } => "fatal",
        Error::Json { .. } => "validation",
    }
}

/// Map a domain [`Error`] to the JSON-RPC error code/message pair spec
/// §4.6 requires, never leaking `source` detail for auth/not-found
/// failures. `data` carries `trace_id`, `timestamp` and `classification`
/// per spec §7.
#[must_use]
pub fn from_error(err: &Error, trace_id: &str) -> JsonRpcError {
    let (code, message) = match err {
        Error::NotFound { resource } => (METHOD_NOT_FOUND, format!("not found: {resource}")),
        Error::InvalidArgument { message } => (INVALID_PARAMS, message.clone()),
        Error::InvalidCollectionName { name } => (INVALID_PARAMS, format!("invalid collection name: {name}")),
        Error::AlreadyExists { resource } => (INVALID_PARAMS, format!("already exists: {resource}")),
        Error::DimensionMismatch { expected, actual } => {
            (INVALID_PARAMS, format!("dimension mismatch: expected {expected}, got {actual}"))
        }
        Error::AuthError { .. } => (AUTH_ERROR, "unauthorized".to_owned()),
        Error::VectorStore { message, .. } => (VECTOR_STORE_ERROR, message.clone()),
        Error::Embedding { message } => (EMBEDDING_ERROR, message.clone()),
        Error::Llm { message } => (INTERNAL_ERROR, message.clone()),
        Error::SecretScrub { message } => (SECRET_SCRUB_ERROR, message.clone()),
        Error::Config { key, message } => (CONFIG_ERROR, format!("configuration error for '{key}': {message}")),
        Error::Bus { message } => (BUS_ERROR, message.clone()),
        Error::OperationNotFound { id } => (OPERATION_NOT_FOUND, format!("operation not found: {id}")),
        Error::Io { message, .. } => (INTERNAL_ERROR, message.clone()),
        Error::Json { source } => (PARSE_ERROR, source.to_string()),
        Error::Internal { message } => (INTERNAL_ERROR, message.clone()),
    };
    let data = json!({
        "trace_id": trace_id,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "classification": classify(err),
    });
    JsonRpcError { code, message, data: Some(data) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_never_leaks_internal_message() {
        let err = Error::auth("owner mismatch: alice != bob");
        let mapped = from_error(&err, "trace-1");
        assert_eq!(mapped.code, AUTH_ERROR);
        assert_eq!(mapped.message, "unauthorized");
    }

    #[test]
    fn operation_not_found_maps_to_its_own_code() {
        let mapped = from_error(&Error::operation_not_found("op-1"), "trace-1");
        assert_eq!(mapped.code, OPERATION_NOT_FOUND);
    }

    #[test]
    fn vector_store_error_surfaces_message() {
        let mapped = from_error(&Error::vector_store("disk full"), "trace-1");
        assert_eq!(mapped.code, VECTOR_STORE_ERROR);
        assert_eq!(mapped.message, "disk full");
    }

    #[test]
    fn data_carries_trace_id_and_classification() {
        let mapped = from_error(&Error::invalid_argument("bad limit"), "trace-42");
        let data = mapped.data.unwrap();
        assert_eq!(data["trace_id"], "trace-42");
        assert_eq!(data["classification"], "validation");
        assert!(data["timestamp"].is_string());
    }
}
