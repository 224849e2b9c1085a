//! JSON-RPC 2.0 envelope and MCP protocol plumbing (spec §4.6).
//!
//! Hand-rolled rather than built on an MCP SDK: the wire contract here
//! (required `Mcp-Session-Id` on every non-`initialize` call, a specific
//! `Accept` negotiation, an exhaustive 13-row error code table, a
//! per-operation SSE path) is bespoke and plain `serde` structs track it
//! exactly (see `DESIGN.md`).

pub mod error_code;
pub mod headers;
pub mod http;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An incoming JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// MUST be `"2.0"`, rejected otherwise as `InvalidRequest`.
    pub jsonrpc: String,
    /// Request ID, echoed verbatim in the response.
    pub id: Value,
    /// The dispatched method name.
    pub method: String,
    /// Method-specific parameters.
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// One of the codes in spec §4.6's table.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional extra detail; never used to leak internal detail for
    /// auth/not-found failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response: exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echoes the request's `id` (or `Value::Null` for a parse failure
    /// that never got far enough to see an ID).
    pub id: Value,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0".to_owned(), id, result: Some(result), error: None }
    }

    /// Build an error response.
    #[must_use]
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0".to_owned(), id, result: None, error: Some(error) }
    }
}

/// Negotiate a protocol version: if the client's requested version is one
/// contextd supports, echo it back; otherwise fall back to the newest
/// version this server understands (spec §4.6).
#[must_use]
pub fn negotiate_protocol_version(requested: &str) -> String {
    let supported = contextd_domain::constants::SUPPORTED_PROTOCOL_VERSIONS;
    if supported.contains(&requested) {
        requested.to_owned()
    } else {
        (*supported.last().expect("at least one supported protocol version")).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_known_version_is_echoed() {
        assert_eq!(negotiate_protocol_version("2024-11-05"), "2024-11-05");
    }

    #[test]
    fn negotiate_unknown_version_falls_back_to_newest_supported() {
        let negotiated = negotiate_protocol_version("1999-01-01");
        assert_eq!(negotiated, *contextd_domain::constants::SUPPORTED_PROTOCOL_VERSIONS.last().unwrap());
    }
}
