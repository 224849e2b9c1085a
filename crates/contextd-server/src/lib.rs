//! MCP transport for contextd: JSON-RPC over Streamable HTTP, the tool
//! catalogue, and async-operation SSE streaming.

pub mod identity;
pub mod scrub;
pub mod state;
pub mod tools;
pub mod transport;

pub use state::AppState;
pub use transport::http::router;
