//! Global tracing subscriber setup (spec SPEC_FULL.md §2).
//!
//! Grounded on the teacher's workspace binaries, which install a
//! `tracing-subscriber` fmt layer driven by `RUST_LOG` once at process
//! startup (e.g. `docs-adr-validator/src/main.rs`); library crates here
//! never call this themselves, only emit `tracing::{debug,info,warn,error}!`.

use tracing_subscriber::EnvFilter;

/// Install the global JSON-formatted tracing subscriber. MUST be called
/// exactly once, from the binary crate's `main`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().with_target(true).init();
}
