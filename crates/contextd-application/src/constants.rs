//! Application-layer tunables (spec §4.8/§4.9 numeric constants live in
//! `contextd_domain::constants`; this module holds the handful that are
//! specific to how this layer composes them).

/// How many candidates to fetch per repository search hit before any
/// future rescoring — repository documents have no consolidation boost,
/// so this is intentionally 1x rather than the memory search multiplier.
pub const REPOSITORY_SEARCH_MULTIPLIER: usize = 1;

/// Files skipped during repository indexing (spec §2 "Tool handlers" ->
/// `repository_index`; grounded on `mcb-application::constants::SKIP_DIRS`).
pub const SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", "__pycache__", ".venv"];

/// A remediation search hit above this similarity is treated as an
/// authoritative match by `troubleshoot_diagnose`, skipping the LLM call.
pub const TROUBLESHOOT_CONFIDENT_MATCH_SCORE: f32 = 0.85;
