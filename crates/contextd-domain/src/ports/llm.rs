//! The LLM-used-for-synthesis collaborator (spec §1 non-goals, §6).

use async_trait::async_trait;

use crate::error::Result;

/// `LLM.Complete(prompt) -> text` (spec §6). Consumed only by the
/// distiller's synthesis step (spec §4.9 step 4); implementations MUST
/// tolerate being unreachable — the distiller degrades to a deterministic
/// fallback rather than failing the whole consolidation run.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt, returning raw text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
