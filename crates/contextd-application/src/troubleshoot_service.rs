//! Troubleshoot diagnosis (spec §6 `troubleshoot_diagnose`, async tool).
//!
//! The tool's input is `{errorMessage, context?}` with no `projectPath` —
//! unlike every other record-scoped tool. Decision (see `DESIGN.md`):
//! treat troubleshooting as an owner-wide concern rather than per-project,
//! searching a fixed `project_global/main` remediation scope so a fix
//! learned on one project is found from any other.

use std::sync::Arc;

use contextd_domain::error::Result;
use contextd_domain::ports::LlmProvider;

use crate::constants::TROUBLESHOOT_CONFIDENT_MATCH_SCORE;
use crate::remediation_service::RemediationService;

const GLOBAL_PROJECT_ID: &str = "global";
const GLOBAL_BRANCH: &str = "main";

/// Where a diagnosis came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum DiagnosisSource {
    /// A previously recorded remediation matched with high confidence.
    Remediation {
        /// The matched remediation's ID.
        remediation_id: String,
    },
    /// No confident remediation match; the LLM was consulted instead.
    Llm,
    /// No confident remediation match and no LLM configured.
    NoMatch,
}

/// Result of one `troubleshoot_diagnose` call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnosis {
    /// Suggested solution text, if any.
    pub solution: Option<String>,
    /// Where the solution came from.
    pub source: DiagnosisSource,
}

/// Diagnoses errors by matching against recorded remediations, falling
/// back to the LLM collaborator when there's no confident match.
pub struct TroubleshootService {
    remediations: Arc<RemediationService>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl TroubleshootService {
    /// Build a troubleshoot service over the given remediation service and
    /// an optional LLM collaborator.
    #[must_use]
    pub fn new(remediations: Arc<RemediationService>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { remediations, llm }
    }

    /// Diagnose an error (spec §6 `troubleshoot_diagnose`).
    pub async fn diagnose(&self, owner_id: &str, error_message: &str, context: Option<&str>) -> Result<Diagnosis> {
        let hits = self.remediations.search(owner_id, GLOBAL_PROJECT_ID, GLOBAL_BRANCH, error_message, 1).await?;
        if let Some(hit) = hits.into_iter().next() {
            if hit.score >= TROUBLESHOOT_CONFIDENT_MATCH_SCORE {
                return Ok(Diagnosis {
                    solution: Some(hit.remediation.solution),
                    source: DiagnosisSource::Remediation { remediation_id: hit.remediation.header.id },
                });
            }
        }

        let Some(llm) = &self.llm else {
            return Ok(Diagnosis { solution: None, source: DiagnosisSource::NoMatch });
        };

        let mut prompt = format!("Diagnose this error and suggest a fix:\n{error_message}\n");
        if let Some(context) = context {
            prompt.push_str(&format!("Context:\n{context}\n"));
        }
        let solution = llm.complete(&prompt).await?;
        Ok(Diagnosis { solution: Some(solution), source: DiagnosisSource::Llm })
    }

    /// The collection scope troubleshoot diagnoses search/write against,
    /// for callers that want to record a successful diagnosis as a new
    /// remediation (spec §6 `remediation_record`).
    #[must_use]
    pub fn global_scope(owner_id: &str) -> (String, String, String) {
        (owner_id.to_owned(), GLOBAL_PROJECT_ID.to_owned(), GLOBAL_BRANCH.to_owned())
    }
}
