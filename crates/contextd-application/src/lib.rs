//! Application layer: stateless use cases orchestrating `contextd-domain`
//! ports. No dependency on any concrete backend or transport — every
//! service here is constructed from `Arc<dyn Port>` and holds no
//! persistent state of its own (spec §3 "Ownership summary").

pub mod admin_service;
pub mod checkpoint_service;
pub mod constants;
pub mod distiller;
pub mod memory_service;
pub mod remediation_service;
pub mod repository_service;
pub mod scheduler;
pub mod scope;
pub mod troubleshoot_service;

pub use admin_service::AdminService;
pub use checkpoint_service::CheckpointService;
pub use distiller::{ConsolidateOptions, ConsolidateOutcome, Distiller};
pub use memory_service::MemoryService;
pub use remediation_service::RemediationService;
pub use repository_service::RepositoryService;
pub use scheduler::Scheduler;
pub use troubleshoot_service::TroubleshootService;
