//! Concrete adapters for contextd: vector store backends, the operation
//! registry, the session store, the in-process event bus, configuration
//! loading, and logging setup.
//!
//! Nothing in the application layer depends on this crate's types
//! directly — everything here implements a `contextd_domain::ports`
//! trait or stands alone as a binary-crate concern (config, logging).

pub mod config;
pub mod embedder;
pub mod events;
pub mod logging;
pub mod registry;
pub mod secret_scanner;
pub mod session;
pub mod vcs;
pub mod vector_store;

pub use config::{ContextdConfig, load_config};
pub use embedder::LocalEmbedder;
pub use events::{EventBus, OperationEvent};
pub use registry::OperationRegistry;
pub use secret_scanner::RegexSecretScanner;
pub use session::SessionStore;
pub use vcs::Git2VcsProvider;
pub use vector_store::embedded::EmbeddedVectorStore;
pub use vector_store::external::ExternalVectorStore;
pub use vector_store::new_store;
