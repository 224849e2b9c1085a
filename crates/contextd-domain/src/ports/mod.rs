//! Port traits: the seams between the application layer and the
//! concrete adapters that live in `contextd-infrastructure`.

mod embedder;
mod llm;
mod secret_scanner;
mod vcs;
mod vector_store;

pub use embedder::{Embedding, EmbeddingProvider};
pub use llm::LlmProvider;
pub use secret_scanner::{SecretScanner, SecretSpan};
pub use vcs::VcsProvider;
pub use vector_store::{CollectionInfo, SearchHit, VectorStoreProvider};
