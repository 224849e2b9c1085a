//! Vector store backends implementing `contextd_domain::ports::VectorStoreProvider`
//! (spec §4.2): the embedded on-disk store and the external RPC client.

pub mod embedded;
pub mod external;

use std::sync::Arc;

use contextd_domain::error::{Error, Result};
use contextd_domain::ports::VectorStoreProvider;

use crate::config::{VectorStoreConfig, VectorStoreProviderKind};

/// `NewStore(provider)` (spec §4.2 "Factory"): build the configured
/// backend. Any `provider` value outside `{embedded, external}` is
/// rejected at config-load time (see `crate::config::validation`), so by
/// the time this runs the choice is already one of the two kinds.
pub async fn new_store(config: &VectorStoreConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    match config.provider {
        VectorStoreProviderKind::Embedded => {
            let root = if config.path.is_empty() {
                embedded::default_root().ok_or_else(|| Error::config("vectorstore.path", "no home directory to derive a default from"))?
            } else {
                std::path::PathBuf::from(&config.path)
            };
            let (store, quarantined) = embedded::EmbeddedVectorStore::open(&root).await?;
            for name in quarantined {
                tracing::warn!(collection = %name, "quarantined corrupt collection on startup");
            }
            Ok(Arc::new(store))
        }
        VectorStoreProviderKind::External => {
            let store = external::ExternalVectorStore::new(config)?;
            Ok(Arc::new(store))
        }
    }
}
