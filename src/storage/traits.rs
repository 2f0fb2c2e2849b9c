use crate::{config::ObjectStoreConfig, error::Result};
use async_trait::async_trait;
use std::sync::Arc;

/// The one capability a persistent backend offers.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Writes `bytes` under the forward-slash `key` and returns where they
    /// landed (a filesystem path or an object key).
    async fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    fn describe(&self) -> String;
}

/// Builds a writer for an object store, verifying (and creating, if needed)
/// the bucket before handing it out.
#[async_trait]
pub trait ObjectStoreConnector: Send + Sync {
    async fn connect(&self, config: &ObjectStoreConfig) -> Result<Arc<dyn ArtifactWriter>>;
}
