pub mod filesystem;
pub mod persister;
pub mod s3;
pub mod traits;

use crate::{config::StorageConfig, models::PersistenceTarget};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use filesystem::FilesystemWriter;
pub use persister::{artifact_key, numbered_artifact_key, ResultPersister};
pub use s3::{S3Connector, S3Writer};
pub use traits::{ArtifactWriter, ObjectStoreConnector};

/// The selected persistence target and the writer that serves it. Built once
/// and shared read-only between sessions.
#[derive(Clone)]
pub struct StorageBackend {
    target: PersistenceTarget,
    writer: Option<Arc<dyn ArtifactWriter>>,
}

impl StorageBackend {
    pub fn ephemeral() -> Self {
        Self {
            target: PersistenceTarget::Ephemeral,
            writer: None,
        }
    }

    pub fn filesystem(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            writer: Some(Arc::new(FilesystemWriter::new(dir.clone()))),
            target: PersistenceTarget::Filesystem(dir),
        }
    }

    pub fn object_store(
        config: crate::config::ObjectStoreConfig,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        Self {
            target: PersistenceTarget::ObjectStore(config),
            writer: Some(writer),
        }
    }

    pub fn target(&self) -> &PersistenceTarget {
        &self.target
    }

    /// `None` for the ephemeral backend.
    pub fn writer(&self) -> Option<&Arc<dyn ArtifactWriter>> {
        self.writer.as_ref()
    }
}

impl fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBackend")
            .field("target", &self.target)
            .field("writer", &self.writer.as_ref().map(|w| w.describe()))
            .finish()
    }
}

/// Picks exactly one backend: filesystem, then object store, then memory.
#[derive(Clone)]
pub struct PersistenceSelector {
    connector: Arc<dyn ObjectStoreConnector>,
}

impl Default for PersistenceSelector {
    fn default() -> Self {
        Self {
            connector: Arc::new(S3Connector),
        }
    }
}

impl PersistenceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(connector: Arc<dyn ObjectStoreConnector>) -> Self {
        Self { connector }
    }

    /// An object store that cannot be reached or prepared drops straight to
    /// memory-only; the filesystem is not reconsidered.
    pub async fn select(&self, config: &StorageConfig) -> StorageBackend {
        if let Some(dir) = config.filesystem.existing_dir() {
            log::info!("Save mode: FILESYSTEM ({})", dir.display());
            return StorageBackend::filesystem(dir.clone());
        }
        if let Some(path) = &config.filesystem.save_path {
            log::warn!(
                "FILESYSTEM_SAVE_PATH {} is not an existing directory, ignoring it",
                path.display()
            );
        }

        let object_store = &config.object_store;
        if object_store.is_complete() {
            match self.connector.connect(object_store).await {
                Ok(writer) => {
                    log::info!("Save mode: S3 ({})", writer.describe());
                    return StorageBackend::object_store(object_store.clone(), writer);
                }
                Err(e) => {
                    log::error!("MinIO/S3 init error: {}", e);
                }
            }
        }

        log::info!("Save mode: MEMORY (images can only be downloaded)");
        StorageBackend::ephemeral()
    }
}
