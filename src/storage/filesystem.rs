use crate::{
    error::{GenImageError, Result},
    storage::traits::ArtifactWriter,
};
use async_trait::async_trait;
use std::path::PathBuf;

pub struct FilesystemWriter {
    root: PathBuf,
}

impl FilesystemWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a forward-slash key onto the host's path separators.
    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl ArtifactWriter for FilesystemWriter {
    async fn write(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GenImageError::FilesystemWriteError(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            GenImageError::FilesystemWriteError(format!("cannot write {}: {}", path.display(), e))
        })?;

        log::info!("Saved to filesystem: {}", path.display());
        Ok(path.display().to_string())
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}
