use super::asset::OutputFormat;
use crate::config::ObjectStoreConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where generated images go. Chosen once at startup.
#[derive(Debug, Clone)]
pub enum PersistenceTarget {
    Filesystem(PathBuf),
    ObjectStore(ObjectStoreConfig),
    Ephemeral,
}

impl PersistenceTarget {
    pub fn mode(&self) -> &'static str {
        match self {
            PersistenceTarget::Filesystem(_) => "filesystem",
            PersistenceTarget::ObjectStore(_) => "s3",
            PersistenceTarget::Ephemeral => "memory",
        }
    }

    pub fn is_persistent(&self) -> bool {
        !matches!(self, PersistenceTarget::Ephemeral)
    }
}

impl fmt::Display for PersistenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceTarget::Filesystem(dir) => write!(f, "filesystem ({})", dir.display()),
            PersistenceTarget::ObjectStore(config) => write!(
                f,
                "s3 (bucket {} at {})",
                config.bucket.as_deref().unwrap_or("?"),
                config.endpoint.as_deref().unwrap_or("?")
            ),
            PersistenceTarget::Ephemeral => f.write_str("memory (download only)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PersistOptions {
    pub format: OutputFormat,
    pub date_folder: bool,
}

impl PersistOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_date_folder(mut self, enabled: bool) -> Self {
        self.date_folder = enabled;
        self
    }
}

/// Encoded output image, ready for download whether or not it was stored.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Forward-slash key, e.g. `2025-01-31/gemini_image_20250131_101500.png`.
    pub key: String,
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

impl EncodedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Name offered for download, without the date folder.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// Full filesystem path or object key.
    pub location: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub enum PersistOutcome {
    Stored(StoredArtifact),
    DownloadOnly(EncodedImage),
}

impl PersistOutcome {
    pub fn bytes(&self) -> &[u8] {
        match self {
            PersistOutcome::Stored(artifact) => &artifact.bytes,
            PersistOutcome::DownloadOnly(encoded) => &encoded.bytes,
        }
    }
}
