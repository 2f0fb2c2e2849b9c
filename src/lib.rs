//! Prompt-plus-images generation against Gemini image models, with the
//! results saved to a directory, an S3-compatible bucket, or kept in memory.

pub mod config;
pub mod error;
pub mod gemini;
pub mod intake;
pub mod logger;
pub mod models;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, FilesystemConfig, GeminiConfig, ObjectStoreConfig, StorageConfig};
pub use error::{GenImageError, Result};
pub use gemini::{ContentGenerator, GeminiClient, GenerationClient};
pub use intake::{ImageIntake, DEFAULT_THUMBNAIL_SIZE};
pub use models::{
    AspectRatio, ContentPart, EncodedImage, GenerationOptions, GenerationResult, ImageAsset,
    ImageModel, OutputFormat, PersistOptions, PersistOutcome, PersistenceTarget, Slot,
    StoredArtifact,
};
pub use session::{GenerationReport, Session};
pub use storage::{PersistenceSelector, ResultPersister, StorageBackend};
