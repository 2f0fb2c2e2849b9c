use crate::{
    error::Result,
    models::{EncodedImage, PersistOptions, PersistOutcome, StoredArtifact},
    storage::StorageBackend,
};
use chrono::{Local, NaiveDateTime};
use image::DynamicImage;

pub const FILENAME_PREFIX: &str = "gemini_image_";

/// `gemini_image_<YYYYMMDD_HHMMSS>.<ext>`, optionally under `<YYYY-MM-DD>/`.
/// Keys always use forward slashes. Two calls within the same second collide.
pub fn artifact_key(now: NaiveDateTime, options: &PersistOptions) -> String {
    numbered_artifact_key(now, options, 1)
}

/// Like [`artifact_key`], with `_<ordinal>` before the extension for every
/// image after the first of one response.
pub fn numbered_artifact_key(
    now: NaiveDateTime,
    options: &PersistOptions,
    ordinal: usize,
) -> String {
    let suffix = if ordinal > 1 {
        format!("_{}", ordinal)
    } else {
        String::new()
    };
    let file_name = format!(
        "{}{}{}.{}",
        FILENAME_PREFIX,
        now.format("%Y%m%d_%H%M%S"),
        suffix,
        options.format.extension()
    );

    if options.date_folder {
        format!("{}/{}", now.format("%Y-%m-%d"), file_name)
    } else {
        file_name
    }
}

fn encode_as(image: &DynamicImage, options: &PersistOptions, key: String) -> Result<EncodedImage> {
    let bytes = options.format.encode(image)?;
    Ok(EncodedImage {
        key,
        bytes,
        format: options.format,
    })
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone, Copy)]
pub struct ResultPersister {
    clock: fn() -> NaiveDateTime,
}

impl Default for ResultPersister {
    fn default() -> Self {
        Self { clock: local_now }
    }
}

impl ResultPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Re-encodes the image and names it; the result is what gets offered
    /// for download, stored or not.
    pub fn encode(&self, image: &DynamicImage, options: &PersistOptions) -> Result<EncodedImage> {
        encode_as(image, options, artifact_key((self.clock)(), options))
    }

    /// Encodes every image of one response under a single timestamp, so each
    /// one gets its own key.
    pub fn encode_all(
        &self,
        images: &[DynamicImage],
        options: &PersistOptions,
    ) -> Vec<Result<EncodedImage>> {
        let now = (self.clock)();
        images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                encode_as(image, options, numbered_artifact_key(now, options, index + 1))
            })
            .collect()
    }

    /// Writes through the selected backend exactly once. A failed write is
    /// returned as is; no other backend is tried.
    pub async fn store(
        &self,
        encoded: &EncodedImage,
        backend: &StorageBackend,
    ) -> Result<PersistOutcome> {
        let Some(writer) = backend.writer() else {
            log::info!(
                "Image {} is available for download only (not stored permanently)",
                encoded.file_name()
            );
            return Ok(PersistOutcome::DownloadOnly(encoded.clone()));
        };

        match writer
            .write(&encoded.key, &encoded.bytes, encoded.content_type())
            .await
        {
            Ok(location) => Ok(PersistOutcome::Stored(StoredArtifact {
                location,
                bytes: encoded.bytes.clone(),
                content_type: encoded.content_type().to_string(),
            })),
            Err(e) => {
                log::error!("Saving to {} failed: {}", writer.describe(), e);
                Err(e)
            }
        }
    }

    pub async fn persist(
        &self,
        image: &DynamicImage,
        backend: &StorageBackend,
        options: &PersistOptions,
    ) -> Result<PersistOutcome> {
        let encoded = self.encode(image, options)?;
        self.store(&encoded, backend).await
    }
}
