use crate::{
    error::{GenImageError, Result},
    models::{decode_rgb, ImageAsset, Slot},
};
use image::{imageops::FilterType, DynamicImage};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

/// Uploaded images for one session, keyed by slot.
#[derive(Debug, Default)]
pub struct ImageIntake {
    slots: BTreeMap<Slot, ImageAsset>,
}

impl ImageIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and stores `bytes` under `slot`, replacing any earlier upload.
    /// On failure the slot ends up empty.
    pub fn upload(&mut self, slot: Slot, bytes: &[u8]) -> Result<&ImageAsset> {
        self.slots.remove(&slot);

        let image = decode_rgb(bytes).map_err(|e| {
            log::warn!("Rejected upload for {}: {}", slot, e);
            e
        })?;

        let asset = ImageAsset::new(slot, image);
        log::debug!(
            "Stored {} ({}x{})",
            slot,
            asset.image.width(),
            asset.image.height()
        );
        Ok(self.slots.entry(slot).or_insert(asset))
    }

    /// Empty or missing bytes clear the slot.
    pub fn submit(&mut self, slot: Slot, bytes: Option<&[u8]>) -> Result<Option<&ImageAsset>> {
        match bytes {
            Some(bytes) if !bytes.is_empty() => self.upload(slot, bytes).map(Some),
            _ => {
                self.clear(slot);
                Ok(None)
            }
        }
    }

    pub fn clear(&mut self, slot: Slot) -> Option<ImageAsset> {
        self.slots.remove(&slot)
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }

    pub fn get(&self, slot: Slot) -> Option<&ImageAsset> {
        self.slots.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stored assets in slot order.
    pub fn assets(&self) -> Vec<ImageAsset> {
        self.slots.values().cloned().collect()
    }

    /// Assets for a generate call; slot 1 must be filled.
    pub fn request_images(&self) -> Result<Vec<ImageAsset>> {
        if !self.slots.keys().any(Slot::is_required) {
            return Err(GenImageError::ValidationError(
                "Please upload at least the first image".into(),
            ));
        }
        Ok(self.assets())
    }

    pub fn thumbnail(&self, slot: Slot, max_dim: u32) -> Option<DynamicImage> {
        self.get(slot).map(|asset| thumbnail(&asset.image, max_dim))
    }
}

/// Fits `image` inside a `max_dim` square, keeping its aspect ratio. Smaller
/// images are returned at their original size.
pub fn thumbnail(image: &DynamicImage, max_dim: u32) -> DynamicImage {
    let max_dim = max_dim.max(1);
    if image.width() <= max_dim && image.height() <= max_dim {
        return image.clone();
    }
    image.resize(max_dim, max_dim, FilterType::Lanczos3)
}

/// Writes a preview as PNG, creating its folder first.
pub fn save_thumbnail(image: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GenImageError::FilesystemWriteError(format!(
                "cannot create {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| GenImageError::FilesystemWriteError(format!("{}: {}", path.display(), e)))
}
