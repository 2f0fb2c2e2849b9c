use crate::error::{GenImageError, Result};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

pub const MAX_SLOTS: u8 = 4;

/// One of the four fixed upload positions. Slot 1 is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Slot(u8);

impl Slot {
    pub const FIRST: Slot = Slot(1);

    pub fn new(index: u8) -> Result<Self> {
        if (1..=MAX_SLOTS).contains(&index) {
            Ok(Slot(index))
        } else {
            Err(GenImageError::ValidationError(format!(
                "image slot must be between 1 and {}, got {}",
                MAX_SLOTS, index
            )))
        }
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn is_required(&self) -> bool {
        *self == Slot::FIRST
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=MAX_SLOTS).map(Slot)
    }
}

impl TryFrom<u8> for Slot {
    type Error = GenImageError;

    fn try_from(index: u8) -> Result<Self> {
        Slot::new(index)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img{}", self.0)
    }
}

/// A decoded, RGB-normalized upload and the slot it came from.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub slot: Slot,
    pub image: DynamicImage,
}

impl ImageAsset {
    pub fn new(slot: Slot, image: DynamicImage) -> Self {
        Self {
            slot,
            image: DynamicImage::ImageRgb8(image.to_rgb8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    /// Re-encodes `image` as 8-bit RGB in this format.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buffer = Cursor::new(Vec::new());
        rgb.write_to(&mut buffer, self.image_format())
            .map_err(|e| GenImageError::EncodeError(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

impl FromStr for OutputFormat {
    type Err = GenImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(GenImageError::ValidationError(format!(
                "unsupported output format '{}', expected png or jpeg",
                other
            ))),
        }
    }
}

/// Decodes PNG or JPEG bytes into an RGB bitmap; any other format is rejected.
pub fn decode_rgb(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| GenImageError::DecodeError(format!("unrecognized image data: {}", e)))?;

    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(GenImageError::DecodeError(format!(
            "unsupported image format {:?}, expected PNG or JPEG",
            format
        )));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| GenImageError::DecodeError(e.to_string()))?;
    Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encoded_sample, sample_image};

    #[test]
    fn test_slot_bounds() {
        assert!(Slot::new(0).is_err());
        assert!(Slot::new(5).is_err());
        assert_eq!(Slot::try_from(4).unwrap().index(), 4);
        assert!(Slot::FIRST.is_required());
        assert!(!Slot::new(2).unwrap().is_required());
        assert_eq!(Slot::all().count(), 4);
        assert_eq!(Slot::new(3).unwrap().to_string(), "img3");
    }

    #[test]
    fn test_output_format_naming() {
        assert_eq!(OutputFormat::default(), OutputFormat::Png);
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert!("webp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_decode_accepts_png_and_jpeg() {
        let png = encoded_sample(ImageFormat::Png, 8, 6);
        let decoded = decode_rgb(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));

        let jpeg = encoded_sample(ImageFormat::Jpeg, 8, 6);
        assert!(decode_rgb(&jpeg).is_ok());
    }

    #[test]
    fn test_decode_rejects_other_formats() {
        let bmp = encoded_sample(ImageFormat::Bmp, 4, 4);
        assert!(matches!(decode_rgb(&bmp), Err(GenImageError::DecodeError(_))));
        assert!(matches!(
            decode_rgb(b"definitely not an image"),
            Err(GenImageError::DecodeError(_))
        ));
    }

    #[test]
    fn test_png_encoding_is_lossless() {
        let original = sample_image(5, 7);
        let bytes = OutputFormat::Png.encode(&original).unwrap();
        let decoded = decode_rgb(&bytes).unwrap();
        assert_eq!(decoded.to_rgb8(), original.to_rgb8());
    }
}
