use crate::error::GenImageError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One piece of a request or response: free text or inline image bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        ContentPart::Image {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentPart::Image { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageModel {
    #[default]
    #[serde(rename = "gemini-3.0-nano-banana-pro")]
    NanoBananaPro,
    #[serde(rename = "gemini-2.5-flash-image-preview")]
    FlashImagePreview,
}

impl ImageModel {
    /// The name shown to users.
    pub fn id(&self) -> &'static str {
        match self {
            ImageModel::NanoBananaPro => "gemini-3.0-nano-banana-pro",
            ImageModel::FlashImagePreview => "gemini-2.5-flash-image-preview",
        }
    }

    /// The model name sent to the Gemini API.
    pub fn api_name(&self) -> &'static str {
        match self {
            ImageModel::NanoBananaPro => "gemini-3-pro-image-preview",
            ImageModel::FlashImagePreview => "gemini-2.5-flash-image-preview",
        }
    }

    pub fn supports_aspect_ratio(&self) -> bool {
        matches!(self, ImageModel::NanoBananaPro)
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ImageModel {
    type Err = GenImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pro" | "gemini-3.0-nano-banana-pro" | "gemini-3-pro-image-preview" => {
                Ok(ImageModel::NanoBananaPro)
            }
            "flash" | "gemini-2.5-flash-image-preview" => Ok(ImageModel::FlashImagePreview),
            other => Err(GenImageError::ValidationError(format!(
                "unknown model '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Tall => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = GenImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Widescreen),
            "4:3" => Ok(AspectRatio::Landscape),
            "3:4" => Ok(AspectRatio::Portrait),
            "9:16" => Ok(AspectRatio::Tall),
            other => Err(GenImageError::ValidationError(format!(
                "unsupported aspect ratio '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOptions {
    pub model: ImageModel,
    pub aspect_ratio: Option<AspectRatio>,
}

impl GenerationOptions {
    pub fn new(model: ImageModel) -> Self {
        Self {
            model,
            aspect_ratio: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }
}

/// Output of one generate call. Holds at least one image when returned as `Ok`.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: Option<String>,
    pub images: Vec<DynamicImage>,
}

impl GenerationResult {
    /// The image the session exposes for display and download.
    pub fn latest_image(&self) -> Option<&DynamicImage> {
        self.images.last()
    }
}
