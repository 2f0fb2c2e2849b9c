use super::ContentGenerator;
use crate::{
    error::{GenImageError, Result},
    logger,
    models::{
        decode_rgb, ContentPart, GenerationOptions, GenerationResult, ImageAsset, OutputFormat,
        MAX_SLOTS,
    },
};
use std::sync::Arc;

/// Validates a prompt and its images, makes one upstream call and interprets
/// the answer.
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn ContentGenerator>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        images: &[ImageAsset],
        options: &GenerationOptions,
    ) -> Result<GenerationResult> {
        let parts = build_payload(prompt, images, options)?;

        let timer = logger::timer("generate_content");
        let response = self
            .generator
            .generate_content(options.model.api_name(), parts)
            .await;
        drop(timer);

        interpret_response(response?)
    }
}

/// The trimmed prompt plus any model-specific hints, which the API only
/// accepts as free text.
pub fn final_prompt(prompt: &str, options: &GenerationOptions) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenImageError::ValidationError(
            "Please enter a prompt describing what you want to create".into(),
        ));
    }

    if options.model.supports_aspect_ratio() {
        let ratio = options.aspect_ratio.unwrap_or_default();
        Ok(format!("{}\n\nSpecifications:\n- Aspect Ratio: {}", prompt, ratio))
    } else {
        Ok(prompt.to_string())
    }
}

/// Prompt first, then every image in the order given, PNG-encoded.
pub fn build_payload(
    prompt: &str,
    images: &[ImageAsset],
    options: &GenerationOptions,
) -> Result<Vec<ContentPart>> {
    let text = final_prompt(prompt, options)?;

    match images.first() {
        None => {
            return Err(GenImageError::ValidationError(
                "Please upload at least the first image".into(),
            ))
        }
        Some(first) if !first.slot.is_required() => {
            return Err(GenImageError::ValidationError(format!(
                "the first image must come from slot 1, got {}",
                first.slot
            )))
        }
        Some(_) => {}
    }
    if images.len() > MAX_SLOTS as usize {
        return Err(GenImageError::ValidationError(format!(
            "at most {} images are allowed, got {}",
            MAX_SLOTS,
            images.len()
        )));
    }
    if let Some(pair) = images.windows(2).find(|pair| pair[0].slot >= pair[1].slot) {
        return Err(GenImageError::ValidationError(format!(
            "images must be in slot order without repeats, got {} after {}",
            pair[1].slot, pair[0].slot
        )));
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(ContentPart::Text(text));
    for asset in images {
        let data = OutputFormat::Png.encode(&asset.image)?;
        parts.push(ContentPart::image(OutputFormat::Png.content_type(), data));
    }
    Ok(parts)
}

/// Walks the parts once: the last text part is the commentary, every image
/// part is decoded. No image at all is `NoImageProduced`.
pub fn interpret_response(parts: Vec<ContentPart>) -> Result<GenerationResult> {
    let mut text = None;
    let mut images = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text(t) => text = Some(t),
            ContentPart::Image { mime_type, data } => {
                let image = decode_rgb(&data).map_err(|e| {
                    log::error!("Could not decode returned {} image: {}", mime_type, e);
                    e
                })?;
                images.push(image);
            }
        }
    }

    if images.is_empty() {
        if let Some(text) = &text {
            log::warn!("Model answered with text only: {}", text);
        }
        return Err(GenImageError::NoImageProduced);
    }

    log::info!("Model returned {} image(s)", images.len());
    Ok(GenerationResult { text, images })
}
