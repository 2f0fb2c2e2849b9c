pub(crate) mod api;
pub mod generation_client;

use crate::{
    config::GeminiConfig,
    error::{GenImageError, Result},
    models::ContentPart,
};
use async_trait::async_trait;
use reqwest::Client;

pub use generation_client::GenerationClient;

/// The upstream "generate content" call: ordered parts in, ordered parts out.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, model: &str, parts: Vec<ContentPart>)
        -> Result<Vec<ContentPart>>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenImageError::ConfigError("Gemini API key is required".into()))?;

        // No request timeout: a generate call runs until the service answers.
        let http = Client::builder()
            .build()
            .map_err(|e| GenImageError::ConfigError(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<ContentPart>,
    ) -> Result<Vec<ContentPart>> {
        let request = api::GenerateContentRequest::user_turn(&parts);

        log::info!("Generating image with model: {}", model);
        log::debug!(
            "Request carries {} part(s), {} image(s)",
            parts.len(),
            parts.iter().filter(|p| p.is_image()).count()
        );

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenImageError::UpstreamError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenImageError::UpstreamError(format!("Gemini response unreadable: {}", e)))?;

        if !status.is_success() {
            let message = api::error_message(status.as_u16(), &body);
            log::error!("Gemini returned an error: {}", message);
            return Err(GenImageError::UpstreamError(message));
        }

        let parsed: api::GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GenImageError::UpstreamError(format!("Unexpected Gemini response: {}", e)))?;

        parsed.into_parts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        assert!(matches!(
            GeminiClient::new(&GeminiConfig::new()),
            Err(GenImageError::ConfigError(_))
        ));
    }

    #[test]
    fn test_endpoint_uses_api_model_name() {
        let client = GeminiClient::new(
            &GeminiConfig::new()
                .with_api_key("key")
                .with_base_url("http://localhost:8080/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("gemini-3-pro-image-preview"),
            "http://localhost:8080/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
    }
}
