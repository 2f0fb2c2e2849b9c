//! Wire types for the Gemini `generateContent` REST endpoint.

use crate::{
    error::{GenImageError, Result},
    models::ContentPart,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// A single user turn holding `parts` in order.
    pub(crate) fn user_turn(parts: &[ContentPart]) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: parts.iter().map(Part::from).collect(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,
    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    pub(crate) inline_data: Option<Blob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Blob {
    #[serde(alias = "mime_type")]
    pub(crate) mime_type: String,
    pub(crate) data: String,
}

impl From<&ContentPart> for Part {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part {
                text: Some(text.clone()),
                inline_data: None,
            },
            ContentPart::Image { mime_type, data } => Part {
                text: None,
                inline_data: Some(Blob {
                    mime_type: mime_type.clone(),
                    data: BASE64.encode(data),
                }),
            },
        }
    }
}

impl Part {
    /// Parts that carry neither text nor inline data (function calls, empty
    /// text) map to `None`.
    pub(crate) fn into_content_part(self) -> Result<Option<ContentPart>> {
        if let Some(blob) = self.inline_data {
            if blob.data.is_empty() {
                return Ok(None);
            }
            let data = BASE64.decode(blob.data.as_bytes()).map_err(|e| {
                GenImageError::UpstreamError(format!("image part is not valid base64: {}", e))
            })?;
            return Ok(Some(ContentPart::Image {
                mime_type: blob.mime_type,
                data,
            }));
        }

        Ok(self
            .text
            .filter(|text| !text.is_empty())
            .map(ContentPart::Text))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<Content>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Flattens every candidate's parts, keeping response order.
    pub(crate) fn into_parts(self) -> Result<Vec<ContentPart>> {
        if self.candidates.is_empty() {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                log::warn!("Gemini blocked the prompt: {}", reason);
            }
        }

        let mut parts = Vec::new();
        for candidate in self.candidates {
            if let Some(reason) = &candidate.finish_reason {
                log::debug!("Candidate finish reason: {}", reason);
            }
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                if let Some(part) = part.into_content_part()? {
                    parts.push(part);
                }
            }
        }
        Ok(parts)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Turns a non-2xx response into the message shown to the user.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(code) => format!("{} ({} {})", envelope.error.message, status, code),
            None => format!("{} ({})", envelope.error.message, status),
        },
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}
