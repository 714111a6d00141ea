//! AiClient trait implementation and Imagen image generation for GeminiClient.

use async_trait::async_trait;

use crate::{AiClient, AiError, AiResponse, GenerateRequest};

use super::client::{GeminiClient, MAX_IMAGES_PER_REQUEST};

/// One decoded image returned by the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// File extension matching the image's MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpeg",
        }
    }
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<AiResponse, AiError> {
        self.ensure_api_key()?;

        let body = self.build_request_body(request);
        let url = self.api_url(&self.config.model, "generateContent");

        tracing::debug!(
            model = %self.config.model,
            turns = request.contents.len(),
            google_search = request.google_search,
            "Sending Gemini request"
        );

        let response =
            Self::post_json(&self.http, &url, &self.config.api_key, &body).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        let parsed = self.parse_response(json)?;
        tracing::debug!(
            tokens = parsed.usage.total_tokens(),
            sources = parsed.sources.len(),
            "Gemini response received"
        );
        Ok(parsed)
    }
}

impl GeminiClient {
    /// Generate up to four images for `prompt`.
    ///
    /// `count` is clamped into `1..=4`. An empty result is reported as an
    /// error so callers never show an empty gallery as success.
    pub async fn generate_images(
        &self,
        prompt: &str,
        count: u32,
    ) -> Result<Vec<GeneratedImage>, AiError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AiError::InvalidInput(
                "Please enter a prompt to generate images.".to_string(),
            ));
        }
        self.ensure_api_key()?;

        let count = count.clamp(1, MAX_IMAGES_PER_REQUEST);
        let body = self.build_image_body(prompt, count);
        let url = self.api_url(&self.config.image_model, "predict");

        tracing::info!(model = %self.config.image_model, count, "Generating images");

        let response =
            Self::post_json(&self.http, &url, &self.config.api_key, &body).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        let images = self.parse_image_response(&json)?;
        if images.is_empty() {
            return Err(AiError::ApiError(
                "No images were generated. Try a different prompt or settings.".to_string(),
            ));
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeminiConfig;

    #[test]
    fn extension_follows_mime_type() {
        let image = |mime: &str| GeneratedImage {
            mime_type: mime.to_string(),
            bytes: Vec::new(),
        };
        assert_eq!(image("image/png").extension(), "png");
        assert_eq!(image("image/jpeg").extension(), "jpeg");
        assert_eq!(image("application/octet-stream").extension(), "jpeg");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_any_request() {
        let client = GeminiClient::new(GeminiConfig::new("")).unwrap();
        let err = client.generate_images("   ", 2).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_generation() {
        let client = GeminiClient::new(GeminiConfig::new("")).unwrap();
        let err = client.generate_images("a lighthouse", 1).await.unwrap_err();
        assert!(matches!(err, AiError::MissingCredential(_)));

        let request = GenerateRequest::new(Vec::new());
        let err = client.generate(&request).await.unwrap_err();
        assert!(matches!(err, AiError::MissingCredential(_)));
    }
}
