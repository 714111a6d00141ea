//! Gemini API client struct, request building, and response parsing.

use base64::Engine as _;

use crate::grounding::extract_sources;
use crate::{AiError, AiResponse, GenerateRequest, Part, TokenUsage};

use super::api::GeneratedImage;
use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Imagen rejects more than four samples per request.
pub const MAX_IMAGES_PER_REQUEST: u32 = 4;

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Fail fast when no key is configured.
    pub(crate) fn ensure_api_key(&self) -> Result<(), AiError> {
        if self.config.has_api_key() {
            return Ok(());
        }
        let message = format!(
            "API Key for Gemini is not configured. Please set the {} environment variable.",
            self.config.api_key_env
        );
        tracing::error!("{message}");
        Err(AiError::MissingCredential(message))
    }

    pub(crate) fn api_url(&self, model: &str, method: &str) -> String {
        format!("{GEMINI_API_BASE}/{model}:{method}")
    }

    /// POST a JSON body and map HTTP failures onto `AiError`.
    pub(crate) async fn post_json(
        http: &reqwest::Client,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, AiError> {
        let response = http
            .post(url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }
        Ok(response)
    }

    /// Build the JSON request body for `generateContent` / `streamGenerateContent`.
    pub(crate) fn build_request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        let contents: Vec<_> = request
            .contents
            .iter()
            .map(|content| {
                let parts: Vec<_> = content.parts.iter().map(part_to_json).collect();
                serde_json::json!({
                    "role": content.role.as_gemini(),
                    "parts": parts,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": instruction }]
            });
        }

        if request.google_search {
            body["tools"] = serde_json::json!([{ "googleSearch": {} }]);
        }

        body
    }

    /// Parse a `generateContent` response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<AiResponse, AiError> {
        let first = json["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| AiError::ParseError("no candidates in response".to_string()))?;

        let content = candidate_text(first);
        let sources = extract_sources(first);

        let usage = TokenUsage {
            input_tokens: json["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0),
            output_tokens: json["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0),
        };

        Ok(AiResponse {
            content,
            sources,
            usage,
        })
    }

    /// Build the JSON body for an Imagen `predict` call.
    pub(crate) fn build_image_body(&self, prompt: &str, count: u32) -> serde_json::Value {
        serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": count.clamp(1, MAX_IMAGES_PER_REQUEST),
                "outputOptions": { "mimeType": "image/jpeg" },
            }
        })
    }

    /// Decode the images of an Imagen `predict` response.
    pub(crate) fn parse_image_response(
        &self,
        json: &serde_json::Value,
    ) -> Result<Vec<GeneratedImage>, AiError> {
        let Some(predictions) = json["predictions"].as_array() else {
            return Ok(Vec::new());
        };

        predictions
            .iter()
            .filter_map(|prediction| {
                let data = prediction["bytesBase64Encoded"].as_str()?;
                let mime_type = prediction["mimeType"].as_str().unwrap_or("image/jpeg");
                Some((data, mime_type))
            })
            .map(|(data, mime_type)| {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(data)
                    .map_err(|e| AiError::ParseError(format!("invalid image data: {e}")))?;
                Ok(GeneratedImage {
                    mime_type: mime_type.to_string(),
                    bytes,
                })
            })
            .collect()
    }
}

fn part_to_json(part: &Part) -> serde_json::Value {
    match part {
        Part::Text(text) => serde_json::json!({ "text": text }),
        Part::InlineData { mime_type, data } => serde_json::json!({
            "inlineData": { "mimeType": mime_type, "data": data }
        }),
    }
}

/// Concatenate the text parts of one candidate.
pub(crate) fn candidate_text(candidate: &serde_json::Value) -> String {
    candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Extract the text delta carried by one streamed chunk.
///
/// Chunks may carry an `error` object instead of candidates when the
/// server gives up mid-stream.
pub(crate) fn parse_stream_chunk(data: &str) -> Result<String, AiError> {
    if data.trim().is_empty() {
        return Ok(String::new());
    }
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AiError::ParseError(e.to_string()))?;

    if let Some(error) = json.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown stream error");
        return Err(AiError::ApiError(message.to_string()));
    }

    Ok(json["candidates"]
        .as_array()
        .map(|candidates| candidates.iter().map(candidate_text).collect())
        .unwrap_or_default())
}
