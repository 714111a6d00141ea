//! Gemini API settings.

use serde::{Deserialize, Serialize};

/// Connection and model settings for the Gemini API.
///
/// The API key itself never lives in the config file; `api_key_env`
/// names the environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key_env: String,
    pub model: String,
    pub image_model: String,
    pub max_output_tokens: u32,
    /// Sampling temperature (valid range: 0.0-2.0).
    pub temperature: f64,
    pub connect_timeout_secs: u32,
    pub request_timeout_secs: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key_env: "API_KEY".to_string(),
            model: "gemini-2.5-flash-preview-04-17".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            max_output_tokens: 8192,
            temperature: 1.0,
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
        }
    }
}
