//! Translate configuration into runtime objects.

use std::time::Duration;

use prism_ai::{GeminiConfig, MediaPolicy};
use prism_config::schema::{GeminiSettings, MediaConfig};

pub fn gemini_config(settings: &GeminiSettings) -> GeminiConfig {
    GeminiConfig::from_env(&settings.api_key_env)
        .with_model(settings.model.clone())
        .with_image_model(settings.image_model.clone())
        .with_max_tokens(settings.max_output_tokens)
        .with_temperature(settings.temperature)
        .with_timeouts(
            Duration::from_secs(u64::from(settings.connect_timeout_secs)),
            Duration::from_secs(u64::from(settings.request_timeout_secs)),
        )
}

pub fn media_policy(config: &MediaConfig) -> MediaPolicy {
    MediaPolicy {
        max_file_size_bytes: config.max_file_size_bytes(),
        video_warning_bytes: config.video_warning_size_bytes(),
        allowed_image_types: config.allowed_image_types.clone(),
        allowed_video_types: config.allowed_video_types.clone(),
    }
}

/// Load KEY=VALUE lines from `.env` without overriding the environment.
pub fn load_dotenv() {
    let candidates = [
        std::path::PathBuf::from(".env"),
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return;
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.strip_prefix("export ").unwrap_or(key).trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key, value)
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
