//! Full configuration validation.
//!
//! Validates numeric ranges, required names, and MIME type lists, then
//! collects every problem into a single `ConfigError`.

mod helpers;


use crate::schema::PrismConfig;
use prism_common::ConfigError;

use helpers::{validate_mime_list, validate_non_blank, validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PrismConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_gemini(&mut errors, config);
    validate_media(&mut errors, config);
    validate_images(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_gemini(errors: &mut Vec<String>, config: &PrismConfig) {
    let gemini = &config.gemini;
    validate_non_blank(errors, "gemini.api_key_env", &gemini.api_key_env);
    validate_non_blank(errors, "gemini.model", &gemini.model);
    validate_non_blank(errors, "gemini.image_model", &gemini.image_model);
    validate_range(errors, "gemini.max_output_tokens", gemini.max_output_tokens, 1, 65536);
    validate_range_f64(errors, "gemini.temperature", gemini.temperature, 0.0, 2.0);
    validate_range(errors, "gemini.connect_timeout_secs", gemini.connect_timeout_secs, 1, 120);
    validate_range(errors, "gemini.request_timeout_secs", gemini.request_timeout_secs, 1, 3600);
}

fn validate_media(errors: &mut Vec<String>, config: &PrismConfig) {
    let media = &config.media;
    validate_range(errors, "media.max_file_size_mb", media.max_file_size_mb, 1, 2048);
    validate_range(errors, "media.video_warning_size_mb", media.video_warning_size_mb, 1, 2048);
    validate_mime_list(errors, "media.allowed_image_types", &media.allowed_image_types, "image");
    validate_mime_list(errors, "media.allowed_video_types", &media.allowed_video_types, "video");
}

fn validate_images(errors: &mut Vec<String>, config: &PrismConfig) {
    let images = &config.images;
    validate_range(errors, "images.max_count", images.max_count, 1, 4);
    validate_range(errors, "images.default_count", images.default_count, 1, images.max_count.max(1));
}
