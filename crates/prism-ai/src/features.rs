//! One-shot features built on [`AiClient`]: media description and
//! search-grounded answers.

use crate::grounding::{dedupe_sources, GroundingSource};
use crate::media::{EncodedMedia, MediaKind};
use crate::{AiClient, AiError, Content, GenerateRequest, Part};

pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image in detail.";
pub const DEFAULT_VIDEO_PROMPT: &str =
    "Describe this video. If there is speech, provide a transcript.";

/// Default description prompt for a media kind.
pub fn default_prompt(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => DEFAULT_IMAGE_PROMPT,
        MediaKind::Video => DEFAULT_VIDEO_PROMPT,
    }
}

/// Ask the model to describe an image or video.
///
/// The media part goes first, then the prompt.
pub async fn describe_media(
    client: &dyn AiClient,
    media: &EncodedMedia,
    prompt: &str,
) -> Result<String, AiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AiError::InvalidInput(format!(
            "Please provide a prompt for the {}.",
            media.kind
        )));
    }

    tracing::info!(
        kind = %media.kind,
        mime_type = %media.mime_type,
        size = media.size,
        "Describing media"
    );

    let request = GenerateRequest::new(vec![Content::user(vec![
        media.to_part(),
        Part::Text(prompt.to_string()),
    ])]);
    let response = client.generate(&request).await?;
    Ok(response.content)
}

/// A grounded answer plus the distinct web sources it cites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchAnswer {
    pub answer: String,
    pub sources: Vec<GroundingSource>,
}

pub async fn search_with_grounding(
    client: &dyn AiClient,
    query: &str,
) -> Result<SearchAnswer, AiError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AiError::InvalidInput("Please enter a search query.".to_string()));
    }

    let request =
        GenerateRequest::new(vec![Content::text(crate::Role::User, query)]).with_google_search();
    let response = client.generate(&request).await?;
    let sources = dedupe_sources(response.sources);

    tracing::debug!(sources = sources.len(), "Grounded answer received");
    Ok(SearchAnswer {
        answer: response.content,
        sources,
    })
}

/// Clamp a requested image count into `1..=max`.
pub fn clamp_image_count(requested: u32, max: u32) -> u32 {
    requested.clamp(1, max.max(1))
}

/// File name for the `index`-th (1-based) generated image of `prompt`.
///
/// Uses the first 20 characters of the prompt with each whitespace run
/// replaced by a single underscore, leading and trailing runs included.
pub fn generated_image_file_name(prompt: &str, index: usize, extension: &str) -> String {
    let mut slug = String::new();
    let mut in_whitespace = false;
    for c in prompt.chars().take(20) {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
        } else {
            slug.push(c);
            in_whitespace = false;
        }
    }
    format!("generated_image_{slug}_{index}.{extension}")
}
