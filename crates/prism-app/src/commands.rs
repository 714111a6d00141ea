//! One-shot feature commands.

use std::path::{Path, PathBuf};

use prism_ai::features::{
    clamp_image_count, default_prompt, describe_media, generated_image_file_name,
    search_with_grounding, SearchAnswer,
};
use prism_ai::{GeminiClient, MediaKind, MediaPolicy};
use prism_common::PrismError;
use prism_config::schema::ImagesConfig;
use tracing::{info, warn};

pub async fn describe(
    client: &GeminiClient,
    policy: &MediaPolicy,
    kind: MediaKind,
    file: &Path,
    prompt: Option<&str>,
) -> Result<(), PrismError> {
    let media = policy.load(kind, file).await?;
    if let Some(warning) = &media.warning {
        warn!("{warning}");
    }

    let prompt = prompt.unwrap_or(default_prompt(kind));
    let description = describe_media(client, &media, prompt).await?;
    println!("{description}");
    Ok(())
}

pub async fn imagine(
    client: &GeminiClient,
    images: &ImagesConfig,
    prompt: &str,
    count: Option<u32>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, PrismError> {
    let count = clamp_image_count(count.unwrap_or(images.default_count), images.max_count);
    let generated = client.generate_images(prompt, count).await?;

    tokio::fs::create_dir_all(out_dir).await?;
    let mut written = Vec::with_capacity(generated.len());
    for (index, image) in generated.iter().enumerate() {
        let path = out_dir.join(generated_image_file_name(
            prompt,
            index + 1,
            image.extension(),
        ));
        tokio::fs::write(&path, &image.bytes).await?;
        info!(path = %path.display(), bytes = image.bytes.len(), "Image written");
        println!("{}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub async fn search(client: &GeminiClient, query: &str) -> Result<(), PrismError> {
    let answer = search_with_grounding(client, query).await?;
    print!("{}", render_answer(&answer));
    Ok(())
}

fn render_answer(answer: &SearchAnswer) -> String {
    let mut out = format!("{}\n", answer.answer.trim_end());
    if !answer.sources.is_empty() {
        out.push_str("\nSources:\n");
        for (index, source) in answer.sources.iter().enumerate() {
            out.push_str(&format!("  [{}] {} <{}>\n", index + 1, source.title, source.uri));
        }
    }
    out
}
