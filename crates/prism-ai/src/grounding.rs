//! Citations attached to search-grounded answers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A web page the model cited for a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Extract web sources from one response candidate.
///
/// Reads `groundingMetadata.groundingChunks[].web`, drops chunks with no
/// URI, falls back to the URI when the title is missing, and removes
/// duplicate URIs keeping the first occurrence.
pub fn extract_sources(candidate: &serde_json::Value) -> Vec<GroundingSource> {
    let Some(chunks) = candidate["groundingMetadata"]["groundingChunks"].as_array() else {
        return Vec::new();
    };

    let sources = chunks.iter().filter_map(|chunk| {
        let web = chunk.get("web")?;
        let uri = web["uri"].as_str().filter(|uri| !uri.is_empty())?;
        let title = web["title"]
            .as_str()
            .filter(|title| !title.is_empty())
            .unwrap_or(uri);
        Some(GroundingSource {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    });

    dedupe_sources(sources)
}

/// Drop sources whose URI was already seen, preserving order.
pub fn dedupe_sources(sources: impl IntoIterator<Item = GroundingSource>) -> Vec<GroundingSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}
