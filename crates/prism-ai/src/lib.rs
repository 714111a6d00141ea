//! AI engine for Prism.
//!
//! Provides the Gemini API client and everything built on it:
//! - Streaming (SSE) support
//! - A streaming chat session with restart/reconfigure semantics
//! - Media validation and inline encoding
//! - Image description, video description, image generation
//! - Search-grounded answers with citation de-duplication

pub mod completion;
pub mod features;
pub mod gemini;
pub mod grounding;
pub mod media;
pub mod session;
pub mod streaming;

use async_trait::async_trait;

pub use completion::{CompletionService, Fragment, FragmentStream, SessionConfig};
pub use gemini::{GeminiChat, GeminiClient, GeminiConfig, GeneratedImage};
pub use grounding::GroundingSource;
pub use media::{EncodedMedia, MediaKind, MediaPolicy};
pub use session::ChatSession;

/// One-shot content generation, the seam the non-chat features call through.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<AiResponse, AiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name on the Gemini wire.
    pub fn as_gemini(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// A piece of a request turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Base64-encoded media carried inline with the request.
    InlineData { mime_type: String, data: String },
}

/// A single turn: a role plus its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    /// Let the model ground its answer with Google Search.
    pub google_search: bool,
}

impl GenerateRequest {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_google_search(mut self) -> Self {
        self.google_search = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AiResponse {
    pub content: String,
    pub sources: Vec<GroundingSource>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("{0}")]
    MissingCredential(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidMedia(String),
}

impl AiError {
    /// Failures of the call itself, as opposed to configuration or input problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AiError::ApiError(_)
                | AiError::RateLimited
                | AiError::NetworkError(_)
                | AiError::ParseError(_)
                | AiError::Timeout
        )
    }
}

impl From<reqwest::Error> for AiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AiError::Timeout
        } else {
            AiError::NetworkError(error.to_string())
        }
    }
}

impl From<AiError> for prism_common::PrismError {
    fn from(error: AiError) -> Self {
        match error {
            AiError::InvalidMedia(message) => prism_common::PrismError::Media(message),
            other => prism_common::PrismError::Ai(other.to_string()),
        }
    }
}
