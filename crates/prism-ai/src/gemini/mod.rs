//! Google Gemini API client.
//!
//! Implements [`AiClient`](crate::AiClient) for one-shot generation,
//! [`CompletionService`](crate::CompletionService) for streaming chat,
//! and Imagen image generation via the Generative Language API.

mod api;
mod chat;
mod client;
mod config;

pub use api::GeneratedImage;
pub use chat::GeminiChat;
pub use client::GeminiClient;
pub use config::GeminiConfig;
