//! Configuration schema types for Prism.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the web client shipped with.

mod chat;
mod gemini;
mod media;
mod system;

pub use chat::*;
pub use gemini::*;
pub use media::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Prism.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub gemini: GeminiSettings,
    pub chat: ChatConfig,
    pub media: MediaConfig,
    pub images: ImagesConfig,
    pub logging: LoggingConfig,
}
