//! Chat session settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Initial system instruction. Empty means none.
    pub system_instruction: String,
}

impl ChatConfig {
    /// The configured instruction, or `None` when blank.
    pub fn system_instruction(&self) -> Option<&str> {
        let trimmed = self.system_instruction.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
