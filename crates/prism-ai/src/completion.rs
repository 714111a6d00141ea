//! The completion-service seam the chat session talks through.
//!
//! A service opens a handle for a given [`SessionConfig`] and, per user
//! turn, returns a lazy stream of text fragments. Nothing is sent until
//! the stream is first polled; dropping the stream abandons the call.

use std::sync::Arc;

use futures_util::stream::BoxStream;

use crate::AiError;

/// One incremental piece of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Finite fragment sequence; may fail part-way through.
pub type FragmentStream = BoxStream<'static, Result<Fragment, AiError>>;

/// Settings fixed for the lifetime of one session handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    system_instruction: Option<String>,
}

impl SessionConfig {
    /// Build a config; a blank instruction means "no instruction".
    pub fn new(system_instruction: Option<&str>) -> Self {
        let system_instruction = system_instruction
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { system_instruction }
    }

    pub fn with_system_instruction(instruction: &str) -> Self {
        Self::new(Some(instruction))
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }
}

pub trait CompletionService {
    /// Opaque exchange context. Never reused once dropped.
    type Handle: Send;

    fn open(&self, config: &SessionConfig) -> Result<Self::Handle, AiError>;

    fn stream_send(&self, handle: &mut Self::Handle, text: &str) -> FragmentStream;
}

impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    type Handle = T::Handle;

    fn open(&self, config: &SessionConfig) -> Result<Self::Handle, AiError> {
        (**self).open(config)
    }

    fn stream_send(&self, handle: &mut Self::Handle, text: &str) -> FragmentStream {
        (**self).stream_send(handle, text)
    }
}
