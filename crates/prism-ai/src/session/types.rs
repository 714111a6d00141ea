//! Session data model, events, and outcomes.

use std::fmt;

use chrono::{DateTime, Utc};
use prism_common::MessageId;

use crate::completion::Fragment;
use crate::{AiError, Role};

/// Finalization marker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// In-flight assistant placeholder; text still growing.
    Streaming,
    Complete,
    /// The stream failed; the partial text is kept as received.
    Interrupted,
    /// Synthetic assistant message describing a failure.
    ErrorNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: MessageStatus,
}

impl Message {
    fn new(role: Role, text: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text: text.into(),
            created_at: Utc::now(),
            status,
        }
    }

    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, MessageStatus::Complete)
    }

    pub(crate) fn placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), MessageStatus::Streaming)
    }

    pub(crate) fn error_notice(error: &AiError) -> Self {
        Self::new(Role::Assistant, format!("Error: {error}"), MessageStatus::ErrorNotice)
    }

    pub fn is_streaming(&self) -> bool {
        self.status == MessageStatus::Streaming
    }
}

/// Chronological message log.
///
/// Append-only, except that the in-flight assistant message may grow.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Number of assistant messages still streaming. Never more than one.
    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming()).count()
    }

    /// Append and return the new message's index.
    pub(crate) fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Message> {
        self.messages.get_mut(index)
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Sending,
    /// Holds the cause; only `restart()` leaves this state.
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Sending => "sending",
            SessionState::Error(_) => "error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Error(cause) => write!(f, "error: {cause}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessageAppended(Message),
    MessageUpdated(Message),
    StateChanged(SessionState),
    LogCleared,
}

pub type Observer = Box<dyn Fn(&ChatEvent) + Send + Sync>;

/// Why a submit was refused. Nothing changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("message is empty")]
    Blank,
    #[error("a reply is still streaming")]
    Busy,
    #[error("chat is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Open(#[from] AiError),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Monotonic exchange counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug)]
pub enum StreamEvent {
    Fragment(Fragment),
    Completed,
    Failed(AiError),
}

/// A stream event tagged with the generation of the exchange it came from.
#[derive(Debug)]
pub struct StreamUpdate {
    pub generation: Generation,
    pub event: StreamEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The update belongs to a superseded exchange and was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureOutcome {
    Unchanged,
    /// The log was empty; a new handle was opened with the new config.
    Applied,
    /// Stored until the next restart.
    Deferred,
}
