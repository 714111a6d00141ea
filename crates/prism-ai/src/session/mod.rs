//! Streaming chat session: the conversation log and the state machine
//! that reconciles streamed replies into it.

mod chat;
mod exchange;
mod manager;
mod types;

#[cfg(test)]
mod tests;

pub use exchange::Exchange;
pub use manager::ChatSession;
pub use types::{
    ApplyOutcome, ChatEvent, ConfigureOutcome, ConversationLog, Generation, Message,
    MessageStatus, Observer, Rejection, SessionError, SessionState, StreamEvent, StreamUpdate,
};
