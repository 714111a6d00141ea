//! Submitting messages and reconciling streamed replies.

use tracing::{debug, warn};

use crate::completion::CompletionService;

use super::exchange::Exchange;
use super::manager::ChatSession;
use super::types::{
    ApplyOutcome, ChatEvent, Message, MessageStatus, Rejection, SessionError, SessionState,
    StreamEvent, StreamUpdate,
};

impl<S: CompletionService> ChatSession<S> {
    /// Post a user message and start streaming the reply.
    ///
    /// The returned [`Exchange`] yields the reply's updates; feed each one
    /// back through [`apply`](Self::apply).
    pub fn submit(&mut self, text: &str) -> Result<Exchange, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Blank);
        }
        match &self.state {
            SessionState::Ready => {}
            SessionState::Sending => return Err(Rejection::Busy),
            SessionState::Uninitialized => {
                return Err(Rejection::Unavailable(
                    "chat session is not initialized".to_string(),
                ))
            }
            SessionState::Error(cause) => return Err(Rejection::Unavailable(cause.clone())),
        }
        let Some(mut handle) = self.handle.take() else {
            return Err(Rejection::Unavailable("no open chat handle".to_string()));
        };

        let user = Message::user(text);
        self.log.push(user.clone());
        self.emit(&ChatEvent::MessageAppended(user));
        self.input.clear();
        self.set_state(SessionState::Sending);

        let placeholder = Message::placeholder();
        self.in_flight = Some(self.log.push(placeholder.clone()));
        self.reply.clear();
        self.emit(&ChatEvent::MessageAppended(placeholder));

        self.generation = self.generation.next();
        debug!(generation = self.generation.value(), "Sending chat message");
        let fragments = self.service.stream_send(&mut handle, text);
        self.handle = Some(handle);

        Ok(Exchange::new(self.generation, fragments))
    }

    /// Reconcile one stream update into the log.
    pub fn apply(&mut self, update: StreamUpdate) -> ApplyOutcome {
        if update.generation != self.generation {
            debug!(
                update = update.generation.value(),
                current = self.generation.value(),
                "Dropping stale stream update"
            );
            return ApplyOutcome::Stale;
        }
        let Some(index) = self.in_flight else {
            return ApplyOutcome::Stale;
        };

        match update.event {
            StreamEvent::Fragment(fragment) => {
                self.reply.push_str(&fragment.text);
                self.update_message(index, |message| message.text.push_str(&fragment.text));
            }
            StreamEvent::Completed => {
                let text = std::mem::take(&mut self.reply);
                self.update_message(index, |message| {
                    message.text = text;
                    message.status = MessageStatus::Complete;
                });
                self.in_flight = None;
                self.set_state(SessionState::Ready);
            }
            StreamEvent::Failed(error) => {
                warn!(error = %error, "Chat reply failed");
                self.reply.clear();
                self.update_message(index, |message| {
                    message.status = MessageStatus::Interrupted;
                });
                self.in_flight = None;

                let notice = Message::error_notice(&error);
                self.log.push(notice.clone());
                self.emit(&ChatEvent::MessageAppended(notice));
                self.set_state(SessionState::Error(error.to_string()));
            }
        }
        ApplyOutcome::Applied
    }

    /// Submit `text` and drive the reply to its end.
    ///
    /// A failed reply is not an error here: it is recorded in the log and
    /// the session moves to the `Error` state.
    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        let mut exchange = self.submit(text)?;
        while let Some(update) = exchange.next_update().await {
            self.apply(update);
        }
        Ok(())
    }

    fn update_message(&mut self, index: usize, change: impl FnOnce(&mut Message)) {
        let Some(message) = self.log.get_mut(index) else {
            return;
        };
        change(message);
        let snapshot = message.clone();
        self.emit(&ChatEvent::MessageUpdated(snapshot));
    }
}
