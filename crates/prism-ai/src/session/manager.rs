//! ChatSession struct, lifecycle, and configuration.

use tracing::{debug, info, warn};

use crate::completion::{CompletionService, SessionConfig};

use super::types::{
    ChatEvent, ConfigureOutcome, ConversationLog, Generation, Observer, SessionError,
    SessionState,
};

/// A single streaming conversation over a [`CompletionService`].
pub struct ChatSession<S: CompletionService> {
    pub(super) service: S,
    pub(super) config: SessionConfig,
    /// Instruction change waiting for the next restart.
    pub(super) pending_config: Option<SessionConfig>,
    pub(super) handle: Option<S::Handle>,
    pub(super) log: ConversationLog,
    /// Draft text not yet submitted.
    pub(super) input: String,
    pub(super) state: SessionState,
    pub(super) generation: Generation,
    /// Log index of the streaming placeholder.
    pub(super) in_flight: Option<usize>,
    /// Text accumulated for the in-flight reply.
    pub(super) reply: String,
    pub(super) observers: Vec<Observer>,
}

impl<S: CompletionService> ChatSession<S> {
    /// Create an unopened session.
    pub fn new(service: S, config: SessionConfig) -> Self {
        Self {
            service,
            config,
            pending_config: None,
            handle: None,
            log: ConversationLog::default(),
            input: String::new(),
            state: SessionState::Uninitialized,
            generation: Generation::default(),
            in_flight: None,
            reply: String::new(),
            observers: Vec::new(),
        }
    }

    /// Create a session and open its first handle.
    ///
    /// An open failure is recorded as the `Error` state rather than
    /// returned, so the caller can still display it and restart later.
    pub fn start(service: S, config: SessionConfig) -> Self {
        let mut session = Self::new(service, config);
        let _ = session.open();
        session
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pending_config(&self) -> Option<&SessionConfig> {
        self.pending_config.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::Sending
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Drop the current handle and open a fresh one for the current config.
    ///
    /// Only reached from `start`, `restart` and an applied configure, each
    /// of which leaves the log without an in-flight reply.
    pub(super) fn open(&mut self) -> Result<(), SessionError> {
        self.handle = None;
        match self.service.open(&self.config) {
            Ok(handle) => {
                self.handle = Some(handle);
                info!(
                    has_instruction = self.config.system_instruction().is_some(),
                    "Chat session opened"
                );
                self.set_state(SessionState::Ready);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to open chat session");
                self.set_state(SessionState::Error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Abandon everything and start over with an empty log.
    ///
    /// Valid from any state. Any in-flight exchange becomes stale, and a
    /// deferred instruction change takes effect here.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.generation = self.generation.next();
        self.handle = None;
        self.in_flight = None;
        self.reply.clear();
        self.log.clear();
        self.input.clear();
        if let Some(config) = self.pending_config.take() {
            self.config = config;
        }
        debug!(generation = self.generation.value(), "Restarting chat session");

        self.emit(&ChatEvent::LogCleared);
        self.set_state(SessionState::Uninitialized);
        self.open()
    }

    /// Change the system instruction.
    ///
    /// Takes effect immediately while the log is empty; otherwise it is
    /// held until the next [`restart`](Self::restart).
    pub fn configure_system_instruction(
        &mut self,
        instruction: &str,
    ) -> Result<ConfigureOutcome, SessionError> {
        let next = SessionConfig::new(Some(instruction));
        let effective = self.pending_config.as_ref().unwrap_or(&self.config);
        if *effective == next {
            return Ok(ConfigureOutcome::Unchanged);
        }

        if !self.log.is_empty() {
            debug!("Deferring system instruction change until restart");
            self.pending_config = (next != self.config).then_some(next);
            return Ok(ConfigureOutcome::Deferred);
        }

        self.config = next;
        self.pending_config = None;
        self.handle = None;
        self.set_state(SessionState::Uninitialized);
        self.open()?;
        Ok(ConfigureOutcome::Applied)
    }

    pub(super) fn emit(&self, event: &ChatEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }

    pub(super) fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "Chat state changed");
        self.state = state;
        self.emit(&ChatEvent::StateChanged(self.state.clone()));
    }
}

impl<S: CompletionService> std::fmt::Debug for ChatSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("pending_config", &self.pending_config)
            .field("messages", &self.log.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
