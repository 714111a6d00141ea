//! Streaming multi-turn chat over `streamGenerateContent`.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use prism_common::SessionId;

use crate::completion::{CompletionService, Fragment, FragmentStream, SessionConfig};
use crate::streaming::{response_events, SseEvent};
use crate::{AiError, Content, GenerateRequest, Role};

use super::client::{parse_stream_chunk, GeminiClient};

/// Server-side chat context: the instruction plus the turns so far.
///
/// A turn is recorded only once its reply has streamed to completion,
/// so an abandoned or failed exchange leaves no trace.
pub struct GeminiChat {
    id: SessionId,
    system_instruction: Option<String>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChat {
    fn new(config: &SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            system_instruction: config.system_instruction().map(str::to_string),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// Snapshot of the completed turns.
    pub fn history(&self) -> Vec<Content> {
        lock(&self.history).clone()
    }
}

impl std::fmt::Debug for GeminiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiChat")
            .field("id", &self.id)
            .field("system_instruction", &self.system_instruction)
            .field("turns", &lock(&self.history).len())
            .finish()
    }
}

fn lock(history: &Mutex<Vec<Content>>) -> MutexGuard<'_, Vec<Content>> {
    history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CompletionService for GeminiClient {
    type Handle = GeminiChat;

    fn open(&self, config: &SessionConfig) -> Result<GeminiChat, AiError> {
        self.ensure_api_key()?;
        let chat = GeminiChat::new(config);
        tracing::debug!(
            session = %chat.id,
            model = %self.config.model,
            has_instruction = chat.system_instruction.is_some(),
            "Opened Gemini chat"
        );
        Ok(chat)
    }

    fn stream_send(&self, handle: &mut GeminiChat, text: &str) -> FragmentStream {
        let user_turn = Content::text(Role::User, text);
        let mut contents = handle.history();
        contents.push(user_turn.clone());

        let mut request = GenerateRequest::new(contents);
        if let Some(instruction) = &handle.system_instruction {
            request = request.with_system_instruction(instruction.clone());
        }

        let key_check = self.ensure_api_key();
        let body = self.build_request_body(&request);
        let url = format!(
            "{}?alt=sse",
            self.api_url(&self.config.model, "streamGenerateContent")
        );
        let http = self.http.clone();
        let api_key = self.config.api_key.clone();
        let history = Arc::clone(&handle.history);
        let session = handle.id.clone();

        let connect = async move {
            key_check?;
            tracing::debug!(session = %session, "Streaming Gemini reply");
            let response = GeminiClient::post_json(&http, &url, &api_key, &body).await?;
            Ok::<FragmentStream, AiError>(reply_fragments(
                response_events(response),
                history,
                user_turn,
            ))
        };

        stream::once(connect)
            .map(|connected: Result<FragmentStream, AiError>| {
                connected.unwrap_or_else(|e| stream::once(future::ready(Err(e))).boxed())
            })
            .flatten()
            .boxed()
    }
}

struct ReplyState {
    events: BoxStream<'static, Result<SseEvent, AiError>>,
    history: Arc<Mutex<Vec<Content>>>,
    user_turn: Content,
    reply: String,
    done: bool,
}

/// Turn SSE chunks into fragments, committing the turn to `history` on a
/// clean end of stream.
fn reply_fragments(
    events: BoxStream<'static, Result<SseEvent, AiError>>,
    history: Arc<Mutex<Vec<Content>>>,
    user_turn: Content,
) -> FragmentStream {
    let state = ReplyState {
        events,
        history,
        user_turn,
        reply: String::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            let event = match state.events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    let reply = Content::text(Role::Assistant, std::mem::take(&mut state.reply));
                    let mut history = lock(&state.history);
                    history.push(state.user_turn.clone());
                    history.push(reply);
                    return None;
                }
            };

            match parse_stream_chunk(&event.data) {
                Ok(text) if text.is_empty() => continue,
                Ok(text) => {
                    state.reply.push_str(&text);
                    return Some((Ok(Fragment::new(text)), state));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Gemini stream failed mid-reply");
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}
