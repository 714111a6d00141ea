use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::stream::{self, StreamExt};

use super::*;
use crate::completion::{CompletionService, Fragment, FragmentStream, SessionConfig};
use crate::{AiError, Role};

#[derive(Clone, Copy)]
enum Step {
    Text(&'static str),
    Fail(&'static str),
}

#[derive(Default)]
struct Script {
    missing_credential: bool,
    replies: VecDeque<Vec<Step>>,
    opened: Vec<SessionConfig>,
    sent: Vec<(u32, String)>,
    next_handle: u32,
}

/// In-memory service replaying scripted replies.
#[derive(Clone, Default)]
struct ScriptedService {
    script: Arc<Mutex<Script>>,
}

impl ScriptedService {
    fn with_replies(replies: Vec<Vec<Step>>) -> Self {
        let service = Self::default();
        service.script.lock().unwrap().replies = replies.into();
        service
    }

    fn without_credential() -> Self {
        let service = Self::default();
        service.script.lock().unwrap().missing_credential = true;
        service
    }

    fn opened(&self) -> Vec<SessionConfig> {
        self.script.lock().unwrap().opened.clone()
    }

    fn sent(&self) -> Vec<(u32, String)> {
        self.script.lock().unwrap().sent.clone()
    }
}

impl CompletionService for ScriptedService {
    type Handle = u32;

    fn open(&self, config: &SessionConfig) -> Result<u32, AiError> {
        let mut script = self.script.lock().unwrap();
        script.opened.push(config.clone());
        if script.missing_credential {
            return Err(AiError::MissingCredential("API key is not configured".into()));
        }
        script.next_handle += 1;
        Ok(script.next_handle)
    }

    fn stream_send(&self, handle: &mut u32, text: &str) -> FragmentStream {
        let mut script = self.script.lock().unwrap();
        script.sent.push((*handle, text.to_string()));
        let steps = script.replies.pop_front().unwrap_or_default();
        stream::iter(steps.into_iter().map(|step| match step {
            Step::Text(text) => Ok(Fragment::new(text)),
            Step::Fail(cause) => Err(AiError::NetworkError(cause.to_string())),
        }))
        .boxed()
    }
}

fn started(replies: Vec<Vec<Step>>) -> (ScriptedService, ChatSession<ScriptedService>) {
    let service = ScriptedService::with_replies(replies);
    let session = ChatSession::start(service.clone(), SessionConfig::default());
    (service, session)
}

fn texts(session: &ChatSession<ScriptedService>) -> Vec<(Role, String, MessageStatus)> {
    session
        .log()
        .iter()
        .map(|m| (m.role, m.text.clone(), m.status))
        .collect()
}

fn record_events(session: &mut ChatSession<ScriptedService>) -> Arc<Mutex<Vec<ChatEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
    events
}

#[test]
fn start_opens_handle_and_is_ready() {
    let (service, session) = started(vec![]);
    assert_eq!(session.state(), &SessionState::Ready);
    assert!(session.has_handle());
    assert!(session.log().is_empty());
    assert_eq!(service.opened(), vec![SessionConfig::default()]);
}

#[tokio::test]
async fn hello_scenario_streams_into_placeholder() {
    let (service, mut session) = started(vec![vec![Step::Text("Hel"), Step::Text("lo")]]);

    let mut exchange = session.submit("Hi").unwrap();
    assert_eq!(session.state(), &SessionState::Sending);
    assert_eq!(
        texts(&session),
        vec![
            (Role::User, "Hi".to_string(), MessageStatus::Complete),
            (Role::Assistant, String::new(), MessageStatus::Streaming),
        ]
    );

    let first = exchange.next_update().await.unwrap();
    assert_eq!(session.apply(first), ApplyOutcome::Applied);
    assert_eq!(session.log().last().unwrap().text, "Hel");

    while let Some(update) = exchange.next_update().await {
        assert_eq!(session.apply(update), ApplyOutcome::Applied);
    }

    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(
        texts(&session),
        vec![
            (Role::User, "Hi".to_string(), MessageStatus::Complete),
            (Role::Assistant, "Hello".to_string(), MessageStatus::Complete),
        ]
    );
    assert_eq!(service.sent(), vec![(1, "Hi".to_string())]);
    assert!(exchange.is_finished());
}

#[tokio::test]
async fn blank_submissions_change_nothing() {
    let (service, mut session) = started(vec![]);
    let events = record_events(&mut session);
    session.set_input("   ");

    assert_eq!(session.submit("").unwrap_err(), Rejection::Blank);
    assert_eq!(session.submit("   ").unwrap_err(), Rejection::Blank);
    assert_eq!(session.submit("\n\t").unwrap_err(), Rejection::Blank);

    assert!(session.log().is_empty());
    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(session.input(), "   ");
    assert!(service.sent().is_empty());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failure_keeps_partial_text_and_appends_notice() {
    let (_service, mut session) =
        started(vec![vec![Step::Text("Hel"), Step::Fail("connection reset")]]);

    session.send("Hi").await.unwrap();

    assert_eq!(
        texts(&session),
        vec![
            (Role::User, "Hi".to_string(), MessageStatus::Complete),
            (Role::Assistant, "Hel".to_string(), MessageStatus::Interrupted),
            (
                Role::Assistant,
                "Error: Network error: connection reset".to_string(),
                MessageStatus::ErrorNotice
            ),
        ]
    );
    assert_eq!(
        session.state(),
        &SessionState::Error("Network error: connection reset".to_string())
    );
    assert_eq!(session.log().streaming_count(), 0);
}

#[tokio::test]
async fn error_state_rejects_until_restart() {
    let (_service, mut session) = started(vec![
        vec![Step::Fail("timeout")],
        vec![Step::Text("Back again")],
    ]);
    session.send("Hi").await.unwrap();

    let rejection = session.submit("Still there?").unwrap_err();
    assert!(matches!(rejection, Rejection::Unavailable(_)));
    assert_eq!(session.log().len(), 3);

    session.restart().unwrap();
    session.send("Still there?").await.unwrap();
    assert_eq!(session.log().last().unwrap().text, "Back again");
    assert_eq!(session.state(), &SessionState::Ready);
}

#[tokio::test]
async fn submit_while_sending_is_busy() {
    let (service, mut session) = started(vec![vec![Step::Text("one")]]);
    let _exchange = session.submit("first").unwrap();

    assert_eq!(session.submit("second").unwrap_err(), Rejection::Busy);
    assert_eq!(session.log().len(), 2);
    assert_eq!(session.log().streaming_count(), 1);
    assert_eq!(service.sent().len(), 1);
}

#[tokio::test]
async fn at_most_one_streaming_message_across_turns() {
    let (_service, mut session) = started(vec![
        vec![Step::Text("a")],
        vec![Step::Text("b")],
        vec![Step::Text("c")],
    ]);

    for text in ["one", "two", "three"] {
        let mut exchange = session.submit(text).unwrap();
        while let Some(update) = exchange.next_update().await {
            session.apply(update);
            assert!(session.log().streaming_count() <= 1);
        }
    }
    assert_eq!(session.log().len(), 6);
    assert_eq!(session.log().streaming_count(), 0);
}

#[tokio::test]
async fn restart_clears_log_and_input() {
    let (service, mut session) = started(vec![vec![Step::Text("Hello")]]);
    session.send("Hi").await.unwrap();
    session.set_input("draft");

    session.restart().unwrap();

    assert!(session.log().is_empty());
    assert_eq!(session.input(), "");
    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(service.opened().len(), 2);
}

#[tokio::test]
async fn restart_mid_stream_makes_old_exchange_stale() {
    let (service, mut session) = started(vec![
        vec![Step::Text("old "), Step::Text("reply")],
        vec![Step::Text("new reply")],
    ]);

    let mut old = session.submit("first").unwrap();
    let update = old.next_update().await.unwrap();
    session.apply(update);

    session.restart().unwrap();
    assert_eq!(session.state(), &SessionState::Ready);

    while let Some(update) = old.next_update().await {
        assert_eq!(session.apply(update), ApplyOutcome::Stale);
    }
    assert!(session.log().is_empty());

    session.send("second").await.unwrap();
    assert_eq!(
        texts(&session),
        vec![
            (Role::User, "second".to_string(), MessageStatus::Complete),
            (Role::Assistant, "new reply".to_string(), MessageStatus::Complete),
        ]
    );
    assert_eq!(service.sent()[1].0, 2);
}

#[tokio::test]
async fn stale_exchange_cannot_touch_newer_exchange() {
    let (_service, mut session) = started(vec![
        vec![Step::Fail("late failure")],
        vec![Step::Text("fresh")],
    ]);

    let mut old = session.submit("first").unwrap();
    session.restart().unwrap();
    let mut current = session.submit("second").unwrap();

    let late = old.next_update().await.unwrap();
    assert_eq!(session.apply(late), ApplyOutcome::Stale);
    assert_eq!(session.state(), &SessionState::Sending);

    while let Some(update) = current.next_update().await {
        session.apply(update);
    }
    assert_eq!(session.log().last().unwrap().text, "fresh");
}

#[test]
fn missing_credential_puts_session_in_error() {
    let service = ScriptedService::without_credential();
    let mut session = ChatSession::start(service.clone(), SessionConfig::default());

    assert!(matches!(session.state(), SessionState::Error(cause) if cause.contains("API key")));
    assert!(!session.has_handle());
    assert!(matches!(session.submit("Hi"), Err(Rejection::Unavailable(_))));
    assert!(session.log().is_empty());
    assert!(service.sent().is_empty());

    let err = session.restart().unwrap_err();
    assert!(matches!(err, SessionError::Open(AiError::MissingCredential(_))));
}

#[test]
fn unopened_session_is_unavailable() {
    let mut session = ChatSession::new(ScriptedService::default(), SessionConfig::default());
    assert_eq!(session.state(), &SessionState::Uninitialized);
    assert!(matches!(session.submit("Hi"), Err(Rejection::Unavailable(_))));
}

#[test]
fn configure_on_empty_log_reopens_immediately() {
    let (service, mut session) = started(vec![]);

    let outcome = session.configure_system_instruction("Speak like a pirate.").unwrap();
    assert_eq!(outcome, ConfigureOutcome::Applied);
    assert_eq!(session.config().system_instruction(), Some("Speak like a pirate."));
    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(
        service.opened(),
        vec![
            SessionConfig::default(),
            SessionConfig::with_system_instruction("Speak like a pirate."),
        ]
    );

    let outcome = session.configure_system_instruction("  Speak like a pirate. ").unwrap();
    assert_eq!(outcome, ConfigureOutcome::Unchanged);
    assert_eq!(service.opened().len(), 2);
}

#[tokio::test]
async fn configure_with_history_defers_until_restart() {
    let (service, mut session) = started(vec![vec![Step::Text("Hello")]]);
    session.send("Hi").await.unwrap();

    let outcome = session.configure_system_instruction("Be brief.").unwrap();
    assert_eq!(outcome, ConfigureOutcome::Deferred);
    assert_eq!(session.config().system_instruction(), None);
    assert_eq!(session.log().len(), 2);
    assert_eq!(service.opened().len(), 1);

    session.restart().unwrap();
    assert_eq!(session.config().system_instruction(), Some("Be brief."));
    assert!(session.pending_config().is_none());
    assert_eq!(
        service.opened().last(),
        Some(&SessionConfig::with_system_instruction("Be brief."))
    );
}

#[tokio::test]
async fn reverting_a_deferred_instruction_cancels_it() {
    let (_service, mut session) = started(vec![vec![Step::Text("Hello")]]);
    session.send("Hi").await.unwrap();

    session.configure_system_instruction("Be brief.").unwrap();
    session.configure_system_instruction("").unwrap();
    assert!(session.pending_config().is_none());
}

#[tokio::test]
async fn observers_see_events_in_order() {
    let (_service, mut session) = started(vec![vec![Step::Text("Hel"), Step::Text("lo")]]);
    let events = record_events(&mut session);

    session.send("Hi").await.unwrap();

    let events = events.lock().unwrap();
    let kinds: Vec<String> = events
        .iter()
        .map(|event| match event {
            ChatEvent::MessageAppended(m) => format!("appended:{}", m.text),
            ChatEvent::MessageUpdated(m) => format!("updated:{}", m.text),
            ChatEvent::StateChanged(state) => format!("state:{}", state.name()),
            ChatEvent::LogCleared => "cleared".to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "appended:Hi",
            "state:sending",
            "appended:",
            "updated:Hel",
            "updated:Hello",
            "updated:Hello",
            "state:ready",
        ]
    );
}

#[tokio::test]
async fn restart_notifies_log_cleared() {
    let (_service, mut session) = started(vec![]);
    let events = record_events(&mut session);

    session.restart().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events[0], ChatEvent::LogCleared);
    assert_eq!(events[1], ChatEvent::StateChanged(SessionState::Uninitialized));
    assert_eq!(events[2], ChatEvent::StateChanged(SessionState::Ready));
}

#[tokio::test]
async fn message_ids_are_unique() {
    let (_service, mut session) = started(vec![vec![Step::Text("a")], vec![Step::Text("b")]]);
    session.send("one").await.unwrap();
    session.send("two").await.unwrap();

    let mut ids: Vec<_> = session.log().iter().map(|m| m.id.clone()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn empty_reply_completes_with_empty_text() {
    let (_service, mut session) = started(vec![vec![]]);
    session.send("Hi").await.unwrap();
    assert_eq!(
        texts(&session)[1],
        (Role::Assistant, String::new(), MessageStatus::Complete)
    );
    assert_eq!(session.state(), &SessionState::Ready);
}

#[tokio::test]
async fn sending_is_left_only_through_apply_or_restart() {
    let (service, mut session) = started(vec![vec![Step::Text("one")], vec![Step::Text("two")]]);
    let mut exchange = session.submit("first").unwrap();

    assert_eq!(
        session.configure_system_instruction("Be brief.").unwrap(),
        ConfigureOutcome::Deferred
    );
    assert_eq!(session.state(), &SessionState::Sending);
    assert_eq!(session.submit("second").unwrap_err(), Rejection::Busy);
    assert_eq!(session.log().streaming_count(), 1);
    assert_eq!(service.opened().len(), 1);

    while let Some(update) = exchange.next_update().await {
        session.apply(update);
    }
    assert_eq!(session.state(), &SessionState::Ready);
    assert_eq!(session.log().streaming_count(), 0);
    assert_eq!(session.log().len(), 2);
}

#[tokio::test]
async fn error_is_left_only_through_restart() {
    let (service, mut session) = started(vec![vec![Step::Fail("reset")], vec![Step::Text("ok")]]);
    session.send("Hi").await.unwrap();
    assert!(matches!(session.state(), SessionState::Error(_)));

    assert_eq!(
        session.configure_system_instruction("Be brief.").unwrap(),
        ConfigureOutcome::Deferred
    );
    assert!(matches!(session.state(), SessionState::Error(_)));
    assert!(matches!(session.submit("again"), Err(Rejection::Unavailable(_))));
    assert_eq!(session.log().len(), 3);
    assert_eq!(service.opened().len(), 1);

    session.restart().unwrap();
    assert_eq!(session.state(), &SessionState::Ready);
    assert!(session.log().is_empty());
    assert_eq!(session.config().system_instruction(), Some("Be brief."));
}
