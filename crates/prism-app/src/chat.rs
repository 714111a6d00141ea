//! Interactive terminal chat loop.

use std::io::Write;
use std::sync::Mutex;

use prism_ai::completion::{CompletionService, SessionConfig};
use prism_ai::session::{
    ChatEvent, ConfigureOutcome, Exchange, MessageStatus, Rejection, SessionState,
};
use prism_ai::{ChatSession, Role};
use prism_common::PrismError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// A line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Message(&'a str),
    Restart,
    System(&'a str),
    Quit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line);
        };
        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        match name {
            "restart" => Input::Restart,
            "system" => Input::System(rest.trim()),
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(name),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run<S, R>(
    service: S,
    system_instruction: Option<&str>,
    input: R,
) -> Result<(), PrismError>
where
    S: CompletionService,
    R: AsyncBufRead + Unpin,
{
    let mut session = ChatSession::start(service, SessionConfig::new(system_instruction));
    session.subscribe(Box::new(printer()));
    if let SessionState::Error(cause) = session.state() {
        eprintln!("Chat unavailable: {cause}");
    }
    eprintln!("Type a message, or /system <text>, /restart, /quit.");

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let flow = match Input::parse(&line) {
            Input::Message(text) => {
                session.set_input(text);
                match session.submit(text) {
                    Ok(mut exchange) => drive(&mut session, &mut exchange, &mut lines).await?,
                    Err(rejection) => {
                        report_rejection(&rejection);
                        Flow::Continue
                    }
                }
            }
            other => command(&mut session, other),
        };
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Apply stream updates until the reply ends, still accepting commands.
async fn drive<S, R>(
    session: &mut ChatSession<S>,
    exchange: &mut Exchange,
    lines: &mut Lines<R>,
) -> Result<Flow, PrismError>
where
    S: CompletionService,
    R: AsyncBufRead + Unpin,
{
    loop {
        tokio::select! {
            update = exchange.next_update() => match update {
                Some(update) => {
                    session.apply(update);
                }
                None => return Ok(Flow::Continue),
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(Flow::Quit);
                };
                match Input::parse(&line) {
                    Input::Message(text) => {
                        if let Err(rejection) = session.submit(text) {
                            report_rejection(&rejection);
                        }
                    }
                    Input::Restart => {
                        command(session, Input::Restart);
                        return Ok(Flow::Continue);
                    }
                    other => {
                        if command(session, other) == Flow::Quit {
                            return Ok(Flow::Quit);
                        }
                    }
                }
            }
        }
    }
}

fn command<S: CompletionService>(session: &mut ChatSession<S>, input: Input<'_>) -> Flow {
    match input {
        Input::Quit => return Flow::Quit,
        Input::Restart => {
            if let Err(e) = session.restart() {
                eprintln!("Restart failed: {e}");
            }
        }
        Input::System(text) => match session.configure_system_instruction(text) {
            Ok(ConfigureOutcome::Applied) => eprintln!("(system instruction applied)"),
            Ok(ConfigureOutcome::Deferred) => {
                eprintln!("(system instruction takes effect after /restart)")
            }
            Ok(ConfigureOutcome::Unchanged) => {}
            Err(e) => eprintln!("Could not apply system instruction: {e}"),
        },
        Input::Unknown(name) => eprintln!("Unknown command: /{name}"),
        Input::Message(_) => {}
    }
    Flow::Continue
}

fn report_rejection(rejection: &Rejection) {
    match rejection {
        Rejection::Blank => {}
        Rejection::Busy => eprintln!("(still replying; /restart abandons the reply)"),
        Rejection::Unavailable(cause) => {
            eprintln!("Chat unavailable: {cause}. Fix it and type /restart.")
        }
    }
}

/// Observer that prints assistant text as it streams in.
fn printer() -> impl Fn(&ChatEvent) + Send + Sync + 'static {
    let printed = Mutex::new(0usize);
    move |event: &ChatEvent| {
        let mut printed = printed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut out = std::io::stdout().lock();
        match event {
            ChatEvent::MessageAppended(message) if message.role == Role::Assistant => {
                match message.status {
                    MessageStatus::ErrorNotice => eprintln!("{}", message.text),
                    _ => *printed = 0,
                }
            }
            ChatEvent::MessageUpdated(message) => {
                if let Some(delta) = message.text.get(*printed..) {
                    let _ = write!(out, "{delta}");
                }
                *printed = message.text.len();
                if message.status != MessageStatus::Streaming {
                    let _ = writeln!(out);
                }
                let _ = out.flush();
            }
            ChatEvent::LogCleared => eprintln!("(conversation restarted)"),
            ChatEvent::StateChanged(SessionState::Error(cause)) => {
                tracing::debug!(%cause, "Chat entered error state");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures_util::stream::{self, StreamExt};
    use prism_ai::completion::{Fragment, FragmentStream};
    use prism_ai::AiError;

    use super::*;

    /// Service whose replies send one fragment and then never finish.
    #[derive(Clone, Default)]
    struct StalledService {
        opened: Arc<Mutex<usize>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl CompletionService for StalledService {
        type Handle = ();

        fn open(&self, _config: &SessionConfig) -> Result<(), AiError> {
            *self.opened.lock().unwrap() += 1;
            Ok(())
        }

        fn stream_send(&self, _handle: &mut (), text: &str) -> FragmentStream {
            self.sent.lock().unwrap().push(text.to_string());
            stream::iter(vec![Ok(Fragment::new("Hel"))])
                .chain(stream::pending())
                .boxed()
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse("  hello there "), Input::Message("hello there"));
        assert_eq!(Input::parse("/restart"), Input::Restart);
        assert_eq!(Input::parse("/system  Be brief. "), Input::System("Be brief."));
        assert_eq!(Input::parse("/system"), Input::System(""));
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("/help"), Input::Unknown("help"));
    }

    #[tokio::test]
    async fn loop_runs_without_credential() {
        let client = prism_ai::GeminiClient::new(prism_ai::GeminiConfig::new("")).unwrap();
        let input: &[u8] = b"hello\n/system Be brief.\n/quit\n";
        run(client, None, input).await.unwrap();
    }

    #[tokio::test]
    async fn restart_abandons_a_stalled_reply() {
        let service = StalledService::default();
        let input: &[u8] = b"hi\n/restart\n/quit\n";

        run(service.clone(), None, input).await.unwrap();

        assert_eq!(*service.opened.lock().unwrap(), 2);
        assert_eq!(*service.sent.lock().unwrap(), vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn message_typed_mid_reply_is_rejected_as_busy() {
        let service = StalledService::default();
        let input: &[u8] = b"hi\nanother one\n/restart\nafter restart\n/quit\n";

        run(service.clone(), None, input).await.unwrap();

        assert_eq!(
            *service.sent.lock().unwrap(),
            vec!["hi".to_string(), "after restart".to_string()]
        );
        assert_eq!(*service.opened.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn end_of_input_mid_reply_ends_the_loop() {
        let service = StalledService::default();
        let input: &[u8] = b"hi\n";

        run(service.clone(), None, input).await.unwrap();

        assert_eq!(*service.opened.lock().unwrap(), 1);
    }
}
