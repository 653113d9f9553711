//! Chat screen event loop.
//!
//! Terminal input is read on a background task and resolved into
//! [`AppAction`]s. Actions are reduced against the [`App`] owned by the loop;
//! the resulting commands are handed to the [`CommandExecutor`], whose results
//! come back through the same action queue. Stream output is coalesced per
//! tick before it reaches the reducer.

mod executors;
mod keybindings;
mod lifecycle;

use std::{
    error::Error,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEventKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::BackendClient;
use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::Config;
use crate::core::session::{CredentialStore, SessionStore};
use crate::ui::renderer::ui;
use crate::utils::prompt::sanitize_pasted_text;

use self::executors::{CommandExecutor, LocalCommand};
use self::keybindings::{resolve_key, KeyResult};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

const MOUSE_SCROLL_LINES: u16 = 3;
const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// Forward everything the stream tasks produced since the last tick.
/// Consecutive chunks are merged into one append.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    ctx: AppActionContext,
    current_stream_id: u64,
) -> bool {
    let mut received_any = false;
    let mut coalesced_chunks = String::new();
    let mut followup_actions = Vec::new();

    while let Ok((message, msg_stream_id)) = rx.try_recv() {
        if msg_stream_id != current_stream_id {
            continue;
        }
        match message {
            StreamMessage::Chunk(content) => coalesced_chunks.push_str(&content),
            StreamMessage::Error(message) => followup_actions.push(AppAction::StreamErrored {
                message,
                stream_id: msg_stream_id,
            }),
            StreamMessage::End => followup_actions.push(AppAction::StreamCompleted {
                stream_id: msg_stream_id,
            }),
        }
        received_any = true;
    }

    if !received_any {
        return false;
    }

    let mut actions = Vec::with_capacity(1 + followup_actions.len());
    if !coalesced_chunks.is_empty() {
        actions.push(AppAction::AppendResponseChunk {
            content: coalesced_chunks,
            stream_id: current_stream_id,
        });
    }
    actions.extend(followup_actions);
    dispatcher.dispatch_many(actions, ctx);
    true
}

/// State owned by the running chat screen.
struct ChatLoop<S> {
    app: App,
    sessions: SessionStore<S>,
    dispatcher: AppActionDispatcher,
    action_rx: mpsc::UnboundedReceiver<AppActionEnvelope>,
    executor: CommandExecutor,
    ctx: AppActionContext,
}

impl<S: CredentialStore> ChatLoop<S> {
    fn new(app: App, sessions: SessionStore<S>, stream_service: ChatStreamService) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
        let dispatcher = AppActionDispatcher::new(action_tx);
        let executor = CommandExecutor::new(dispatcher.clone(), stream_service);
        Self {
            app,
            sessions,
            dispatcher,
            action_rx,
            executor,
            ctx: AppActionContext::default(),
        }
    }

    fn dispatch(&self, actions: impl IntoIterator<Item = AppAction>) {
        self.dispatcher.dispatch_many(actions, self.ctx);
    }

    /// Reduce every queued action and run the commands it produced.
    fn drain_action_queue(&mut self) -> bool {
        let mut pending = Vec::new();
        while let Ok(envelope) = self.action_rx.try_recv() {
            pending.push(envelope);
        }
        if pending.is_empty() {
            return false;
        }

        let commands = apply_actions(&mut self.app, pending);
        for command in commands {
            let local = self.executor.execute(
                &self.app.conversation.client,
                &self.app.conversation.token,
                command,
            );
            if let Some(LocalCommand::PersistLogout) = local {
                if let Err(err) = self.sessions.logout() {
                    warn!(error = %err, "failed to clear stored session");
                }
            }
        }
        true
    }

    /// Returns whether the screen needs a redraw.
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
                true
            }
            Event::Paste(text) => {
                let text = sanitize_pasted_text(&text);
                if !text.is_empty() {
                    self.dispatch([AppAction::InsertIntoInput { text }]);
                    self.drain_action_queue();
                }
                true
            }
            Event::Mouse(mouse) => {
                let action = match mouse.kind {
                    MouseEventKind::ScrollUp => AppAction::ScrollUp {
                        lines: MOUSE_SCROLL_LINES,
                    },
                    MouseEventKind::ScrollDown => AppAction::ScrollDown {
                        lines: MOUSE_SCROLL_LINES,
                    },
                    _ => return false,
                };
                self.dispatch([action]);
                self.drain_action_queue();
                true
            }
            Event::Resize(width, height) => {
                self.ctx = AppActionContext {
                    term_width: width,
                    term_height: height,
                };
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match resolve_key(&self.app, &key) {
            KeyResult::Actions(actions) => {
                self.dispatch(actions);
                // Reduce now so the next key sees the updated input.
                self.drain_action_queue();
            }
            KeyResult::EditInput => {
                self.app.ui.apply_textarea_edit(|ta| {
                    ta.input(tui_textarea::Input::from(key));
                });
            }
            KeyResult::Ignored => {}
        }
    }
}

fn try_draw_frame(
    terminal: &mut ChatTerminal,
    app: &App,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> std::io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }
    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }
    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

pub async fn run_chat<S: CredentialStore>(
    config: &Config,
    client: BackendClient,
    token: String,
    provider: String,
    sessions: SessionStore<S>,
) -> Result<(), Box<dyn Error>> {
    let app = App::from_config(config, client, token, provider);
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let mut chat = ChatLoop::new(app, sessions, stream_service);
    chat.dispatch([AppAction::LoadThreads]);

    let mut terminal = setup_terminal()?;
    let size = terminal.size()?;
    chat.ctx = AppActionContext {
        term_width: size.width,
        term_height: size.height,
    };
    info!(api_url = chat.app.conversation.client.base_url(), "chat session started");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        if chat.app.ui.exit_requested {
            break Ok(());
        }

        if let Err(err) = try_draw_frame(
            &mut terminal,
            &chat.app,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break Err(err.into());
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            events_processed = true;
            if chat.handle_event(ev) {
                request_redraw = true;
            }
            if chat.app.ui.exit_requested {
                break;
            }
        }

        let received_any = process_stream_updates(
            &chat.dispatcher,
            &mut stream_rx,
            chat.ctx,
            chat.app.conversation.current_stream_id,
        );
        if received_any {
            request_redraw = true;
        }

        if chat.drain_action_queue() {
            request_redraw = true;
        }

        let idle = !events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    if chat.app.logged_out {
        println!("Logged out.");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::session::{MemoryCredentialStore, TOKEN_KEY, USER_ID_KEY};
    use crate::utils::test_utils::{create_test_app, create_test_app_with_thread};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn chat_loop(app: App) -> ChatLoop<MemoryCredentialStore> {
        let store = MemoryCredentialStore::with_values([(TOKEN_KEY, "tok"), (USER_ID_KEY, "u1")]);
        let sessions = SessionStore::restore(store).expect("restore");
        let (stream_service, _rx) = ChatStreamService::new();
        ChatLoop::new(app, sessions, stream_service)
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>) -> Vec<AppAction> {
        let mut actions = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            actions.push(envelope.action);
        }
        actions
    }

    #[test]
    fn stream_chunks_are_coalesced_before_followups() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        tx.send((StreamMessage::Chunk("Hel".into()), 2)).unwrap();
        tx.send((StreamMessage::Chunk("stale".into()), 1)).unwrap();
        tx.send((StreamMessage::Chunk("lo".into()), 2)).unwrap();
        tx.send((StreamMessage::End, 2)).unwrap();

        assert!(process_stream_updates(
            &dispatcher,
            &mut rx,
            AppActionContext::default(),
            2
        ));

        let actions = drain(&mut action_rx);
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            AppAction::AppendResponseChunk { content, stream_id } => {
                assert_eq!(content, "Hello");
                assert_eq!(*stream_id, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            actions[1],
            AppAction::StreamCompleted { stream_id: 2 }
        ));
    }

    #[test]
    fn stream_errors_are_forwarded_after_chunks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);

        tx.send((StreamMessage::Chunk("partial".into()), 4)).unwrap();
        tx.send((StreamMessage::Error("boom".into()), 4)).unwrap();
        tx.send((StreamMessage::End, 4)).unwrap();
        process_stream_updates(&dispatcher, &mut rx, AppActionContext::default(), 4);

        let actions = drain(&mut action_rx);
        assert!(matches!(actions[0], AppAction::AppendResponseChunk { .. }));
        assert!(matches!(actions[1], AppAction::StreamErrored { .. }));
        assert!(matches!(actions[2], AppAction::StreamCompleted { .. }));
    }

    #[test]
    fn empty_stream_queue_reports_nothing() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<(StreamMessage, u64)>();
        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(action_tx);
        assert!(!process_stream_updates(
            &dispatcher,
            &mut rx,
            AppActionContext::default(),
            0
        ));
    }

    #[test]
    fn typed_characters_reach_the_input() {
        let mut chat = chat_loop(create_test_app_with_thread("t1"));
        chat.handle_event(press(KeyCode::Char('h'), KeyModifiers::NONE));
        chat.handle_event(press(KeyCode::Char('i'), KeyModifiers::NONE));
        assert_eq!(chat.app.ui.get_input_text(), "hi");
    }

    #[test]
    fn paste_is_sanitized_into_the_input() {
        let mut chat = chat_loop(create_test_app());
        chat.handle_event(Event::Paste("one\r\ntwo\tthree".into()));
        assert_eq!(chat.app.ui.get_input_text(), "one\ntwo    three");
    }

    #[tokio::test]
    async fn keys_after_submit_land_in_the_cleared_input() {
        let mut chat = chat_loop(create_test_app_with_thread("t1"));
        chat.app.ui.set_input_text("hello".into());

        chat.handle_event(press(KeyCode::Enter, KeyModifiers::NONE));
        chat.handle_event(press(KeyCode::Char('b'), KeyModifiers::NONE));

        assert_eq!(chat.app.ui.get_input_text(), "b");
        let user_turns: Vec<_> = chat
            .app
            .transcript
            .messages()
            .iter()
            .filter(|m| m.role == Role::User)
            .collect();
        assert_eq!(user_turns.len(), 1);
        assert_eq!(user_turns[0].content, "hello");
        assert!(chat.app.is_streaming());
    }

    #[tokio::test]
    async fn logout_clears_the_stored_session_and_exits() {
        let mut chat = chat_loop(create_test_app());
        assert!(chat.sessions.is_active());

        chat.handle_event(press(KeyCode::Char('l'), KeyModifiers::CONTROL));

        assert!(!chat.sessions.is_active());
        assert!(chat.app.logged_out);
        assert!(chat.app.ui.exit_requested);
    }

    #[test]
    fn escape_cancels_the_running_stream() {
        let mut chat = chat_loop(create_test_app_with_thread("t1"));
        let placeholder = chat.app.transcript.push_tracked(Role::Assistant, "");
        chat.app.conversation.start_new_stream(placeholder);

        chat.handle_event(press(KeyCode::Esc, KeyModifiers::NONE));
        assert!(!chat.app.is_streaming());
    }

    #[test]
    fn resize_updates_action_context() {
        let mut chat = chat_loop(create_test_app());
        assert!(chat.handle_event(Event::Resize(120, 40)));
        assert_eq!(chat.ctx.term_width, 120);
        assert_eq!(chat.ctx.term_height, 40);
    }
}
