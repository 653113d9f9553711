use tracing::{debug, warn};

use super::{App, AppAction, AppCommand, ThreadPurpose};
use crate::api::ThreadSummary;
use crate::core::app::{title_from_prompt, REQUEST_FAILED_MESSAGE, STREAM_FAILED_MESSAGE};
use crate::core::message::{Message, Role};

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            if !app.conversation.is_current_stream(stream_id) {
                return Vec::new();
            }
            append_response_chunk(app, &content);
            Vec::new()
        }
        AppAction::StreamErrored { message, stream_id } => {
            if !app.conversation.is_current_stream(stream_id) {
                return Vec::new();
            }
            handle_stream_error(app, message);
            Vec::new()
        }
        AppAction::StreamCompleted { stream_id } => {
            if !app.conversation.is_current_stream(stream_id) {
                return Vec::new();
            }
            finalize_stream(app);
            Vec::new()
        }
        AppAction::CancelStreaming => {
            if app.conversation.cancel_current_stream() {
                app.ui.loading = false;
                app.ui.set_status("Response cancelled");
            }
            Vec::new()
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

/// Record the user's prompt and start a reply, creating a thread first when
/// none is active.
pub(super) fn begin_turn(app: &mut App, prompt: String) -> Vec<AppCommand> {
    app.transcript.push(Message::user(prompt.clone()));
    app.ui.clear_input();
    app.ui.clear_status();
    app.ui.loading = true;
    app.ui.scroll_to_bottom();

    match app.conversation.active_thread.clone() {
        Some(thread_id) => start_stream(app, &thread_id, &prompt),
        None => vec![AppCommand::CreateThread {
            title: title_from_prompt(&prompt),
            purpose: ThreadPurpose::Chat { prompt },
            epoch: app.conversation.epoch,
        }],
    }
}

fn start_stream(app: &mut App, thread_id: &str, prompt: &str) -> Vec<AppCommand> {
    let placeholder = app.transcript.push_tracked(Role::Assistant, "");
    let (cancel_token, stream_id) = app.conversation.start_new_stream(placeholder);
    debug!(stream_id, thread_id, "starting chat stream");
    let params = app
        .conversation
        .build_stream_params(thread_id, prompt, cancel_token, stream_id);
    vec![AppCommand::SpawnStream(params)]
}

pub(super) fn handle_thread_created(
    app: &mut App,
    thread: ThreadSummary,
    prompt: String,
    epoch: u64,
) -> Vec<AppCommand> {
    if !app.conversation.is_current_epoch(epoch) {
        debug!(thread_id = %thread.id, "thread created for an abandoned conversation");
        return vec![AppCommand::FetchThreads];
    }

    let thread_id = thread.id.clone();
    remember_thread(app, thread);
    app.conversation.active_thread = Some(thread_id.clone());

    let mut commands = vec![AppCommand::FetchThreads];
    commands.extend(start_stream(app, &thread_id, &prompt));
    commands
}

pub(super) fn handle_thread_create_failed(
    app: &mut App,
    message: String,
    epoch: u64,
) -> Vec<AppCommand> {
    if !app.conversation.is_current_epoch(epoch) {
        return Vec::new();
    }
    warn!(error = %message, "request failed");
    app.transcript.push(Message::error(REQUEST_FAILED_MESSAGE));
    app.ui.loading = false;
    app.ui.set_status(message);
    Vec::new()
}

/// Show a freshly created thread before the list refetch lands.
pub(super) fn remember_thread(app: &mut App, thread: ThreadSummary) {
    if !app.conversation.threads.iter().any(|t| t.id == thread.id) {
        app.conversation.threads.insert(0, thread);
    }
}

fn append_response_chunk(app: &mut App, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    let Some(turn) = app.conversation.streaming.as_mut() else {
        return;
    };
    turn.accumulated.push_str(chunk);
    let updated = turn.accumulated.clone();
    if !app.transcript.set_content(turn.placeholder, updated) {
        debug!(placeholder = %turn.placeholder, "placeholder no longer in transcript");
    }
}

fn handle_stream_error(app: &mut App, message: String) {
    warn!(error = %message, "chat stream failed");
    app.conversation.cancel_current_stream();
    app.transcript.push(Message::error(STREAM_FAILED_MESSAGE));
    app.ui.loading = false;
    let detail = message.trim();
    if !detail.is_empty() {
        app.ui.set_status(detail.to_string());
    }
}

fn finalize_stream(app: &mut App) {
    app.conversation.streaming = None;
    app.conversation.stream_cancel_token = None;
    app.ui.loading = false;
}
