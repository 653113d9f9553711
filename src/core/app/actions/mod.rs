mod input;
mod search;
mod streaming;
mod threads;
mod upload;

use std::path::PathBuf;

use tokio::sync::mpsc;

use super::{App, MenuOption};
use crate::api::{ThreadSummary, Turn};
use crate::core::chat_stream::StreamParams;
use crate::core::message::MessageId;

/// Why a thread is being created on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadPurpose {
    /// First message of a new conversation.
    Chat { prompt: String },
    /// File attached from the home screen.
    Upload { path: PathBuf },
}

#[derive(Debug)]
pub enum AppAction {
    SubmitMessage {
        message: String,
    },
    NewChat,
    LoadThreads,
    SelectThread {
        thread_id: String,
    },
    RequestDeleteSelected,
    ConfirmDelete,
    CancelDelete,
    DeleteThread {
        thread_id: String,
    },
    ToggleMenu,
    MenuMoveUp,
    MenuMoveDown,
    SelectMenuOption {
        option: MenuOption,
    },
    SetSearchMode {
        enabled: bool,
    },
    CancelFilePath,
    ToggleSidebar,
    ToggleFocus,
    SidebarMoveUp,
    SidebarMoveDown,
    SidebarActivate,
    InsertIntoInput {
        text: String,
    },
    ClearInput,
    FillSuggestion {
        index: usize,
    },
    UploadFile {
        path: PathBuf,
    },
    SetStatus {
        message: String,
    },
    ClearStatus,
    ScrollUp {
        lines: u16,
    },
    ScrollDown {
        lines: u16,
    },
    ScrollPageUp,
    ScrollPageDown,
    CancelStreaming,
    Logout,
    Quit,

    ThreadCreated {
        thread: ThreadSummary,
        purpose: ThreadPurpose,
        epoch: u64,
    },
    ThreadCreateFailed {
        message: String,
        purpose: ThreadPurpose,
        epoch: u64,
    },
    ThreadsLoaded {
        threads: Vec<ThreadSummary>,
    },
    ThreadsLoadFailed {
        message: String,
    },
    HistoryLoaded {
        turns: Vec<Turn>,
        epoch: u64,
    },
    HistoryLoadFailed {
        message: String,
        epoch: u64,
    },
    ThreadDeleted {
        thread_id: String,
    },
    ThreadDeleteFailed {
        thread_id: String,
        message: String,
    },
    AppendResponseChunk {
        content: String,
        stream_id: u64,
    },
    StreamErrored {
        message: String,
        stream_id: u64,
    },
    StreamCompleted {
        stream_id: u64,
    },
    SearchCompleted {
        placeholder: MessageId,
        result: Result<Option<String>, String>,
        epoch: u64,
    },
    UploadCompleted {
        file_name: String,
        result: Result<(), String>,
        epoch: u64,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, ctx: AppActionContext) {
        let _ = self.tx.send(AppActionEnvelope {
            action,
            context: ctx,
        });
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            self.dispatch(action, ctx);
        }
    }
}

/// Side effects requested by the reducer. Each one resolves into a result
/// action carrying the same epoch, when it has one.
#[derive(Debug)]
pub enum AppCommand {
    CreateThread {
        title: String,
        purpose: ThreadPurpose,
        epoch: u64,
    },
    FetchThreads,
    FetchHistory {
        thread_id: String,
        epoch: u64,
    },
    DeleteThread {
        thread_id: String,
    },
    SpawnStream(StreamParams),
    RunSearch {
        query: String,
        placeholder: MessageId,
        epoch: u64,
    },
    UploadFile {
        thread_id: String,
        path: PathBuf,
        file_name: String,
        epoch: u64,
    },
    PersistLogout,
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        commands.extend(apply_action(app, envelope.action, envelope.context));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => submit_message(app, message),

        AppAction::ThreadCreated {
            thread,
            purpose,
            epoch,
        } => match purpose {
            ThreadPurpose::Chat { prompt } => {
                streaming::handle_thread_created(app, thread, prompt, epoch)
            }
            ThreadPurpose::Upload { path } => {
                upload::handle_thread_created(app, thread, path, epoch)
            }
        },
        AppAction::ThreadCreateFailed {
            message,
            purpose,
            epoch,
        } => match purpose {
            ThreadPurpose::Chat { .. } => {
                streaming::handle_thread_create_failed(app, message, epoch)
            }
            ThreadPurpose::Upload { .. } => {
                upload::handle_thread_create_failed(app, message, epoch)
            }
        },

        AppAction::AppendResponseChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::CancelStreaming => streaming::handle_streaming_action(app, action),

        AppAction::NewChat
        | AppAction::LoadThreads
        | AppAction::SelectThread { .. }
        | AppAction::RequestDeleteSelected
        | AppAction::ConfirmDelete
        | AppAction::CancelDelete
        | AppAction::DeleteThread { .. }
        | AppAction::ToggleSidebar
        | AppAction::ToggleFocus
        | AppAction::SidebarMoveUp
        | AppAction::SidebarMoveDown
        | AppAction::SidebarActivate
        | AppAction::ThreadsLoaded { .. }
        | AppAction::ThreadsLoadFailed { .. }
        | AppAction::HistoryLoaded { .. }
        | AppAction::HistoryLoadFailed { .. }
        | AppAction::ThreadDeleted { .. }
        | AppAction::ThreadDeleteFailed { .. } => threads::handle_thread_action(app, action),

        AppAction::SetSearchMode { .. } | AppAction::SearchCompleted { .. } => {
            search::handle_search_action(app, action)
        }

        AppAction::UploadFile { .. } | AppAction::UploadCompleted { .. } => {
            upload::handle_upload_action(app, action)
        }

        AppAction::ToggleMenu
        | AppAction::MenuMoveUp
        | AppAction::MenuMoveDown
        | AppAction::SelectMenuOption { .. }
        | AppAction::CancelFilePath
        | AppAction::InsertIntoInput { .. }
        | AppAction::ClearInput
        | AppAction::FillSuggestion { .. }
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus
        | AppAction::ScrollUp { .. }
        | AppAction::ScrollDown { .. }
        | AppAction::ScrollPageUp
        | AppAction::ScrollPageDown
        | AppAction::Logout
        | AppAction::Quit => input::handle_input_action(app, action, ctx),
    }
}

/// Route a submitted input to whichever flow the input box is in.
fn submit_message(app: &mut App, message: String) -> Vec<AppCommand> {
    if app.ui.loading {
        return Vec::new();
    }
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if app.ui.input_mode == super::InputMode::FilePath {
        let path = PathBuf::from(trimmed);
        app.ui.leave_file_path_mode();
        return upload::begin_upload(app, path);
    }

    if app.ui.search_mode {
        search::begin_search(app, message)
    } else {
        streaming::begin_turn(app, message)
    }
}
