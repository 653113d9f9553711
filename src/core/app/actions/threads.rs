use tracing::{debug, info, warn};

use super::{App, AppAction, AppCommand};
use crate::api::turns_to_messages;
use crate::core::app::{Focus, HISTORY_FAILED_MESSAGE};
use crate::core::message::Message;

pub(super) fn handle_thread_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::NewChat => {
            app.start_new_chat();
            app.ui.sidebar_open = false;
            app.ui.focus = Focus::Input;
            Vec::new()
        }
        AppAction::LoadThreads => vec![AppCommand::FetchThreads],
        AppAction::SelectThread { thread_id } => select_thread(app, thread_id),
        AppAction::RequestDeleteSelected => {
            if let Some(thread_id) = app.selected_thread_id().map(str::to_string) {
                let title = app
                    .conversation
                    .thread_title(&thread_id)
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Untitled");
                app.ui
                    .set_status(format!("Delete \"{title}\"? Press y to confirm"));
                app.ui.pending_delete = Some(thread_id);
            }
            Vec::new()
        }
        AppAction::ConfirmDelete => match app.ui.pending_delete.take() {
            Some(thread_id) => {
                app.ui.clear_status();
                vec![AppCommand::DeleteThread { thread_id }]
            }
            None => Vec::new(),
        },
        AppAction::CancelDelete => {
            if app.ui.pending_delete.take().is_some() {
                app.ui.clear_status();
            }
            Vec::new()
        }
        AppAction::DeleteThread { thread_id } => vec![AppCommand::DeleteThread { thread_id }],
        AppAction::ToggleSidebar => {
            app.ui.sidebar_open = !app.ui.sidebar_open;
            app.ui.focus = if app.ui.sidebar_open {
                Focus::Sidebar
            } else {
                Focus::Input
            };
            app.ui.clamp_sidebar_selection(app.conversation.threads.len());
            Vec::new()
        }
        AppAction::ToggleFocus => {
            app.ui.focus = match app.ui.focus {
                Focus::Input if app.ui.sidebar_open => Focus::Sidebar,
                _ => Focus::Input,
            };
            Vec::new()
        }
        AppAction::SidebarMoveUp => {
            app.ui.sidebar_selected = app.ui.sidebar_selected.saturating_sub(1);
            Vec::new()
        }
        AppAction::SidebarMoveDown => {
            app.ui.sidebar_selected += 1;
            app.ui.clamp_sidebar_selection(app.conversation.threads.len());
            Vec::new()
        }
        AppAction::SidebarActivate => match app.selected_thread_id().map(str::to_string) {
            Some(thread_id) => select_thread(app, thread_id),
            None => Vec::new(),
        },
        AppAction::ThreadsLoaded { threads } => {
            debug!(count = threads.len(), "threads loaded");
            app.conversation.threads = threads;
            app.ui.clamp_sidebar_selection(app.conversation.threads.len());
            Vec::new()
        }
        AppAction::ThreadsLoadFailed { message } => {
            warn!(error = %message, "failed to load threads");
            Vec::new()
        }
        AppAction::HistoryLoaded { turns, epoch } => {
            if !app.conversation.is_current_epoch(epoch) {
                return Vec::new();
            }
            app.transcript.replace_all(turns_to_messages(&turns));
            app.ui.loading = false;
            app.ui.scroll_to_bottom();
            Vec::new()
        }
        AppAction::HistoryLoadFailed { message, epoch } => {
            if !app.conversation.is_current_epoch(epoch) {
                return Vec::new();
            }
            warn!(error = %message, "failed to load history");
            app.transcript
                .replace_all(vec![Message::error(HISTORY_FAILED_MESSAGE)]);
            app.ui.loading = false;
            Vec::new()
        }
        AppAction::ThreadDeleted { thread_id } => {
            info!(thread_id, "thread deleted");
            app.conversation.threads.retain(|t| t.id != thread_id);
            app.ui.clamp_sidebar_selection(app.conversation.threads.len());
            if app.conversation.active_thread.as_deref() == Some(thread_id.as_str()) {
                app.start_new_chat();
            }
            Vec::new()
        }
        AppAction::ThreadDeleteFailed { thread_id, message } => {
            warn!(thread_id, error = %message, "failed to delete thread");
            app.ui.set_status("Failed to delete thread");
            Vec::new()
        }
        _ => unreachable!("non-thread action routed to thread handler"),
    }
}

fn select_thread(app: &mut App, thread_id: String) -> Vec<AppCommand> {
    app.abandon_conversation();
    app.transcript.clear();
    app.conversation.active_thread = Some(thread_id.clone());
    app.ui.loading = true;
    app.ui.sidebar_open = false;
    app.ui.focus = Focus::Input;
    app.ui.clear_status();
    debug!(thread_id, "loading history");
    vec![AppCommand::FetchHistory {
        thread_id,
        epoch: app.conversation.epoch,
    }]
}
