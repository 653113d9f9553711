use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::streaming::remember_thread;
use super::{App, AppAction, AppCommand, ThreadPurpose};
use crate::api::ThreadSummary;
use crate::core::app::UPLOAD_THREAD_TITLE;
use crate::core::message::Message;

pub(super) fn handle_upload_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::UploadFile { path } => {
            if app.ui.loading {
                return Vec::new();
            }
            begin_upload(app, path)
        }
        AppAction::UploadCompleted {
            file_name,
            result,
            epoch,
        } => {
            if !app.conversation.is_current_epoch(epoch) {
                return Vec::new();
            }
            match result {
                Ok(()) => {
                    info!(file_name, "file uploaded");
                    app.transcript.push(Message::assistant(format!(
                        "File uploaded successfully: {file_name}"
                    )));
                }
                Err(reason) => {
                    warn!(file_name, error = %reason, "file upload failed");
                    app.transcript
                        .push(Message::error(format!("Failed to upload file: {reason}")));
                }
            }
            app.ui.loading = false;
            app.ui.scroll_to_bottom();
            Vec::new()
        }
        _ => unreachable!("non-upload action routed to upload handler"),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Attach a file to the active thread, creating one when on the home screen.
pub(super) fn begin_upload(app: &mut App, path: PathBuf) -> Vec<AppCommand> {
    app.ui.clear_status();
    app.ui.loading = true;
    app.ui.scroll_to_bottom();

    match app.conversation.active_thread.clone() {
        Some(thread_id) => send_upload(app, thread_id, path),
        None => vec![AppCommand::CreateThread {
            title: UPLOAD_THREAD_TITLE.to_string(),
            purpose: ThreadPurpose::Upload { path },
            epoch: app.conversation.epoch,
        }],
    }
}

fn send_upload(app: &mut App, thread_id: String, path: PathBuf) -> Vec<AppCommand> {
    let name = display_name(&path);
    app.transcript
        .push(Message::user(format!("Uploading file: {name}...")));
    vec![AppCommand::UploadFile {
        thread_id,
        path,
        file_name: name,
        epoch: app.conversation.epoch,
    }]
}

pub(super) fn handle_thread_created(
    app: &mut App,
    thread: ThreadSummary,
    path: PathBuf,
    epoch: u64,
) -> Vec<AppCommand> {
    if !app.conversation.is_current_epoch(epoch) {
        return vec![AppCommand::FetchThreads];
    }
    let thread_id = thread.id.clone();
    remember_thread(app, thread);
    app.conversation.active_thread = Some(thread_id.clone());

    let mut commands = vec![AppCommand::FetchThreads];
    commands.extend(send_upload(app, thread_id, path));
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
    warn!(error = %message, "could not create a thread for the upload");
    app.transcript
        .push(Message::error(format!("Failed to upload file: {message}")));
    app.ui.loading = false;
    Vec::new()
}
