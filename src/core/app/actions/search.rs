use tracing::warn;

use super::{App, AppAction, AppCommand};
use crate::core::app::{SEARCH_FAILED_MESSAGE, SEARCH_FALLBACK, SEARCH_PLACEHOLDER};
use crate::core::message::{Message, Role};

pub(super) fn handle_search_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::SetSearchMode { enabled } => {
            if app.conversation.pending_search.is_none() {
                app.ui.search_mode = enabled;
            }
            Vec::new()
        }
        AppAction::SearchCompleted {
            placeholder,
            result,
            epoch,
        } => {
            if !app.conversation.is_current_epoch(epoch)
                || app.conversation.pending_search != Some(placeholder)
            {
                return Vec::new();
            }
            app.conversation.pending_search = None;
            match result {
                Ok(answer) => {
                    let content = answer
                        .filter(|text| !text.is_empty())
                        .unwrap_or_else(|| SEARCH_FALLBACK.to_string());
                    app.transcript.set_content(placeholder, content);
                }
                Err(message) => {
                    warn!(error = %message, "web search failed");
                    app.transcript.push(Message::error(SEARCH_FAILED_MESSAGE));
                }
            }
            app.ui.loading = false;
            app.ui.search_mode = false;
            Vec::new()
        }
        _ => unreachable!("non-search action routed to search handler"),
    }
}

/// One search round trip; search mode ends when it resolves either way.
pub(super) fn begin_search(app: &mut App, query: String) -> Vec<AppCommand> {
    app.transcript.push(Message::user(query.clone()));
    app.ui.clear_input();
    app.ui.clear_status();
    app.ui.loading = true;
    app.ui.scroll_to_bottom();

    let placeholder = app.transcript.push_tracked(Role::Assistant, SEARCH_PLACEHOLDER);
    app.conversation.pending_search = Some(placeholder);
    vec![AppCommand::RunSearch {
        query,
        placeholder,
        epoch: app.conversation.epoch,
    }]
}
