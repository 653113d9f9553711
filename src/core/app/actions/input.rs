use tracing::info;

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::{MenuOption, SUGGESTIONS};

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    match action {
        AppAction::ToggleMenu => {
            app.ui.menu_open = !app.ui.menu_open;
            app.ui.menu_selected = 0;
            Vec::new()
        }
        AppAction::MenuMoveUp => {
            let count = MenuOption::ALL.len();
            app.ui.menu_selected = (app.ui.menu_selected + count - 1) % count;
            Vec::new()
        }
        AppAction::MenuMoveDown => {
            app.ui.menu_selected = (app.ui.menu_selected + 1) % MenuOption::ALL.len();
            Vec::new()
        }
        AppAction::SelectMenuOption { option } => {
            app.ui.menu_open = false;
            match option {
                MenuOption::AttachFile => app.ui.enter_file_path_mode(),
                MenuOption::WebSearch => {
                    app.ui.leave_file_path_mode();
                    app.ui.search_mode = true;
                }
                MenuOption::Thinking => app.ui.set_status("Thinking mode enabled (simulation)"),
            }
            Vec::new()
        }
        AppAction::CancelFilePath => {
            app.ui.leave_file_path_mode();
            Vec::new()
        }
        AppAction::InsertIntoInput { text } => {
            app.ui.apply_textarea_edit(|ta| {
                ta.insert_str(text);
            });
            Vec::new()
        }
        AppAction::ClearInput => {
            app.ui.clear_input();
            Vec::new()
        }
        AppAction::FillSuggestion { index } => {
            if app.ui.get_input_text().is_empty() {
                if let Some(suggestion) = SUGGESTIONS.get(index) {
                    app.ui.set_input_text(suggestion.to_string());
                }
            }
            Vec::new()
        }
        AppAction::SetStatus { message } => {
            app.ui.set_status(message);
            Vec::new()
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            Vec::new()
        }
        AppAction::ScrollUp { lines } => {
            app.ui.scroll_from_bottom = app.ui.scroll_from_bottom.saturating_add(lines);
            Vec::new()
        }
        AppAction::ScrollDown { lines } => {
            app.ui.scroll_from_bottom = app.ui.scroll_from_bottom.saturating_sub(lines);
            Vec::new()
        }
        AppAction::ScrollPageUp => {
            app.ui.scroll_from_bottom = app.ui.scroll_from_bottom.saturating_add(page_size(ctx));
            Vec::new()
        }
        AppAction::ScrollPageDown => {
            app.ui.scroll_from_bottom = app.ui.scroll_from_bottom.saturating_sub(page_size(ctx));
            Vec::new()
        }
        AppAction::Logout => {
            info!("logout requested");
            app.start_new_chat();
            app.conversation.threads.clear();
            app.conversation.token.clear();
            app.logged_out = true;
            app.ui.exit_requested = true;
            vec![AppCommand::PersistLogout]
        }
        AppAction::Quit => {
            app.abandon_conversation();
            app.ui.exit_requested = true;
            Vec::new()
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

/// Chat area height minus the input box and borders.
fn page_size(ctx: AppActionContext) -> u16 {
    ctx.term_height.saturating_sub(6).max(1)
}
