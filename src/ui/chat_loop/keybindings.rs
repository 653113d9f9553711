//! Key event resolution.
//!
//! Keys are resolved against a [`KeyContext`] derived from the app state.
//! Anything not bound in the current context falls through to the input
//! textarea.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{App, AppAction, Focus, InputMode, SUGGESTIONS};

/// Which part of the screen currently owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Menu,
    ConfirmDelete,
    Sidebar,
    Typing,
}

impl KeyContext {
    pub fn from_app(app: &App) -> Self {
        if app.ui.menu_open {
            KeyContext::Menu
        } else if app.ui.pending_delete.is_some() {
            KeyContext::ConfirmDelete
        } else if app.ui.sidebar_open && app.ui.focus == Focus::Sidebar {
            KeyContext::Sidebar
        } else {
            KeyContext::Typing
        }
    }
}

#[derive(Debug)]
pub enum KeyResult {
    Actions(Vec<AppAction>),
    /// Forward the key to the input textarea.
    EditInput,
    Ignored,
}

fn actions(list: impl IntoIterator<Item = AppAction>) -> KeyResult {
    KeyResult::Actions(list.into_iter().collect())
}

pub fn resolve_key(app: &App, key: &KeyEvent) -> KeyResult {
    if let Some(result) = resolve_global(key) {
        return result;
    }
    if key.code == KeyCode::Esc {
        return resolve_escape(app);
    }

    match KeyContext::from_app(app) {
        KeyContext::Menu => resolve_menu(app, key),
        KeyContext::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => actions([AppAction::ConfirmDelete]),
            _ => actions([AppAction::CancelDelete]),
        },
        KeyContext::Sidebar => resolve_sidebar(key),
        KeyContext::Typing => resolve_typing(app, key),
    }
}

fn resolve_global(key: &KeyEvent) -> Option<KeyResult> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::PageUp => Some(actions([AppAction::ScrollPageUp])),
            KeyCode::PageDown => Some(actions([AppAction::ScrollPageDown])),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Char('c') => AppAction::Quit,
        KeyCode::Char('l') => AppAction::Logout,
        KeyCode::Char('n') => AppAction::NewChat,
        KeyCode::Char('b') => AppAction::ToggleSidebar,
        KeyCode::Char('o') => AppAction::ToggleMenu,
        KeyCode::Char('r') => AppAction::LoadThreads,
        _ => return None,
    };
    Some(actions([action]))
}

/// Esc unwinds the innermost mode first.
fn resolve_escape(app: &App) -> KeyResult {
    let action = if app.ui.menu_open {
        AppAction::ToggleMenu
    } else if app.ui.pending_delete.is_some() {
        AppAction::CancelDelete
    } else if app.ui.input_mode == InputMode::FilePath {
        AppAction::CancelFilePath
    } else if app.ui.search_mode && app.conversation.pending_search.is_none() {
        AppAction::SetSearchMode { enabled: false }
    } else if app.is_streaming() {
        AppAction::CancelStreaming
    } else if app.ui.focus == Focus::Sidebar {
        AppAction::ToggleFocus
    } else if app.ui.status.is_some() {
        AppAction::ClearStatus
    } else {
        return KeyResult::Ignored;
    };
    actions([action])
}

fn resolve_menu(app: &App, key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Up => actions([AppAction::MenuMoveUp]),
        KeyCode::Down | KeyCode::Tab => actions([AppAction::MenuMoveDown]),
        KeyCode::Enter => actions([AppAction::SelectMenuOption {
            option: app.ui.selected_menu_option(),
        }]),
        _ => KeyResult::Ignored,
    }
}

fn resolve_sidebar(key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => actions([AppAction::SidebarMoveUp]),
        KeyCode::Down | KeyCode::Char('j') => actions([AppAction::SidebarMoveDown]),
        KeyCode::Enter => actions([AppAction::SidebarActivate]),
        KeyCode::Delete | KeyCode::Char('d') => actions([AppAction::RequestDeleteSelected]),
        KeyCode::Tab => actions([AppAction::ToggleFocus]),
        _ => KeyResult::Ignored,
    }
}

fn resolve_typing(app: &App, key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            KeyResult::EditInput
        }
        KeyCode::Enter => actions([AppAction::SubmitMessage {
            message: app.ui.get_input_text().to_string(),
        }]),
        KeyCode::Tab if app.ui.sidebar_open => actions([AppAction::ToggleFocus]),
        KeyCode::Char(c) if key.modifiers.is_empty() => match suggestion_index(app, c) {
            Some(index) => actions([AppAction::FillSuggestion { index }]),
            None => KeyResult::EditInput,
        },
        _ => KeyResult::EditInput,
    }
}

/// Digits 1-4 pick a suggestion on the empty home screen.
fn suggestion_index(app: &App, c: char) -> Option<usize> {
    if !app.is_home()
        || app.ui.input_mode != InputMode::Message
        || !app.ui.get_input_text().is_empty()
    {
        return None;
    }
    let digit = c.to_digit(10)? as usize;
    (1..=SUGGESTIONS.len())
        .contains(&digit)
        .then_some(digit - 1)
}
