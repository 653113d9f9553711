//! Single-line terminal prompts for the login and signup commands.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

#[derive(Debug)]
pub enum PromptError {
    Cancelled,
    Terminal(io::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Cancelled => write!(f, "Cancelled by user"),
            PromptError::Terminal(err) => write!(f, "Terminal error: {err}"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Cancelled => None,
            PromptError::Terminal(err) => Some(err),
        }
    }
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::Terminal(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptState {
    pub text: String,
    /// Cursor position in chars.
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEdit {
    Insert(char),
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveStart,
    MoveEnd,
    ClearAll,
    Paste(String),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Continue,
    Submit(String),
    Cancelled,
}

/// Tabs become spaces, carriage returns become newlines, other control
/// characters are dropped.
pub fn sanitize_pasted_text(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    for c in text.replace("\r\n", "\n").chars() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\r' => sanitized.push('\n'),
            '\n' => sanitized.push(c),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }
    sanitized
}

/// Read one line from the terminal. With `masked`, typed characters echo
/// as `*`.
pub fn prompt_line(label: &str, masked: bool) -> Result<String, PromptError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, event::EnableBracketedPaste) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }

    let result = read_until_submit(label, masked);

    let restore_raw = disable_raw_mode();
    let restore_paste = execute!(stdout, event::DisableBracketedPaste);
    println!();

    let value = result?;
    restore_raw?;
    restore_paste?;
    Ok(value)
}

fn read_until_submit(label: &str, masked: bool) -> Result<String, PromptError> {
    let mut state = PromptState::default();
    redraw(label, &state, masked)?;
    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let edit = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key_to_edit(&key),
            Event::Paste(text) => Some(PromptEdit::Paste(sanitize_pasted_text(&text))),
            _ => None,
        };
        let Some(edit) = edit else {
            continue;
        };
        match apply_prompt_edit(&mut state, edit) {
            PromptOutcome::Continue => redraw(label, &state, masked)?,
            PromptOutcome::Submit(value) => return Ok(value),
            PromptOutcome::Cancelled => return Err(PromptError::Cancelled),
        }
    }
}

fn redraw(label: &str, state: &PromptState, masked: bool) -> io::Result<()> {
    let shown = display_text(state, masked);
    let before_cursor: String = shown.chars().take(state.cursor).collect();
    let column = UnicodeWidthStr::width(label) + UnicodeWidthStr::width(before_cursor.as_str());

    print!("\r\x1b[K{label}{shown}");
    if column > 0 {
        print!("\r\x1b[{column}C");
    } else {
        print!("\r");
    }
    io::stdout().flush()
}

fn display_text(state: &PromptState, masked: bool) -> String {
    if masked {
        "*".repeat(state.text.chars().count())
    } else {
        state.text.clone()
    }
}

pub fn map_key_to_edit(key: &KeyEvent) -> Option<PromptEdit> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(PromptEdit::Submit),
        KeyCode::Esc => Some(PromptEdit::Cancel),
        KeyCode::Backspace => Some(PromptEdit::Backspace),
        KeyCode::Delete => Some(PromptEdit::Delete),
        KeyCode::Left => Some(PromptEdit::MoveLeft),
        KeyCode::Right => Some(PromptEdit::MoveRight),
        KeyCode::Home => Some(PromptEdit::MoveStart),
        KeyCode::End => Some(PromptEdit::MoveEnd),
        KeyCode::Char('c') if ctrl => Some(PromptEdit::Cancel),
        KeyCode::Char('a') if ctrl => Some(PromptEdit::MoveStart),
        KeyCode::Char('e') if ctrl => Some(PromptEdit::MoveEnd),
        KeyCode::Char('u') if ctrl => Some(PromptEdit::ClearAll),
        KeyCode::Char(c) if !ctrl => Some(PromptEdit::Insert(c)),
        _ => None,
    }
}

pub fn apply_prompt_edit(state: &mut PromptState, edit: PromptEdit) -> PromptOutcome {
    match edit {
        PromptEdit::Insert(c) => {
            let at = byte_index(&state.text, state.cursor);
            state.text.insert(at, c);
            state.cursor += 1;
        }
        PromptEdit::Backspace => {
            if state.cursor > 0 {
                let start = byte_index(&state.text, state.cursor - 1);
                let end = byte_index(&state.text, state.cursor);
                state.text.replace_range(start..end, "");
                state.cursor -= 1;
            }
        }
        PromptEdit::Delete => {
            let start = byte_index(&state.text, state.cursor);
            if start < state.text.len() {
                let end = byte_index(&state.text, state.cursor + 1);
                state.text.replace_range(start..end, "");
            }
        }
        PromptEdit::MoveLeft => state.cursor = state.cursor.saturating_sub(1),
        PromptEdit::MoveRight => {
            state.cursor = (state.cursor + 1).min(state.text.chars().count());
        }
        PromptEdit::MoveStart => state.cursor = 0,
        PromptEdit::MoveEnd => state.cursor = state.text.chars().count(),
        PromptEdit::ClearAll => {
            state.text.clear();
            state.cursor = 0;
        }
        PromptEdit::Paste(text) => {
            // A pasted newline submits what came before it.
            let first_line = text.split('\n').next().unwrap_or("");
            let at = byte_index(&state.text, state.cursor);
            state.text.insert_str(at, first_line);
            state.cursor += first_line.chars().count();
            if text.contains('\n') {
                return PromptOutcome::Submit(state.text.clone());
            }
        }
        PromptEdit::Submit => return PromptOutcome::Submit(state.text.clone()),
        PromptEdit::Cancel => return PromptOutcome::Cancelled,
    }
    PromptOutcome::Continue
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(text: &str) -> PromptState {
        PromptState {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    #[test]
    fn insert_respects_cursor() {
        let mut state = PromptState::default();
        apply_prompt_edit(&mut state, PromptEdit::Insert('a'));
        apply_prompt_edit(&mut state, PromptEdit::MoveLeft);
        apply_prompt_edit(&mut state, PromptEdit::Insert('é'));
        assert_eq!(state.text, "éa");
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn backspace_and_delete_handle_multibyte_chars() {
        let mut state = state_with("añb");
        apply_prompt_edit(&mut state, PromptEdit::MoveLeft);
        apply_prompt_edit(&mut state, PromptEdit::Backspace);
        assert_eq!(state.text, "ab");
        apply_prompt_edit(&mut state, PromptEdit::MoveStart);
        apply_prompt_edit(&mut state, PromptEdit::Delete);
        assert_eq!(state.text, "b");
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn paste_with_newline_submits_first_line() {
        let mut state = state_with("pass");
        let outcome = apply_prompt_edit(&mut state, PromptEdit::Paste("word\nignored".into()));
        assert_eq!(outcome, PromptOutcome::Submit("password".to_string()));
    }

    #[test]
    fn masked_display_hides_every_char() {
        let state = state_with("hunter2");
        assert_eq!(display_text(&state, true), "*******");
        assert_eq!(display_text(&state, false), "hunter2");
    }

    #[test]
    fn control_keys_map_to_edits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(map_key_to_edit(&ctrl_c), Some(PromptEdit::Cancel));
        assert_eq!(map_key_to_edit(&plain_c), Some(PromptEdit::Insert('c')));
        assert_eq!(map_key_to_edit(&ctrl_u), Some(PromptEdit::ClearAll));
    }

    #[test]
    fn sanitize_drops_control_characters() {
        assert_eq!(sanitize_pasted_text("a\tb\r\x07c"), "a    b\nc");
    }
}
