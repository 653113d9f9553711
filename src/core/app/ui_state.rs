use crate::core::config::Config;
use ratatui::style::{Modifier, Style};
use tui_textarea::{CursorMove, TextArea};

/// Prompts offered on the empty home screen, selectable with keys 1-4.
pub const SUGGESTIONS: [&str; 4] = [
    "Create a workout plan",
    "Explain quantum physics",
    "Write a python script",
    "Plan a trip to Japan",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Message,
    /// The input box holds a local path to upload.
    FilePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    AttachFile,
    WebSearch,
    Thinking,
}

impl MenuOption {
    pub const ALL: [MenuOption; 3] = [
        MenuOption::AttachFile,
        MenuOption::WebSearch,
        MenuOption::Thinking,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuOption::AttachFile => "Attach file",
            MenuOption::WebSearch => "Web search",
            MenuOption::Thinking => "Thinking",
        }
    }
}

pub struct UiState {
    textarea: TextArea<'static>,
    input: String,
    /// Draft set aside while the input box is in path-entry mode.
    stashed_draft: Option<String>,
    pub input_mode: InputMode,
    pub loading: bool,
    pub menu_open: bool,
    pub menu_selected: usize,
    pub search_mode: bool,
    pub sidebar_open: bool,
    pub focus: Focus,
    pub sidebar_selected: usize,
    pub pending_delete: Option<String>,
    pub status: Option<String>,
    /// Lines scrolled up from the bottom of the transcript; 0 follows new output.
    pub scroll_from_bottom: u16,
    pub markdown_enabled: bool,
    pub exit_requested: bool,
}

impl UiState {
    pub fn new(markdown_enabled: bool) -> Self {
        let mut state = Self {
            textarea: TextArea::default(),
            input: String::new(),
            stashed_draft: None,
            input_mode: InputMode::Message,
            loading: false,
            menu_open: false,
            menu_selected: 0,
            search_mode: false,
            sidebar_open: false,
            focus: Focus::Input,
            sidebar_selected: 0,
            pending_delete: None,
            status: None,
            scroll_from_bottom: 0,
            markdown_enabled,
            exit_requested: false,
        };
        state.configure_textarea();
        state
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.markdown())
    }

    fn configure_textarea(&mut self) {
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea
            .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn get_input_text(&self) -> &str {
        &self.input
    }

    pub fn set_input_text(&mut self, text: String) {
        self.input = text;
        let lines: Vec<String> = if self.input.is_empty() {
            Vec::new()
        } else {
            self.input.split('\n').map(|s| s.to_string()).collect()
        };
        self.textarea = TextArea::from(lines);
        if !self.input.is_empty() {
            let last_row = self.textarea.lines().len().saturating_sub(1) as u16;
            let last_col = self
                .textarea
                .lines()
                .last()
                .map(|l| l.chars().count() as u16)
                .unwrap_or(0);
            self.textarea
                .move_cursor(CursorMove::Jump(last_row, last_col));
        }
        self.configure_textarea();
    }

    pub fn clear_input(&mut self) {
        self.set_input_text(String::new());
    }

    pub fn sync_input_from_textarea(&mut self) {
        self.input = self.textarea.lines().join("\n");
    }

    /// Run an edit against the textarea and keep the cached text in step.
    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
        self.sync_input_from_textarea();
    }

    pub fn enter_file_path_mode(&mut self) {
        if self.input_mode == InputMode::FilePath {
            return;
        }
        let draft = std::mem::take(&mut self.input);
        self.stashed_draft = Some(draft).filter(|d| !d.is_empty());
        self.clear_input();
        self.input_mode = InputMode::FilePath;
    }

    pub fn leave_file_path_mode(&mut self) {
        if self.input_mode != InputMode::FilePath {
            return;
        }
        self.input_mode = InputMode::Message;
        let draft = self.stashed_draft.take().unwrap_or_default();
        self.set_input_text(draft);
    }

    pub fn selected_menu_option(&self) -> MenuOption {
        MenuOption::ALL[self.menu_selected.min(MenuOption::ALL.len() - 1)]
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn clamp_sidebar_selection(&mut self, thread_count: usize) {
        if thread_count == 0 {
            self.sidebar_selected = 0;
        } else if self.sidebar_selected >= thread_count {
            self.sidebar_selected = thread_count - 1;
        }
    }

    /// Input box title for the current mode.
    pub fn input_title(&self) -> &'static str {
        if self.input_mode == InputMode::FilePath {
            "Path of file to upload (Enter to send, Esc to cancel)"
        } else if self.loading {
            "Waiting for response (Esc to cancel)"
        } else if self.search_mode {
            "Search web (Esc to leave search mode)"
        } else {
            "Message (Enter to send, Shift+Enter for newline, Ctrl+O for options)"
        }
    }
}
