//! Chat view-model.
//!
//! [`App`] owns everything the chat screen shows. Key presses and finished
//! backend calls both arrive as [`AppAction`]s; reducing an action mutates the
//! state and may yield [`AppCommand`]s, which the UI layer executes and whose
//! outcomes come back as further actions.

use crate::api::BackendClient;
use crate::core::config::Config;
use crate::core::transcript::Transcript;

pub mod actions;
pub mod conversation;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand, ThreadPurpose,
};
pub use conversation::{ConversationState, StreamingTurn};
pub use ui_state::{Focus, InputMode, MenuOption, UiState, SUGGESTIONS};

pub const SEARCH_PLACEHOLDER: &str = "Searching the web...";
pub const SEARCH_FALLBACK: &str = "No results found.";
pub const STREAM_FAILED_MESSAGE: &str = "Error: Failed to get response.";
pub const REQUEST_FAILED_MESSAGE: &str = "Error: Request failed.";
pub const SEARCH_FAILED_MESSAGE: &str = "Web search failed.";
pub const HISTORY_FAILED_MESSAGE: &str = "Failed to load chat history.";
pub const UPLOAD_THREAD_TITLE: &str = "New Chat (File)";
const TITLE_CHARS: usize = 30;

pub struct App {
    pub conversation: ConversationState,
    pub transcript: Transcript,
    pub ui: UiState,
    /// Set once the user asked to log out; the session is cleared on exit.
    pub logged_out: bool,
}

impl App {
    pub fn new(client: BackendClient, token: String, provider: String, ui: UiState) -> Self {
        Self {
            conversation: ConversationState::new(client, token, provider),
            transcript: Transcript::new(),
            ui,
            logged_out: false,
        }
    }

    pub fn from_config(
        config: &Config,
        client: BackendClient,
        token: String,
        provider: String,
    ) -> Self {
        Self::new(client, token, provider, UiState::from_config(config))
    }

    /// No thread selected and nothing said yet.
    pub fn is_home(&self) -> bool {
        self.conversation.active_thread.is_none() && self.transcript.is_empty()
    }

    pub fn is_streaming(&self) -> bool {
        self.conversation.streaming.is_some()
    }

    pub fn selected_thread_id(&self) -> Option<&str> {
        self.conversation
            .threads
            .get(self.ui.sidebar_selected)
            .map(|t| t.id.as_str())
    }

    /// Drop the visible conversation and return to the home screen.
    pub fn start_new_chat(&mut self) {
        self.abandon_conversation();
        self.transcript.clear();
        self.conversation.active_thread = None;
    }

    /// Stop everything in flight for the visible conversation.
    pub(crate) fn abandon_conversation(&mut self) {
        if self.conversation.pending_search.is_some() {
            self.ui.search_mode = false;
        }
        self.conversation.abandon();
        self.ui.loading = false;
        self.ui.scroll_to_bottom();
    }
}

/// Thread title derived from the opening prompt.
pub fn title_from_prompt(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
