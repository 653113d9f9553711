#[cfg(test)]
use crate::api::BackendClient;
#[cfg(test)]
use crate::core::app::{App, UiState};

#[cfg(test)]
pub fn create_test_app() -> App {
    App::new(
        BackendClient::new("http://localhost:8000"),
        "test-token".to_string(),
        "openai".to_string(),
        UiState::new(true),
    )
}

/// A test app already looking at thread `thread_id`.
#[cfg(test)]
pub fn create_test_app_with_thread(thread_id: &str) -> App {
    let mut app = create_test_app();
    app.conversation.active_thread = Some(thread_id.to_string());
    app
}
