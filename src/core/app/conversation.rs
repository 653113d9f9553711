use tokio_util::sync::CancellationToken;

use crate::api::{BackendClient, ChatRequest, ThreadSummary};
use crate::core::chat_stream::StreamParams;
use crate::core::message::MessageId;

/// Assistant reply currently being streamed into the transcript.
#[derive(Debug)]
pub struct StreamingTurn {
    pub placeholder: MessageId,
    /// Text received so far; written wholesale into the placeholder per chunk.
    pub accumulated: String,
}

/// Backend-facing state of the chat view.
pub struct ConversationState {
    pub client: BackendClient,
    pub token: String,
    pub provider: String,
    pub threads: Vec<ThreadSummary>,
    pub active_thread: Option<String>,
    /// Bumped whenever the visible conversation is abandoned; async results
    /// tagged with an older epoch are discarded.
    pub epoch: u64,
    pub current_stream_id: u64,
    pub stream_cancel_token: Option<CancellationToken>,
    pub streaming: Option<StreamingTurn>,
    pub pending_search: Option<MessageId>,
}

impl ConversationState {
    pub fn new(client: BackendClient, token: String, provider: String) -> Self {
        Self {
            client,
            token,
            provider,
            threads: Vec::new(),
            active_thread: None,
            epoch: 0,
            current_stream_id: 0,
            stream_cancel_token: None,
            streaming: None,
            pending_search: None,
        }
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.streaming.is_some() && self.current_stream_id == stream_id
    }

    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn start_new_stream(&mut self, placeholder: MessageId) -> (CancellationToken, u64) {
        self.cancel_current_stream();
        self.current_stream_id += 1;
        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        self.streaming = Some(StreamingTurn {
            placeholder,
            accumulated: String::new(),
        });
        (token, self.current_stream_id)
    }

    /// Stop the running stream, if any. Returns whether one was running.
    pub fn cancel_current_stream(&mut self) -> bool {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
        self.streaming.take().is_some()
    }

    /// Forget everything in flight for the visible conversation.
    pub fn abandon(&mut self) {
        self.cancel_current_stream();
        self.pending_search = None;
        self.epoch += 1;
    }

    pub fn build_stream_params(
        &self,
        thread_id: &str,
        prompt: &str,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) -> StreamParams {
        StreamParams {
            client: self.client.clone(),
            token: self.token.clone(),
            request: ChatRequest {
                prompt: prompt.to_string(),
                thread_id: thread_id.to_string(),
                provider: self.provider.clone(),
            },
            cancel_token,
            stream_id,
        }
    }

    pub fn thread_title(&self, thread_id: &str) -> Option<&str> {
        self.threads
            .iter()
            .find(|t| t.id == thread_id)
            .map(|t| t.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::new(
            BackendClient::new("http://localhost:8000"),
            "tok".into(),
            "openai".into(),
        )
    }

    #[test]
    fn new_stream_cancels_previous_one() {
        let mut state = state();
        let (first_token, first_id) = state.start_new_stream(MessageId(1));
        let (second_token, second_id) = state.start_new_stream(MessageId(2));

        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
        assert!(!state.is_current_stream(first_id));
        assert!(state.is_current_stream(second_id));
    }

    #[test]
    fn abandon_bumps_epoch_and_stops_stream() {
        let mut state = state();
        let (token, stream_id) = state.start_new_stream(MessageId(1));
        let epoch = state.epoch;

        state.abandon();

        assert!(token.is_cancelled());
        assert!(!state.is_current_stream(stream_id));
        assert!(!state.is_current_epoch(epoch));
    }

    #[test]
    fn stream_params_carry_provider_and_thread() {
        let state = state();
        let params = state.build_stream_params("t9", "hello", CancellationToken::new(), 4);
        assert_eq!(params.request.thread_id, "t9");
        assert_eq!(params.request.provider, "openai");
        assert_eq!(params.token, "tok");
        assert_eq!(params.stream_id, 4);
    }
}
