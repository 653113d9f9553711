use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{BackendClient, ChatRequest, ChunkStream, GatewayError};

/// What a running chat stream reports back to the event loop.
///
/// These are the chunk, failure, and completion callbacks of a chat turn,
/// delivered as channel messages tagged with the stream id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

#[derive(Debug)]
pub struct StreamParams {
    pub client: BackendClient,
    pub token: String,
    pub request: ChatRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                token,
                request,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream cancelled");
                }
                _ = async {
                    match client.chat_stream(&token, &request).await {
                        Ok(chunks) => forward_chunks(chunks, &tx, stream_id, &cancel_token).await,
                        Err(err) => report_failure(&tx, stream_id, &err),
                    }
                } => {}
            }
        });
    }
}

async fn forward_chunks(
    mut chunks: ChunkStream,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
    cancel_token: &CancellationToken,
) {
    while let Some(chunk) = chunks.next().await {
        if cancel_token.is_cancelled() {
            return;
        }
        match chunk {
            Ok(text) => {
                let _ = tx.send((StreamMessage::Chunk(text), stream_id));
            }
            Err(err) => {
                report_failure(tx, stream_id, &err);
                return;
            }
        }
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}

fn report_failure(
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
    err: &GatewayError,
) {
    warn!(stream_id, error = %err, "chat stream failed");
    let _ = tx.send((StreamMessage::Error(err.to_string()), stream_id));
    let _ = tx.send((StreamMessage::End, stream_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server::{serve, CannedResponse};

    fn params(base_url: &str, stream_id: u64, cancel_token: CancellationToken) -> StreamParams {
        StreamParams {
            client: BackendClient::new(base_url),
            token: "tok".into(),
            request: ChatRequest {
                prompt: "hi".into(),
                thread_id: "t1".into(),
                provider: "openai".into(),
            },
            cancel_token,
            stream_id,
        }
    }

    async fn collect(
        rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    ) -> Vec<(StreamMessage, u64)> {
        let mut received = Vec::new();
        while let Some(message) = rx.recv().await {
            let done = matches!(message.0, StreamMessage::End);
            received.push(message);
            if done {
                break;
            }
        }
        received
    }

    #[tokio::test]
    async fn forwards_chunks_then_end() {
        let (base_url, _) =
            serve(vec![CannedResponse::text_chunks("200 OK", &[b"Hello", b", world"])]).await;
        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(params(&base_url, 7, CancellationToken::new()));

        let received = collect(&mut rx).await;
        assert!(received.iter().all(|(_, id)| *id == 7));
        let text: String = received
            .iter()
            .filter_map(|(message, _)| match message {
                StreamMessage::Chunk(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Hello, world");
        assert_eq!(received.last().map(|(m, _)| m), Some(&StreamMessage::End));
    }

    #[tokio::test]
    async fn status_failure_reports_error_then_end() {
        let (base_url, _) = serve(vec![CannedResponse::json(
            "500 Internal Server Error",
            serde_json::json!({"detail": "model unavailable"}),
        )])
        .await;
        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(params(&base_url, 3, CancellationToken::new()));

        let received = collect(&mut rx).await;
        assert_eq!(
            received,
            vec![
                (StreamMessage::Error("model unavailable".into()), 3),
                (StreamMessage::End, 3)
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_stream_reports_nothing() {
        let (service, mut rx) = ChatStreamService::new();
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();
        service.spawn_stream(params("http://10.255.255.1:9", 1, cancel_token));
        drop(service);

        let outcome = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv()).await;
        match outcome {
            Ok(None) => {}
            Ok(Some(message)) => panic!("unexpected message from cancelled stream: {message:?}"),
            Err(_) => panic!("channel should close once the cancelled task exits"),
        }
    }
}
