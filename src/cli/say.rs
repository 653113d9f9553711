//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use tokio_util::sync::CancellationToken;

use crate::api::{BackendClient, ChatRequest};
use crate::core::app::title_from_prompt;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};

pub async fn run_say(
    client: &BackendClient,
    token: &str,
    provider: &str,
    thread: Option<String>,
    prompt: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: threadline say [--thread <id>] <prompt>");
        std::process::exit(1);
    }

    let thread_id = match thread.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => {
            let created = client
                .create_thread(token, &title_from_prompt(&prompt))
                .await?;
            eprintln!("Thread: {} ({})", created.id, created.title);
            created.id
        }
    };

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(StreamParams {
        client: client.clone(),
        token: token.to_string(),
        request: ChatRequest {
            prompt,
            thread_id,
            provider: provider.to_string(),
        },
        cancel_token: CancellationToken::new(),
        stream_id: 1,
    });

    let mut stdout = io::stdout();
    while let Some((message, _)) = rx.recv().await {
        match message {
            StreamMessage::Chunk(content) => {
                print!("{content}");
                stdout.flush()?;
            }
            StreamMessage::Error(err) => {
                println!();
                return Err(err.into());
            }
            StreamMessage::End => {
                println!();
                break;
            }
        }
    }
    Ok(())
}
