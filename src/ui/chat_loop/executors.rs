//! Background work requested by the reducer.
//!
//! Every gateway call runs in its own task and reports back through the
//! action dispatcher, so the event loop never waits on the network.

use tracing::debug;

use crate::api::BackendClient;
use crate::core::app::{AppAction, AppActionContext, AppActionDispatcher, AppCommand};
use crate::core::chat_stream::ChatStreamService;

/// Commands that must run on the event loop itself.
#[derive(Debug, PartialEq, Eq)]
pub enum LocalCommand {
    PersistLogout,
}

pub struct CommandExecutor {
    dispatcher: AppActionDispatcher,
    stream_service: ChatStreamService,
}

impl CommandExecutor {
    pub fn new(dispatcher: AppActionDispatcher, stream_service: ChatStreamService) -> Self {
        Self {
            dispatcher,
            stream_service,
        }
    }

    /// Spawn the work for `command`, or hand it back when it has to run
    /// locally.
    pub fn execute(
        &self,
        client: &BackendClient,
        token: &str,
        command: AppCommand,
    ) -> Option<LocalCommand> {
        let client = client.clone();
        let token = token.to_string();
        let dispatcher = self.dispatcher.clone();

        match command {
            AppCommand::SpawnStream(params) => {
                debug!(stream_id = params.stream_id, "spawning chat stream");
                self.stream_service.spawn_stream(params);
            }
            AppCommand::CreateThread {
                title,
                purpose,
                epoch,
            } => {
                tokio::spawn(async move {
                    let action = match client.create_thread(&token, &title).await {
                        Ok(thread) => AppAction::ThreadCreated {
                            thread,
                            purpose,
                            epoch,
                        },
                        Err(err) => AppAction::ThreadCreateFailed {
                            message: err.to_string(),
                            purpose,
                            epoch,
                        },
                    };
                    dispatch(&dispatcher, action);
                });
            }
            AppCommand::FetchThreads => {
                tokio::spawn(async move {
                    let action = match client.list_threads(&token).await {
                        Ok(threads) => AppAction::ThreadsLoaded { threads },
                        Err(err) => AppAction::ThreadsLoadFailed {
                            message: err.to_string(),
                        },
                    };
                    dispatch(&dispatcher, action);
                });
            }
            AppCommand::FetchHistory { thread_id, epoch } => {
                tokio::spawn(async move {
                    let action = match client.thread_history(&token, &thread_id).await {
                        Ok(turns) => AppAction::HistoryLoaded { turns, epoch },
                        Err(err) => AppAction::HistoryLoadFailed {
                            message: err.to_string(),
                            epoch,
                        },
                    };
                    dispatch(&dispatcher, action);
                });
            }
            AppCommand::DeleteThread { thread_id } => {
                tokio::spawn(async move {
                    let action = match client.delete_thread(&token, &thread_id).await {
                        Ok(()) => AppAction::ThreadDeleted { thread_id },
                        Err(err) => AppAction::ThreadDeleteFailed {
                            thread_id,
                            message: err.to_string(),
                        },
                    };
                    dispatch(&dispatcher, action);
                });
            }
            AppCommand::RunSearch {
                query,
                placeholder,
                epoch,
            } => {
                tokio::spawn(async move {
                    let result = client
                        .web_search(&token, &query)
                        .await
                        .map_err(|err| err.to_string());
                    dispatch(
                        &dispatcher,
                        AppAction::SearchCompleted {
                            placeholder,
                            result,
                            epoch,
                        },
                    );
                });
            }
            AppCommand::UploadFile {
                thread_id,
                path,
                file_name,
                epoch,
            } => {
                tokio::spawn(async move {
                    let result = client
                        .upload_file(&token, &thread_id, &path)
                        .await
                        .map(|_| ())
                        .map_err(|err| err.to_string());
                    dispatch(
                        &dispatcher,
                        AppAction::UploadCompleted {
                            file_name,
                            result,
                            epoch,
                        },
                    );
                });
            }
            AppCommand::PersistLogout => return Some(LocalCommand::PersistLogout),
        }
        None
    }
}

fn dispatch(dispatcher: &AppActionDispatcher, action: AppAction) {
    dispatcher.dispatch_many([action], AppActionContext::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::test_server::{serve, CannedResponse};
    use crate::core::app::{AppActionEnvelope, ThreadPurpose};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn executor() -> (CommandExecutor, mpsc::UnboundedReceiver<AppActionEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stream_service, _stream_rx) = ChatStreamService::new();
        (
            CommandExecutor::new(AppActionDispatcher::new(tx), stream_service),
            rx,
        )
    }

    #[tokio::test]
    async fn create_thread_reports_created_thread_with_epoch() {
        let (base_url, _) = serve(vec![CannedResponse::json(
            "200 OK",
            json!({"id": 12, "title": "Plan a trip"}),
        )])
        .await;
        let (executor, mut rx) = executor();

        let local = executor.execute(
            &BackendClient::new(&base_url),
            "tok",
            AppCommand::CreateThread {
                title: "Plan a trip".into(),
                purpose: ThreadPurpose::Chat {
                    prompt: "Plan a trip".into(),
                },
                epoch: 3,
            },
        );
        assert!(local.is_none());

        let envelope = rx.recv().await.expect("action");
        match envelope.action {
            AppAction::ThreadCreated { thread, epoch, .. } => {
                assert_eq!(thread.id, "12");
                assert_eq!(epoch, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_delete_reports_thread_and_detail() {
        let (base_url, _) = serve(vec![CannedResponse::json(
            "404 Not Found",
            json!({"detail": "Thread not found"}),
        )])
        .await;
        let (executor, mut rx) = executor();

        executor.execute(
            &BackendClient::new(&base_url),
            "tok",
            AppCommand::DeleteThread {
                thread_id: "9".into(),
            },
        );

        match rx.recv().await.expect("action").action {
            AppAction::ThreadDeleteFailed { thread_id, message } => {
                assert_eq!(thread_id, "9");
                assert_eq!(message, "Thread not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn logout_is_returned_to_the_caller() {
        let (executor, _rx) = executor();
        let local = executor.execute(
            &BackendClient::new("http://localhost:8000"),
            "tok",
            AppCommand::PersistLogout,
        );
        assert_eq!(local, Some(LocalCommand::PersistLogout));
    }
}
