//! Backend wire payloads and the HTTP gateway.

pub mod client;
pub mod history;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use client::{BackendClient, ChunkStream, GatewayError, Utf8ChunkDecoder};
pub use history::{parse_history, turns_to_messages, Turn};

#[derive(Serialize, Debug, Clone)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewThreadRequest {
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ThreadsResponse {
    #[serde(default)]
    pub threads: Vec<ThreadSummary>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    pub thread_id: String,
    pub provider: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Ids have been issued both as strings and as integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thread_summary_accepts_numeric_ids_and_missing_title() {
        let thread: ThreadSummary = serde_json::from_value(json!({"id": 17})).expect("parse");
        assert_eq!(thread.id, "17");
        assert_eq!(thread.title, "");
    }

    #[test]
    fn threads_response_defaults_to_empty() {
        let response: ThreadsResponse = serde_json::from_value(json!({})).expect("parse");
        assert!(response.threads.is_empty());
    }

    #[test]
    fn login_response_accepts_numeric_user_id() {
        let response: LoginResponse =
            serde_json::from_value(json!({"access_token": "tok", "user_id": 5, "token_type": "bearer"}))
                .expect("parse");
        assert_eq!(
            response,
            LoginResponse {
                access_token: "tok".into(),
                user_id: "5".into()
            }
        );
    }

    #[test]
    fn chat_request_serializes_backend_field_names() {
        let request = ChatRequest {
            prompt: "hello".into(),
            thread_id: "t1".into(),
            provider: "openai".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({"prompt": "hello", "thread_id": "t1", "provider": "openai"})
        );
    }

    #[test]
    fn rejects_object_ids() {
        let result: Result<ThreadSummary, _> = serde_json::from_value(json!({"id": {"x": 1}}));
        assert!(result.is_err());
    }
}
