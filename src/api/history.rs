//! Normalisation of stored thread history.
//!
//! The history endpoint has shipped several payload shapes: the turns may be
//! wrapped in `{"chats": [...]}` or returned as a bare array, and each turn
//! has used more than one field name for either side of the exchange. This
//! module is the only place that knows about those variants; everything past
//! it sees [`Turn`] and [`Message`].

use serde_json::{Map, Value};
use tracing::warn;

use crate::core::message::Message;

/// Field names for the user side of a turn, highest priority first.
pub const USER_TEXT_FIELDS: &[&str] = &["query", "user_message", "prompt"];
/// Field names for the assistant side of a turn, highest priority first.
pub const ASSISTANT_TEXT_FIELDS: &[&str] = &["response", "ai_message", "result"];

/// One stored exchange, normalised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub query: String,
    pub response: String,
}

/// Return the first non-empty string among `fields`, or an empty string.
pub fn first_text(object: &Map<String, Value>, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn parse_history(payload: &Value) -> Vec<Turn> {
    let entries = match payload {
        Value::Object(map) => match map.get("chats") {
            Some(Value::Array(entries)) => entries,
            _ => {
                warn!("unexpected chat history format: object without a chats array");
                return Vec::new();
            }
        },
        Value::Array(entries) => entries,
        other => {
            warn!(kind = json_kind(other), "unexpected chat history format");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| Turn {
            query: first_text(entry, USER_TEXT_FIELDS),
            response: first_text(entry, ASSISTANT_TEXT_FIELDS),
        })
        .collect()
}

/// Flatten turns into transcript order: user then assistant, empty sides
/// omitted.
pub fn turns_to_messages(turns: &[Turn]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        if !turn.query.is_empty() {
            messages.push(Message::user(turn.query.clone()));
        }
        if !turn.response.is_empty() {
            messages.push(Message::assistant(turn.response.clone()));
        }
    }
    messages
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use serde_json::json;

    fn flatten(payload: Value) -> Vec<(Role, String)> {
        turns_to_messages(&parse_history(&payload))
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect()
    }

    #[test]
    fn wrapped_payload_yields_user_then_assistant() {
        let messages = flatten(json!({"chats": [{"query": "hi", "response": "hello"}]}));
        assert_eq!(
            messages,
            vec![
                (Role::User, "hi".to_string()),
                (Role::Assistant, "hello".to_string())
            ]
        );
    }

    #[test]
    fn empty_response_only_produces_user_message() {
        let messages = flatten(json!({"chats": [{"query": "hi", "response": ""}]}));
        assert_eq!(messages, vec![(Role::User, "hi".to_string())]);
    }

    #[test]
    fn bare_array_is_accepted() {
        let messages = flatten(json!([
            {"query": "one", "response": "1"},
            {"query": "two", "response": "2"}
        ]));
        let contents: Vec<_> = messages.iter().map(|(_, c)| c.as_str()).collect();
        assert_eq!(contents, ["one", "1", "two", "2"]);
    }

    #[test]
    fn alternate_field_names_are_used_in_priority_order() {
        let turns = parse_history(&json!([
            {"user_message": "from user_message", "ai_message": "from ai_message"},
            {"prompt": "from prompt", "result": "from result"},
            {"query": "", "prompt": "fallback prompt", "response": "primary", "result": "ignored"}
        ]));
        assert_eq!(
            turns,
            vec![
                Turn {
                    query: "from user_message".into(),
                    response: "from ai_message".into()
                },
                Turn {
                    query: "from prompt".into(),
                    response: "from result".into()
                },
                Turn {
                    query: "fallback prompt".into(),
                    response: "primary".into()
                },
            ]
        );
    }

    #[test]
    fn non_string_fields_and_non_object_entries_are_skipped() {
        let messages = flatten(json!({"chats": [
            {"query": 42, "response": "answer"},
            "garbage",
            {"query": null, "response": null}
        ]}));
        assert_eq!(messages, vec![(Role::Assistant, "answer".to_string())]);
    }

    #[test]
    fn unexpected_shapes_yield_no_turns() {
        assert!(parse_history(&json!({"history": []})).is_empty());
        assert!(parse_history(&json!("nope")).is_empty());
        assert!(parse_history(&Value::Null).is_empty());
    }
}
