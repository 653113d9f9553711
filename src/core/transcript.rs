//! Ordered conversation transcript.
//!
//! Insertion order is presentation order. Entries that are patched after
//! insertion carry a [`MessageId`]; every later update addresses the entry by
//! that id and never by index, so list mutations between updates (history
//! reloads, appended errors) cannot redirect a patch to the wrong entry.

use crate::core::message::{Message, MessageId, Role};

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append an entry tagged with a fresh correlation id and return the id.
    pub fn push_tracked(&mut self, role: Role, content: impl Into<String>) -> MessageId {
        let id = self.allocate_id();
        self.messages.push(Message::new(role, content).with_id(id));
        id
    }

    /// Replace the content of the entry tagged `id`.
    ///
    /// Returns `false` when no entry carries the id (for example after the
    /// transcript was replaced by a history load).
    pub fn set_content(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == Some(id)) {
            Some(message) => {
                message.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == Some(id))
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.get(id).is_some()
    }

    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    // Ids keep increasing across clears so a stale id can never match a
    // newer entry.
    fn allocate_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_ids_are_unique_and_ordered() {
        let mut transcript = Transcript::new();
        let a = transcript.push_tracked(Role::Assistant, "");
        let b = transcript.push_tracked(Role::Assistant, "");
        assert_ne!(a, b);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].id, Some(a));
        assert_eq!(transcript.messages()[1].id, Some(b));
    }

    #[test]
    fn set_content_targets_the_tagged_entry_after_reordering_mutations() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("hi"));
        let id = transcript.push_tracked(Role::Assistant, "");
        transcript.push(Message::error("unrelated"));

        assert!(transcript.set_content(id, "hello"));

        let contents: Vec<_> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["hi", "hello", "unrelated"]);
    }

    #[test]
    fn set_content_on_missing_id_is_a_no_op() {
        let mut transcript = Transcript::new();
        let id = transcript.push_tracked(Role::Assistant, "partial");
        transcript.replace_all(vec![Message::user("reloaded")]);

        assert!(!transcript.set_content(id, "late chunk"));
        assert_eq!(transcript.messages(), &[Message::user("reloaded")]);
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut transcript = Transcript::new();
        let first = transcript.push_tracked(Role::Assistant, "");
        transcript.clear();
        let second = transcript.push_tracked(Role::Assistant, "");
        assert_ne!(first, second);
        assert!(!transcript.contains(first));
    }
}
