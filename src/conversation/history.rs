//! Ordered message log replayed to the active backend

use super::{Message, Role};

/// Conversation history
///
/// Element 0 is always the system message. It can be replaced but never
/// removed; every other message is appended in turn order.
#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Start a history with the given system prompt
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Append a message
    ///
    /// System messages are only accepted through [`History::replace_system`].
    pub fn push(&mut self, message: Message) {
        debug_assert!(message.role != Role::System, "system message must stay at index 0");
        self.messages.push(message);
    }

    /// Replace the content of message 0 wholesale
    pub fn replace_system(&mut self, system_prompt: impl Into<String>) {
        self.messages[0] = Message::system(system_prompt);
    }

    /// Drop everything except the system message
    pub fn truncate_to_system(&mut self) {
        self.messages.truncate(1);
    }

    /// Current system prompt text
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.messages[0].text()
    }

    /// All messages, system message first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message
    #[must_use]
    pub fn last(&self) -> &Message {
        // never empty: index 0 always exists
        &self.messages[self.messages.len() - 1]
    }

    /// Number of messages including the system message
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history has no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
