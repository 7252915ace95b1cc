//! crates/resume_tailor_core/src/message_log.rs
//!
//! The ordered record of exchanged turns.

use crate::domain::Message;

/// Append-only conversation log.
///
/// The single permitted mutation is replacing the most recent placeholder
/// ("thinking...") with the real answer. Any other `replace_at` is refused.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    placeholder: Option<usize>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its position.
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Appends a transient message that a later answer may replace.
    pub fn append_placeholder(&mut self, message: Message) -> usize {
        let position = self.append(message);
        self.placeholder = Some(position);
        position
    }

    /// Replaces the placeholder at `position`. Returns `false`, leaving the
    /// log untouched, if `position` is not the current placeholder slot.
    pub fn replace_at(&mut self, position: usize, message: Message) -> bool {
        if self.placeholder != Some(position) {
            return false;
        }
        match self.messages.get_mut(position) {
            Some(slot) => {
                *slot = message;
                self.placeholder = None;
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.placeholder = None;
    }
}
