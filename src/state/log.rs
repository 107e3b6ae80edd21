use crate::types::{Message, SessionError};

/// Append-only chronological record of accepted messages.
///
/// Messages are appended at creation time and never reordered, edited or
/// deleted, so append order is chronological order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the end of the log.
    pub fn append(&mut self, message: Message) -> Result<(), SessionError> {
        if message.content.trim().is_empty() {
            return Err(SessionError::InvalidMessage("content must not be empty"));
        }
        if message.sender_id.is_empty() {
            return Err(SessionError::InvalidMessage("sender id must not be empty"));
        }
        self.messages.push(message);
        Ok(())
    }

    /// The full history in append order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages matching the predicate. Pure read.
    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Message) -> bool,
    {
        self.messages.iter().filter(|m| predicate(m)).count()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
