use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type UserId = String;
pub type MessageId = String;
pub type SubscriptionId = String;

/// Reserved sender identity for messages emitted by the room itself
pub const SYSTEM_SENDER_ID: &str = "system";
pub const SYSTEM_SENDER_NAME: &str = "System";

/// A participant known to the session's roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_online: bool,
}

impl User {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, is_online: bool) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar: None,
            is_online,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    System,
}

/// A single chat message. Immutable once created.
///
/// `sender_id` is a lookup-only reference: the sender may be offline or
/// absent from the roster entirely (e.g. the reserved `"system"` sender).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }
}

/// Errors surfaced by session mutations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// Caller-input defect, never retried
    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),

    /// Mutation attempted on a session that has been stopped
    #[error("session is closed")]
    SessionClosed,
}
