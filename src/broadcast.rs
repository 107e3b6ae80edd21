use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::state::MessageLog;
use crate::types::{Message, MessageKind, SessionError, SubscriptionId};

/// Observer callback invoked with every accepted message.
///
/// Observers only read the delivered message; they must not call back into
/// the hub, which would deadlock on the log lock.
pub type Observer = Box<dyn Fn(&Message) + Send + Sync>;

/// Single entry point through which new messages enter the log and reach
/// subscribers.
///
/// The log's write lock is held across append and notification, so
/// concurrent publishes are serialized: log order is total and matches
/// notification order, and all notifications for one message complete
/// before the next publish appends.
pub struct BroadcastHub {
    log: RwLock<MessageLog>,
    subscribers: RwLock<HashMap<SubscriptionId, Observer>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            log: RwLock::new(MessageLog::new()),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register an observer. The returned handle can later be passed to
    /// `unsubscribe`.
    pub async fn subscribe(&self, observer: Observer) -> SubscriptionId {
        let handle = ulid::Ulid::new().to_string();
        self.subscribers
            .write()
            .await
            .insert(handle.clone(), observer);
        handle
    }

    /// Remove a subscription. No-op if the handle is unknown or already
    /// removed.
    pub async fn unsubscribe(&self, handle: &SubscriptionId) {
        self.subscribers.write().await.remove(handle);
    }

    /// Validate, append and deliver a new message.
    ///
    /// Accept-or-reject is atomic: a rejected message is neither appended
    /// nor delivered to any subscriber.
    pub async fn publish(
        &self,
        sender_id: &str,
        sender_name: &str,
        content: &str,
        kind: MessageKind,
    ) -> Result<Message, SessionError> {
        if content.trim().is_empty() {
            return Err(SessionError::InvalidMessage("content must not be empty"));
        }
        if sender_id.is_empty() {
            return Err(SessionError::InvalidMessage("sender id must not be empty"));
        }

        let mut log = self.log.write().await;

        // The wall clock can step backwards between publishes; clamp so
        // the log stays non-decreasing in timestamp.
        let mut timestamp = Utc::now();
        if let Some(last) = log.last() {
            if timestamp < last.timestamp {
                timestamp = last.timestamp;
            }
        }

        let message = Message {
            id: ulid::Ulid::new().to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            timestamp,
            kind,
        };

        log.append(message.clone())?;

        let subscribers = self.subscribers.read().await;
        for observer in subscribers.values() {
            observer(&message);
        }

        Ok(message)
    }

    /// Snapshot of the full history in append order.
    pub async fn messages(&self) -> Vec<Message> {
        self.log.read().await.all().to_vec()
    }

    /// Number of logged messages matching the predicate.
    pub async fn message_count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Message) -> bool,
    {
        self.log.read().await.count(predicate)
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub(crate) async fn clear_log(&self) {
        self.log.write().await.clear();
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
