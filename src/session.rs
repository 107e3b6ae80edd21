use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::RngCore;
use tokio::sync::RwLock;

use crate::broadcast::BroadcastHub;
use crate::config::SessionConfig;
use crate::simulator::TrafficSimulator;
use crate::state::Roster;
use crate::types::{
    Message, MessageKind, SessionError, User, SYSTEM_SENDER_ID, SYSTEM_SENDER_NAME,
};

/// One participant's view of the room: roster, history, broadcast and
/// synthetic traffic composed into a unit that lives from login to logout.
pub struct Session {
    hub: Arc<BroadcastHub>,
    roster: Arc<RwLock<Roster>>,
    simulator: TrafficSimulator,
    local_user: User,
    closed: AtomicBool,
}

impl Session {
    /// Begin a session for the given local user: seed the roster, announce
    /// the welcome message, start synthetic traffic.
    ///
    /// The local user is always a roster member; it is inserted first when
    /// `peers` does not already contain it.
    pub async fn start(
        local_user: User,
        peers: Vec<User>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::start_inner(local_user, peers, config, None).await
    }

    /// Like `start` but with a caller-supplied randomness source for the
    /// traffic simulator.
    pub async fn start_with_rng(
        local_user: User,
        peers: Vec<User>,
        config: SessionConfig,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self, SessionError> {
        Self::start_inner(local_user, peers, config, Some(rng)).await
    }

    async fn start_inner(
        local_user: User,
        peers: Vec<User>,
        config: SessionConfig,
        rng: Option<Box<dyn RngCore + Send>>,
    ) -> Result<Self, SessionError> {
        let mut members = peers;
        if !members.iter().any(|u| u.id == local_user.id) {
            members.insert(0, local_user.clone());
        }

        let mut roster = Roster::new();
        roster.seed(members);

        let hub = Arc::new(BroadcastHub::new());
        let roster = Arc::new(RwLock::new(roster));

        let simulator = match rng {
            Some(rng) => TrafficSimulator::with_rng(
                Arc::clone(&hub),
                Arc::clone(&roster),
                local_user.id.clone(),
                config,
                rng,
            ),
            None => TrafficSimulator::new(
                Arc::clone(&hub),
                Arc::clone(&roster),
                local_user.id.clone(),
                config,
            ),
        };

        let session = Self {
            hub,
            roster,
            simulator,
            local_user,
            closed: AtomicBool::new(false),
        };

        session
            .hub
            .publish(
                SYSTEM_SENDER_ID,
                SYSTEM_SENDER_NAME,
                &format!("Welcome to ChatApp, {}!", session.local_user.username),
                MessageKind::System,
            )
            .await?;

        session.simulator.start().await;
        tracing::info!(user = %session.local_user.username, "session started");

        Ok(session)
    }

    /// Publish a text message from the local user.
    ///
    /// Trimming the input is the caller's job; blank content is still
    /// rejected here.
    pub async fn send_local_message(&self, content: &str) -> Result<Message, SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::SessionClosed);
        }
        self.hub
            .publish(
                &self.local_user.id,
                &self.local_user.username,
                content,
                MessageKind::Text,
            )
            .await
    }

    /// End the session: halt synthetic traffic and discard roster and
    /// history. Idempotent.
    pub async fn stop(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.simulator.stop().await;
        self.roster.write().await.clear();
        self.hub.clear_log().await;
        tracing::info!(user = %self.local_user.username, "session stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Roster snapshot in seed order.
    pub async fn users(&self) -> Vec<User> {
        self.roster.read().await.all().to_vec()
    }

    /// History snapshot in append order.
    pub async fn messages(&self) -> Vec<Message> {
        self.hub.messages().await
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn local_user(&self) -> &User {
        &self.local_user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> User {
        User::new("u0", "Ann", true)
    }

    #[tokio::test]
    async fn test_start_inserts_local_user_when_missing() {
        let session = Session::start(
            ann(),
            vec![User::new("1", "Alice", true)],
            SessionConfig::default(),
        )
        .await
        .unwrap();

        let users = session.users().await;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "u0");
        assert_eq!(users[1].id, "1");

        session.stop().await;
    }

    #[tokio::test]
    async fn test_start_keeps_given_roster_order_when_local_present() {
        let session = Session::start(
            ann(),
            vec![ann(), User::new("1", "Alice", true)],
            SessionConfig::default(),
        )
        .await
        .unwrap();

        let users = session.users().await;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, "u0");

        session.stop().await;
    }

    #[tokio::test]
    async fn test_start_publishes_welcome() {
        let session = Session::start(ann(), Vec::new(), SessionConfig::default())
            .await
            .unwrap();

        let messages = session.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::System);
        assert_eq!(messages[0].sender_id, SYSTEM_SENDER_ID);
        assert_eq!(messages[0].sender_name, SYSTEM_SENDER_NAME);
        assert_eq!(messages[0].content, "Welcome to ChatApp, Ann!");

        session.stop().await;
    }

    #[tokio::test]
    async fn test_send_after_stop_fails_closed() {
        let session = Session::start(ann(), Vec::new(), SessionConfig::default())
            .await
            .unwrap();

        session.stop().await;
        assert!(!session.is_running());

        let result = session.send_local_message("hi").await;
        assert_eq!(result, Err(SessionError::SessionClosed));
    }

    #[tokio::test]
    async fn test_stop_releases_state_and_is_idempotent() {
        let session = Session::start(
            ann(),
            vec![User::new("1", "Alice", true)],
            SessionConfig::default(),
        )
        .await
        .unwrap();
        session.send_local_message("hi").await.unwrap();

        session.stop().await;
        session.stop().await;

        assert!(session.users().await.is_empty());
        assert!(session.messages().await.is_empty());
    }
}
