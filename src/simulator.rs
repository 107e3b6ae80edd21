use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::broadcast::BroadcastHub;
use crate::config::SessionConfig;
use crate::state::Roster;
use crate::types::{MessageKind, UserId};

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct Inner {
    hub: Arc<BroadcastHub>,
    roster: Arc<RwLock<Roster>>,
    local_user_id: UserId,
    config: SessionConfig,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

/// Periodic generator of synthetic inbound traffic.
///
/// Every tick picks one online user other than the local one and one
/// phrase from the pool, both uniformly at random, and publishes through
/// the hub. Repeats across ticks are allowed.
pub struct TrafficSimulator {
    inner: Arc<Inner>,
    running: Mutex<Option<RunningTask>>,
}

impl TrafficSimulator {
    pub fn new(
        hub: Arc<BroadcastHub>,
        roster: Arc<RwLock<Roster>>,
        local_user_id: UserId,
        config: SessionConfig,
    ) -> Self {
        Self::with_rng(
            hub,
            roster,
            local_user_id,
            config,
            Box::new(StdRng::from_os_rng()),
        )
    }

    /// Like `new` but with a caller-supplied randomness source, so tests
    /// can seed the selection sequence.
    pub fn with_rng(
        hub: Arc<BroadcastHub>,
        roster: Arc<RwLock<Roster>>,
        local_user_id: UserId,
        config: SessionConfig,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                hub,
                roster,
                local_user_id,
                config,
                rng: Mutex::new(rng),
            }),
            running: Mutex::new(None),
        }
    }

    /// Begin ticking on the configured period. No-op when already running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let period = inner.config.tick_period;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => inner.tick_once().await,
                    _ = stop_rx.changed() => break,
                }
            }
        });

        *running = Some(RunningTask { stop_tx, handle });
        tracing::info!(period_secs = period.as_secs(), "traffic simulator started");
    }

    /// Halt ticking. After this returns no further tick is scheduled.
    /// No-op when already stopped.
    pub async fn stop(&self) {
        let Some(task) = self.running.lock().await.take() else {
            return;
        };
        let _ = task.stop_tx.send(true);
        task.handle.abort();
        tracing::info!("traffic simulator stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run a single simulation step immediately, outside the timer.
    pub async fn tick_once(&self) {
        self.inner.tick_once().await;
    }
}

impl Inner {
    /// One simulation step: pick an online peer and a phrase, publish.
    ///
    /// Skips silently when no one else is online or the pool is empty; a
    /// rejected publish is logged and implicitly retried next tick.
    async fn tick_once(&self) {
        let candidates = self
            .roster
            .read()
            .await
            .online_excluding(&self.local_user_id);
        if candidates.is_empty() {
            tracing::debug!("no online peers, skipping tick");
            return;
        }
        if self.config.phrase_pool.is_empty() {
            tracing::debug!("phrase pool is empty, skipping tick");
            return;
        }

        let (sender, phrase) = {
            let mut rng = self.rng.lock().await;
            let sender = candidates[rng.random_range(0..candidates.len())].clone();
            let phrase =
                self.config.phrase_pool[rng.random_range(0..self.config.phrase_pool.len())].clone();
            (sender, phrase)
        };

        if let Err(e) = self
            .hub
            .publish(&sender.id, &sender.username, &phrase, MessageKind::Text)
            .await
        {
            tracing::warn!(sender_id = %sender.id, "synthetic message rejected: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use std::collections::HashSet;
    use std::time::Duration;

    fn seeded_roster() -> Arc<RwLock<Roster>> {
        let mut roster = Roster::new();
        roster.seed(vec![
            User::new("u0", "Ann", true),
            User::new("1", "Alice", true),
            User::new("2", "Bob", false),
            User::new("3", "Diana", true),
        ]);
        Arc::new(RwLock::new(roster))
    }

    fn simulator(
        hub: Arc<BroadcastHub>,
        roster: Arc<RwLock<Roster>>,
        config: SessionConfig,
    ) -> TrafficSimulator {
        TrafficSimulator::with_rng(
            hub,
            roster,
            "u0".to_string(),
            config,
            Box::new(StdRng::seed_from_u64(42)),
        )
    }

    /// Let a freshly spawned timer register, move the clock, then let the
    /// woken task run.
    async fn advance(duration: Duration) {
        tokio::task::yield_now().await;
        tokio::time::advance(duration).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_tick_selects_online_peers_only() {
        let hub = Arc::new(BroadcastHub::new());
        let sim = simulator(Arc::clone(&hub), seeded_roster(), SessionConfig::default());

        for _ in 0..50 {
            sim.tick_once().await;
        }

        let history = hub.messages().await;
        assert_eq!(history.len(), 50);

        let pool: HashSet<_> = SessionConfig::default().phrase_pool.into_iter().collect();
        let mut senders = HashSet::new();
        for msg in &history {
            assert_ne!(msg.sender_id, "u0");
            assert_ne!(msg.sender_id, "2");
            assert_eq!(msg.kind, MessageKind::Text);
            assert!(pool.contains(&msg.content));
            senders.insert(msg.sender_id.clone());
        }
        // With 50 uniform draws both online peers show up
        assert_eq!(senders.len(), 2);
    }

    #[tokio::test]
    async fn test_tick_skips_when_no_candidates() {
        let hub = Arc::new(BroadcastHub::new());
        let mut roster = Roster::new();
        roster.seed(vec![
            User::new("u0", "Ann", true),
            User::new("2", "Bob", false),
        ]);
        let sim = simulator(
            Arc::clone(&hub),
            Arc::new(RwLock::new(roster)),
            SessionConfig::default(),
        );

        sim.tick_once().await;

        assert!(hub.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_publish_does_not_kill_the_simulator() {
        let hub = Arc::new(BroadcastHub::new());
        let config = SessionConfig {
            phrase_pool: vec!["   ".to_string()],
            ..SessionConfig::default()
        };
        let sim = simulator(Arc::clone(&hub), seeded_roster(), config);

        sim.tick_once().await;
        sim.tick_once().await;

        assert!(hub.messages().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_on_period() {
        let hub = Arc::new(BroadcastHub::new());
        let sim = simulator(Arc::clone(&hub), seeded_roster(), SessionConfig::default());

        sim.start().await;
        assert!(sim.is_running().await);

        advance(Duration::from_secs(7)).await;
        assert!(hub.messages().await.is_empty());

        advance(Duration::from_secs(1)).await;
        assert_eq!(hub.messages().await.len(), 1);

        advance(Duration::from_secs(8)).await;
        assert_eq!(hub.messages().await.len(), 2);

        sim.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_ticks_once_per_period() {
        let hub = Arc::new(BroadcastHub::new());
        let sim = simulator(Arc::clone(&hub), seeded_roster(), SessionConfig::default());

        sim.start().await;
        sim.start().await;

        advance(Duration::from_secs(8)).await;

        assert_eq!(hub.messages().await.len(), 1);
        sim.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let hub = Arc::new(BroadcastHub::new());
        let sim = simulator(Arc::clone(&hub), seeded_roster(), SessionConfig::default());

        sim.start().await;
        advance(Duration::from_secs(8)).await;
        assert_eq!(hub.messages().await.len(), 1);

        sim.stop().await;
        assert!(!sim.is_running().await);
        // Idempotent
        sim.stop().await;

        advance(Duration::from_secs(8)).await;
        advance(Duration::from_secs(8)).await;
        advance(Duration::from_secs(8)).await;
        assert_eq!(hub.messages().await.len(), 1);
    }
}
