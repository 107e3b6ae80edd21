use std::time::Duration;

/// Seconds between synthetic messages unless overridden.
pub const DEFAULT_TICK_SECONDS: u64 = 8;

/// Stock phrase pool for simulated traffic.
pub const DEFAULT_PHRASES: &[&str] = &[
    "Hey everyone! 👋",
    "How are you doing today?",
    "Anyone working on something interesting?",
    "The weather is great today!",
    "Just finished a great project 🎉",
    "Coffee break time! ☕",
    "What's everyone up to?",
];

/// Tunables for a chat session, supplied at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the traffic simulator fires.
    pub tick_period: Duration,
    /// Candidate bodies for synthetic messages.
    pub phrase_pool: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(DEFAULT_TICK_SECONDS),
            phrase_pool: DEFAULT_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SessionConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// `CHAT_TICK_SECONDS` sets the simulator period; `CHAT_PHRASES` is a
    /// `|`-separated phrase pool.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("CHAT_TICK_SECONDS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.tick_period = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "invalid CHAT_TICK_SECONDS {:?}, using default of {}s",
                    raw,
                    DEFAULT_TICK_SECONDS
                ),
            }
        }

        if let Ok(raw) = std::env::var("CHAT_PHRASES") {
            let phrases: Vec<String> = raw
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if phrases.is_empty() {
                tracing::warn!("CHAT_PHRASES contains no usable phrases, using defaults");
            } else {
                config.phrase_pool = phrases;
            }
        }

        config
    }
}
