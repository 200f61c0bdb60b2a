//! Configuration for the worker loop.

use std::time::Duration;

/// Delay between polling cycles.
pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_secs(5);

/// Cooldown between summaries for one subscriber, in minutes.
pub const SUMMARY_COOLDOWN_MINUTES: i64 = 15;

/// How many messages a single summarization run will cover at most.
const DEFAULT_FETCH_LIMIT: usize = 500;

/// Cap on task listings and on pending tasks carried into the context.
const TODO_LIST_LIMIT: usize = 20;

/// Configuration for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// The bot's own user id, used to skip its own replies.
    pub bot_user_id: String,

    /// Delay between polling cycles.
    pub cycle_delay: Duration,

    /// Cooldown between summaries for one subscriber, in minutes.
    ///
    /// Measured from the most recent *delivered* summary across all of
    /// the subscriber's rooms.
    pub cooldown_minutes: i64,

    /// Maximum messages fetched per room per run.
    pub fetch_limit: usize,

    /// Maximum entries in task listings.
    pub todo_limit: usize,
}

impl WorkerConfig {
    /// Create a config with defaults for the given bot identity.
    pub fn new(bot_user_id: impl Into<String>) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            cycle_delay: DEFAULT_CYCLE_DELAY,
            cooldown_minutes: SUMMARY_COOLDOWN_MINUTES,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            todo_limit: TODO_LIST_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::new("@lookout:example.org");

        assert_eq!(config.bot_user_id, "@lookout:example.org");
        assert_eq!(config.cycle_delay, Duration::from_secs(5));
        assert_eq!(config.cooldown_minutes, 15);
        assert_eq!(config.todo_limit, 20);
    }
}
