//! Engine configuration.
//!
//! War rules live in [`WarConfig`]; this module adds the knobs that only
//! matter to the concurrent runtime, and reads overrides from the
//! environment.
use std::env;
use std::time::Duration;

use war_core::WarConfig;

/// Bounded retry applied to profile lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. At least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each following one.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(2),
        }
    }

    /// Fail on the first error.
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before attempt `attempt` (1-based; attempt 1 has none).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50))
    }
}

/// Runtime configuration shared across the engine and workers.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub war: WarConfig,
    pub retry: RetryPolicy,
    /// Capacity of each event topic's broadcast channel.
    pub event_buffer_size: usize,
    /// Period of the background battle tick.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            war: WarConfig::default(),
            retry: RetryPolicy::default(),
            event_buffer_size: 256,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WAR_ROUND_DAMAGE_THRESHOLD` - damage that closes a round
    /// - `WAR_ROUND_SECONDS` - round time slice
    /// - `WAR_DURATION_SECONDS` - war time budget
    /// - `WAR_DECISIVE_SHARE` - decisive share in percent (0 disables)
    /// - `STRENGTH_RETRY_ATTEMPTS` - profile lookup attempts
    /// - `STRENGTH_RETRY_BACKOFF_MS` - first retry delay
    /// - `EVENT_BUFFER_SIZE` - per-topic event capacity
    /// - `TICK_INTERVAL_MS` - battle tick period
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threshold) = read_env::<u64>("WAR_ROUND_DAMAGE_THRESHOLD") {
            config.war.round_damage_threshold = threshold;
        }
        if let Some(seconds) = read_env::<u64>("WAR_ROUND_SECONDS") {
            config.war.round_duration = Duration::from_secs(seconds);
        }
        if let Some(seconds) = read_env::<u64>("WAR_DURATION_SECONDS") {
            config.war.war_duration = Duration::from_secs(seconds);
        }
        if let Some(share) = read_env::<u8>("WAR_DECISIVE_SHARE") {
            config.war.decisive_share_percent = (share > 0).then_some(share);
        }
        if let Some(attempts) = read_env::<u32>("STRENGTH_RETRY_ATTEMPTS") {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(millis) = read_env::<u64>("STRENGTH_RETRY_BACKOFF_MS") {
            config.retry.initial_backoff = Duration::from_millis(millis);
        }
        if let Some(size) = read_env::<usize>("EVENT_BUFFER_SIZE") {
            config.event_buffer_size = size.max(1);
        }
        if let Some(millis) = read_env::<u64>("TICK_INTERVAL_MS") {
            config.tick_interval = Duration::from_millis(millis.max(1));
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(400));
        assert_eq!(policy.backoff(40), Duration::from_secs(2));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
    }
}
