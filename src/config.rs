//! Store configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_REPLY_START_DELAY_MS: u64 = 500;
pub const DEFAULT_REPLY_TICK_MS: u64 = 80;
pub const DEFAULT_CHAT_TITLE_MAX_CHARS: usize = 30;
pub const DEFAULT_NOTIFY_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Pause between the user message and the assistant placeholder.
    pub reply_start_delay: Duration,
    /// Interval between revealed words of the streamed reply.
    pub reply_tick: Duration,
    /// Characters of the first message used as a staged chat's title.
    pub chat_title_max_chars: usize,
    /// Bounded capacity of each subscriber's notification channel.
    pub notify_channel_capacity: usize,
    /// Load the demo chats and dashboards on startup.
    pub seed_demo_data: bool,
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Optional:
    /// - `REPLY_START_DELAY_MS`: default 500
    /// - `REPLY_TICK_MS`: default 80
    /// - `CHAT_TITLE_MAX_CHARS`: default 30
    /// - `NOTIFY_CHANNEL_CAPACITY`: default 256 (minimum 1)
    /// - `SEED_DEMO_DATA`: `true` (default) or `false`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            reply_start_delay: Duration::from_millis(env_parse("REPLY_START_DELAY_MS", DEFAULT_REPLY_START_DELAY_MS)),
            reply_tick: Duration::from_millis(env_parse("REPLY_TICK_MS", DEFAULT_REPLY_TICK_MS)),
            chat_title_max_chars: env_parse("CHAT_TITLE_MAX_CHARS", DEFAULT_CHAT_TITLE_MAX_CHARS),
            notify_channel_capacity: env_parse("NOTIFY_CHANNEL_CAPACITY", DEFAULT_NOTIFY_CHANNEL_CAPACITY).max(1),
            seed_demo_data: env_parse("SEED_DEMO_DATA", true),
        }
    }

    /// Millisecond-scale timings so streaming tests finish quickly.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            reply_start_delay: Duration::from_millis(5),
            reply_tick: Duration::from_millis(1),
            seed_demo_data: false,
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reply_start_delay: Duration::from_millis(DEFAULT_REPLY_START_DELAY_MS),
            reply_tick: Duration::from_millis(DEFAULT_REPLY_TICK_MS),
            chat_title_max_chars: DEFAULT_CHAT_TITLE_MAX_CHARS,
            notify_channel_capacity: DEFAULT_NOTIFY_CHANNEL_CAPACITY,
            seed_demo_data: true,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
