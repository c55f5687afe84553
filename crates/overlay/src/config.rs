use std::str::FromStr;
use std::time::Duration;

/// Timing configuration for a page session.
///
/// All fields have defaults tuned for the host video site. Override via
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Wait after a navigation before looking for the player (default: `450ms`).
    pub attach_grace: Duration,
    /// Fallback location poll period (default: `800ms`).
    pub poll_interval: Duration,
    /// Poll ticks after the last observed navigation (default: `18`).
    pub max_poll_ticks: u32,
    /// Delay between attach attempts while the player is missing (default: `800ms`).
    pub attach_retry_interval: Duration,
    /// Attach attempts before giving up on a video (default: `18`).
    pub max_attach_attempts: u32,
    /// Panel time display refresh period (default: `800ms`).
    pub tick_interval: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            attach_grace: Duration::from_millis(450),
            poll_interval: Duration::from_millis(800),
            max_poll_ticks: 18,
            attach_retry_interval: Duration::from_millis(800),
            max_attach_attempts: 18,
            tick_interval: Duration::from_millis(800),
        }
    }
}

impl OverlayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `YTNOTE_ATTACH_GRACE_MS`     | `450`   |
    /// | `YTNOTE_POLL_INTERVAL_MS`    | `800`   |
    /// | `YTNOTE_MAX_POLL_TICKS`      | `18`    |
    /// | `YTNOTE_ATTACH_RETRY_MS`     | `800`   |
    /// | `YTNOTE_MAX_ATTACH_ATTEMPTS` | `18`    |
    /// | `YTNOTE_TICK_INTERVAL_MS`    | `800`   |
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            attach_grace: env_millis("YTNOTE_ATTACH_GRACE_MS", defaults.attach_grace),
            poll_interval: env_millis("YTNOTE_POLL_INTERVAL_MS", defaults.poll_interval),
            max_poll_ticks: env_or("YTNOTE_MAX_POLL_TICKS", defaults.max_poll_ticks),
            attach_retry_interval: env_millis(
                "YTNOTE_ATTACH_RETRY_MS",
                defaults.attach_retry_interval,
            ),
            max_attach_attempts: env_or("YTNOTE_MAX_ATTACH_ATTEMPTS", defaults.max_attach_attempts)
                .max(1),
            tick_interval: env_millis("YTNOTE_TICK_INTERVAL_MS", defaults.tick_interval),
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    // Zero periods would make tokio intervals panic.
    Duration::from_millis(env_or(key, default.as_millis() as u64).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = OverlayConfig::default();
        assert_eq!(config.attach_grace, Duration::from_millis(450));
        assert_eq!(config.max_poll_ticks, 18);
        assert_eq!(config.max_attach_attempts, 18);
        assert_eq!(config.tick_interval, Duration::from_millis(800));
    }

    #[test]
    fn invalid_env_value_falls_back() {
        std::env::set_var("YTNOTE_TEST_INVALID_TICKS", "many");
        assert_eq!(env_or("YTNOTE_TEST_INVALID_TICKS", 7u32), 7);
        std::env::set_var("YTNOTE_TEST_ZERO_MS", "0");
        assert_eq!(
            env_millis("YTNOTE_TEST_ZERO_MS", Duration::from_millis(5)),
            Duration::from_millis(1)
        );
    }
}
