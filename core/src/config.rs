//! Environment-driven settings for the panel side.

use std::time::Duration;

pub const CALL_TIMEOUT_ENV: &str = "REQPANEL_CALL_TIMEOUT_MS";

/// Settings for a `Bridge`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How long a call may wait for its reply. `None` waits forever.
    pub call_timeout: Option<Duration>,
}

impl BridgeConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            call_timeout: Some(timeout),
        }
    }

    /// Read `REQPANEL_CALL_TIMEOUT_MS`. Unset, unparsable or `0` disables
    /// the timeout.
    pub fn from_env() -> Self {
        Self::from_millis(std::env::var(CALL_TIMEOUT_ENV).ok().as_deref())
    }

    fn from_millis(raw: Option<&str>) -> Self {
        let call_timeout = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self { call_timeout }
    }
}
