//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::time::Duration;

/// `[watch]` section in wpy.toml - watch session settings.
///
/// # Example
/// ```toml
/// [watch]
/// debounce = 100  # milliseconds, 0 dispatches every event immediately
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period before a batch of changed paths is dispatched.
    #[serde(default = "defaults::watch::debounce")]
    #[educe(Default = defaults::watch::debounce())]
    pub debounce: u64,
}

impl WatchConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }
}
