//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_LIST_TTL_SECONDS: u64 = 60;
const DEFAULT_LIST_ENTRY_LIMIT: usize = 256;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Kill-switch: when false, every lookup falls through to direct
    /// computation and nothing is stored.
    pub enabled: bool,
    /// Time-to-live for cached list bodies, measured from insertion.
    pub list_ttl_seconds: u64,
    /// Maximum cached list bodies; page×limit×version combinations are
    /// unbounded, so the store is capacity-capped with LRU eviction.
    pub list_entry_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            list_ttl_seconds: DEFAULT_LIST_TTL_SECONDS,
            list_entry_limit: DEFAULT_LIST_ENTRY_LIMIT,
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_seconds)
    }

    /// Entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn list_entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.list_entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            list_ttl_seconds: settings.list_ttl_seconds,
            list_entry_limit: settings.list_entry_limit,
        }
    }
}
