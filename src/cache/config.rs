//! Cache configuration.

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

use super::keys::KeyScope;

const DEFAULT_CAPACITY: usize = 64;
pub(crate) const DEFAULT_TTL_SECONDS: u64 = 5 * 60;

/// Fragment cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store rendered fragments at all.
    pub enabled: bool,
    /// Maximum fragments kept before LRU eviction.
    pub capacity: usize,
    /// Lifetime of a stored fragment.
    pub ttl_seconds: u64,
    /// How cache keys are derived from a render request.
    pub key_scope: KeyScope,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            key_scope: KeyScope::Shared,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            ttl_seconds: settings.ttl.as_secs(),
            key_scope: settings.key_scope,
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert_eq!(config.key_scope, KeyScope::Shared);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
