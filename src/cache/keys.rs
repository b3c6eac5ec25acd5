//! Cache key derivation.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::entities::RenderRequest;
use crate::domain::error::DomainError;

/// Namespace prefix shared by every fragment key.
pub const CACHE_GROUP: &str = "site-counts";

const KEY_SEED: &[u8] = b"uniquekey";

/// Which parts of a render request feed the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyScope {
    /// One entry for every fragment instance, whatever the request says.
    #[default]
    Shared,
    /// One entry per class name and current item.
    PerRequest,
}

impl KeyScope {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyScope::Shared => "shared",
            KeyScope::PerRequest => "per-request",
        }
    }
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyScope {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "shared" => Ok(KeyScope::Shared),
            "per-request" => Ok(KeyScope::PerRequest),
            other => Err(DomainError::validation(format!(
                "unknown cache key scope `{other}` (expected `shared` or `per-request`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The fixed key every instance shares under [`KeyScope::Shared`].
    pub fn shared() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_SEED);
        Self::from_digest(hasher)
    }

    pub fn for_request(scope: KeyScope, request: &RenderRequest) -> Self {
        match scope {
            KeyScope::Shared => Self::shared(),
            KeyScope::PerRequest => {
                let mut hasher = Sha256::new();
                hasher.update(KEY_SEED);
                // Length prefix keeps class name bytes from bleeding into the item id.
                let class = request.css_class_name.as_bytes();
                hasher.update((class.len() as u64).to_be_bytes());
                hasher.update(class);
                hasher.update(request.current_item_id.to_be_bytes());
                Self::from_digest(hasher)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_digest(hasher: Sha256) -> Self {
        Self(format!("{CACHE_GROUP}:{}", hex::encode(hasher.finalize())))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
