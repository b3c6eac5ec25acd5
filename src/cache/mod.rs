//! Fragment cache.
//!
//! Stores rendered fragments for a short TTL so repeated renders skip the
//! content queries. Entries are replaced wholesale on expiry.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 64
//! ttl_seconds = 300
//! key_scope = "shared"
//! ```

mod clock;
mod config;
mod keys;
pub(crate) mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::{CACHE_GROUP, CacheKey, KeyScope};
pub use store::{DisabledCache, FragmentStore};
