//! Traits describing the collaborators the fragment service reads from.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ContentItem, ContentTypeInfo};
use crate::domain::filter::ItemFilter;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("content repository unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Read-only view of the host's content registry.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Publicly visible content-type identifiers in registration order.
    async fn list_public_types(&self) -> Result<Vec<String>, RepoError>;

    async fn type_info(&self, id: &str) -> Result<Option<ContentTypeInfo>, RepoError>;

    async fn count_published(&self, id: &str) -> Result<u64, RepoError>;

    /// Items matching `filter`, in repository order, at most `filter.limit`.
    async fn search(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, RepoError>;
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Key-value store with expiry holding rendered fragments.
#[async_trait]
pub trait FragmentCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}
