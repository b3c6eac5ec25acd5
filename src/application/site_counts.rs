//! Site counts fragment: compute once, serve from cache until the TTL lapses.

use std::{collections::HashSet, sync::Arc, time::Duration, time::Instant};

use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use crate::application::error::SiteCountsError;
use crate::application::repos::{ContentRepository, FragmentCache};
use crate::cache::{CacheConfig, CacheKey, KeyScope};
use crate::domain::entities::{ContentItem, ContentTypeSummary, RenderRequest};
use crate::domain::filter::ItemFilter;
use crate::presentation::views::render_fragment;

const SOURCE: &str = "application::site_counts::SiteCountsService";

const METRIC_RENDER_TOTAL: &str = "site_counts_render_total";
const METRIC_RENDER_MS: &str = "site_counts_render_ms";
const METRIC_CACHE_ERROR: &str = "site_counts_cache_error_total";

/// Explicit configuration for [`SiteCountsService`].
#[derive(Debug, Clone)]
pub struct SiteCountsConfig {
    pub ttl: Duration,
    pub key_scope: KeyScope,
    pub listing: ItemFilter,
}

impl Default for SiteCountsConfig {
    fn default() -> Self {
        Self {
            ttl: CacheConfig::default().ttl(),
            key_scope: KeyScope::Shared,
            listing: ItemFilter::dashboard(),
        }
    }
}

impl From<&CacheConfig> for SiteCountsConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            key_scope: config.key_scope,
            listing: ItemFilter::dashboard(),
        }
    }
}

#[derive(Clone)]
pub struct SiteCountsService {
    content: Arc<dyn ContentRepository>,
    cache: Arc<dyn FragmentCache>,
    config: SiteCountsConfig,
}

impl SiteCountsService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        cache: Arc<dyn FragmentCache>,
        config: SiteCountsConfig,
    ) -> Self {
        Self {
            content,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &SiteCountsConfig {
        &self.config
    }

    pub fn cache_key(&self, request: &RenderRequest) -> CacheKey {
        CacheKey::for_request(self.config.key_scope, request)
    }

    /// Render the fragment for `request`, serving a cached copy when one is live.
    ///
    /// Repository failures are returned to the caller and never cached. Cache
    /// failures are logged and the fragment is rendered without it.
    #[instrument(skip_all, fields(class_name = %request.css_class_name, item_id = request.current_item_id))]
    pub async fn render(&self, request: &RenderRequest) -> Result<String, SiteCountsError> {
        let key = self.cache_key(request);

        if let Some(cached) = self.cached(&key).await {
            counter!(METRIC_RENDER_TOTAL, "result" => "hit").increment(1);
            return Ok(cached);
        }

        let started_at = Instant::now();
        let fragment = self.compute(request).await?;
        histogram!(METRIC_RENDER_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        counter!(METRIC_RENDER_TOTAL, "result" => "miss").increment(1);

        if let Err(err) = self
            .cache
            .set(key.as_str(), fragment.clone(), self.config.ttl)
            .await
        {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            warn!(
                target = SOURCE,
                op = "set",
                key = %key,
                error = %err,
                "Cache unavailable; fragment not stored"
            );
        }

        Ok(fragment)
    }

    /// Build the fragment from fresh repository data, bypassing the cache.
    pub async fn compute(&self, request: &RenderRequest) -> Result<String, SiteCountsError> {
        let summaries = self.collect_summaries().await?;
        let items = self.collect_listing().await?;

        debug!(
            target = SOURCE,
            types = summaries.len(),
            items = items.len(),
            "Computed site counts"
        );

        Ok(render_fragment(
            &request.css_class_name,
            &summaries,
            request.current_item_id,
            &items,
        )?)
    }

    async fn cached(&self, key: &CacheKey) -> Option<String> {
        match self.cache.get(key.as_str()).await {
            Ok(hit) => hit,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                warn!(
                    target = SOURCE,
                    op = "get",
                    key = %key,
                    error = %err,
                    "Cache unavailable; rendering without it"
                );
                None
            }
        }
    }

    async fn collect_summaries(&self) -> Result<Vec<ContentTypeSummary>, SiteCountsError> {
        let identifiers = self.content.list_public_types().await?;

        let mut seen = HashSet::with_capacity(identifiers.len());
        let mut summaries = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            if !seen.insert(identifier.clone()) {
                return Err(SiteCountsError::malformed(format!(
                    "content type `{identifier}` listed more than once"
                )));
            }

            let info = self.content.type_info(&identifier).await?.ok_or_else(|| {
                SiteCountsError::malformed(format!(
                    "content type `{identifier}` is listed but has no type info"
                ))
            })?;
            let published_count = self.content.count_published(&identifier).await?;

            summaries.push(ContentTypeSummary {
                identifier,
                display_name: info.display_name,
                published_count,
            });
        }

        Ok(summaries)
    }

    async fn collect_listing(&self) -> Result<Vec<ContentItem>, SiteCountsError> {
        let filter = &self.config.listing;
        let items = self.content.search(filter).await?;

        if items.len() > filter.limit {
            return Err(SiteCountsError::malformed(format!(
                "search returned {} items for a limit of {}",
                items.len(),
                filter.limit
            )));
        }

        let mut seen = HashSet::with_capacity(items.len());
        if let Some(duplicate) = items.iter().find(|item| !seen.insert(item.id)) {
            return Err(SiteCountsError::malformed(format!(
                "search returned item {} more than once",
                duplicate.id
            )));
        }

        Ok(items)
    }
}
