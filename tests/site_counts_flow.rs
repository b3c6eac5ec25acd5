use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use site_counts::application::error::SiteCountsError;
use site_counts::application::repos::{ContentRepository, FragmentCache, RepoError};
use site_counts::application::site_counts::{SiteCountsConfig, SiteCountsService};
use site_counts::cache::{CacheConfig, FragmentStore, ManualClock};
use site_counts::domain::entities::{ContentItem, ContentTypeInfo, RenderRequest};
use site_counts::domain::filter::ItemFilter;
use site_counts::domain::types::ItemStatus;
use site_counts::infra::memory::{ContentTypeRecord, InMemoryContentRepository, StoredItem};
use time::Duration as TimeDuration;
use time::macros::datetime;

/// Counts every repository call before delegating.
struct CountingRepository {
    inner: Arc<InMemoryContentRepository>,
    calls: AtomicUsize,
}

impl CountingRepository {
    fn new(inner: Arc<InMemoryContentRepository>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRepository for CountingRepository {
    async fn list_public_types(&self) -> Result<Vec<String>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_public_types().await
    }

    async fn type_info(&self, id: &str) -> Result<Option<ContentTypeInfo>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.type_info(id).await
    }

    async fn count_published(&self, id: &str) -> Result<u64, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.count_published(id).await
    }

    async fn search(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(filter).await
    }
}

fn register_types(repo: &InMemoryContentRepository) {
    for (id, name) in [("post", "Posts"), ("page", "Pages")] {
        repo.register_type(ContentTypeRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            public: true,
        })
        .expect("type registers");
    }
    repo.register_category("baz", None).expect("category");
    repo.register_category("baz-child", Some("baz".to_string()))
        .expect("child category");
    repo.register_category("other", None).expect("category");
}

fn item(
    id: u64,
    title: &str,
    content_type: &str,
    date: time::PrimitiveDateTime,
    tags: &[&str],
    categories: &[&str],
) -> StoredItem {
    StoredItem {
        id,
        title: title.to_string(),
        content_type: content_type.to_string(),
        status: ItemStatus::Publish,
        date,
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        categories: categories.iter().map(|name| name.to_string()).collect(),
    }
}

/// Three posts and one page, none of which match the dashboard listing.
fn counts_only_repository() -> Arc<InMemoryContentRepository> {
    let repo = InMemoryContentRepository::new();
    register_types(&repo);
    for id in 1..=3 {
        repo.insert_item(item(
            id,
            &format!("Post {id}"),
            "post",
            datetime!(2024-05-01 20:00:00),
            &["foo"],
            &["baz"],
        ))
        .expect("post inserts");
    }
    repo.insert_item(item(
        4,
        "About",
        "page",
        datetime!(2024-05-01 10:00:00),
        &[],
        &["other"],
    ))
    .expect("page inserts");
    Arc::new(repo)
}

fn service_with(
    content: Arc<dyn ContentRepository>,
    clock: Arc<ManualClock>,
) -> (SiteCountsService, Arc<FragmentStore>) {
    let config = CacheConfig::default();
    let store = Arc::new(FragmentStore::new(&config, clock));
    let cache: Arc<dyn FragmentCache> = store.clone();
    let service = SiteCountsService::new(content, cache, SiteCountsConfig::from(&config));
    (service, store)
}

fn list_items(fragment: &str) -> Vec<String> {
    let listing = fragment
        .split("<h2>")
        .nth(2)
        .expect("fragment has a listing section");
    listing
        .split("<li>")
        .skip(1)
        .filter_map(|chunk| chunk.split("</li>").next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn counts_render_with_empty_listing() {
    let repo = counts_only_repository();
    let (service, _) = service_with(repo, Arc::new(ManualClock::default()));

    let fragment = service
        .render(&RenderRequest::new("wp-block-site-counts", 42))
        .await
        .expect("fragment renders");

    assert!(fragment.contains("There are 3 Posts."));
    assert!(fragment.contains("There are 1 Pages."));
    assert!(fragment.contains("The current post ID is 42."));
    assert!(list_items(&fragment).is_empty());
}

#[tokio::test]
async fn cached_fragment_served_until_ttl_elapses() {
    let inner = counts_only_repository();
    let counting = Arc::new(CountingRepository::new(inner.clone()));
    let clock = Arc::new(ManualClock::default());
    let (service, store) = service_with(counting.clone(), clock.clone());
    let request = RenderRequest::new("wp-block-site-counts", 1);

    let first = service.render(&request).await.expect("first render");
    let after_first = counting.calls();
    assert!(after_first > 0);
    assert_eq!(store.len(), 1);

    clock.advance(TimeDuration::seconds(299));
    let second = service.render(&request).await.expect("cached render");
    assert_eq!(second, first);
    assert_eq!(counting.calls(), after_first);

    inner
        .insert_item(item(
            9,
            "Fresh",
            "post",
            datetime!(2024-05-02 20:00:00),
            &[],
            &[],
        ))
        .expect("late insert");

    clock.advance(TimeDuration::seconds(1));
    let third = service.render(&request).await.expect("recomputed render");
    assert!(counting.calls() > after_first);
    assert!(third.contains("There are 4 Posts."));
}

#[tokio::test]
async fn listing_applies_tag_category_and_hour_constraints() {
    let repo = InMemoryContentRepository::new();
    register_types(&repo);

    let rows = [
        item(1, "Match", "post", datetime!(2024-05-01 09:00:00), &["foo"], &["baz"]),
        item(2, "Page match", "page", datetime!(2024-05-01 17:59:00), &["foo"], &["baz"]),
        item(3, "Wrong tag", "post", datetime!(2024-05-02 10:00:00), &["bar"], &["baz"]),
        item(4, "Wrong category", "post", datetime!(2024-05-02 11:00:00), &["foo"], &["other"]),
        item(5, "Child category", "post", datetime!(2024-05-02 12:00:00), &["foo"], &["baz-child"]),
        item(6, "Too early", "post", datetime!(2024-05-02 08:59:00), &["foo"], &["baz"]),
        item(7, "Too late", "post", datetime!(2024-05-02 18:00:00), &["foo"], &["baz"]),
    ];
    for row in rows {
        repo.insert_item(row).expect("item inserts");
    }
    let mut draft = item(8, "Draft match", "post", datetime!(2024-05-03 12:00:00), &["foo"], &["baz"]);
    draft.status = ItemStatus::Draft;
    repo.insert_item(draft).expect("draft inserts");
    let mut trashed = item(9, "Trashed", "post", datetime!(2024-05-03 13:00:00), &["foo"], &["baz"]);
    trashed.status = ItemStatus::Trash;
    repo.insert_item(trashed).expect("trash inserts");

    let (service, _) = service_with(Arc::new(repo), Arc::new(ManualClock::default()));
    let fragment = service
        .render(&RenderRequest::default())
        .await
        .expect("fragment renders");

    assert_eq!(
        list_items(&fragment),
        vec![
            "Draft match".to_string(),
            "Page match".to_string(),
            "Match".to_string(),
        ]
    );
}

#[tokio::test]
async fn listing_is_capped_at_five_items() {
    let repo = InMemoryContentRepository::new();
    register_types(&repo);
    for id in 1..=8 {
        repo.insert_item(item(
            id,
            &format!("Post {id}"),
            "post",
            datetime!(2024-05-01 12:00:00),
            &["foo"],
            &["baz"],
        ))
        .expect("item inserts");
    }

    let (service, _) = service_with(Arc::new(repo), Arc::new(ManualClock::default()));
    let fragment = service
        .render(&RenderRequest::default())
        .await
        .expect("fragment renders");

    assert_eq!(list_items(&fragment).len(), 5);
    assert!(fragment.contains("There are 8 Posts."));
}

#[tokio::test]
async fn repository_outage_is_surfaced_and_never_cached() {
    let repo = counts_only_repository();
    let (service, store) = service_with(repo.clone(), Arc::new(ManualClock::default()));
    let request = RenderRequest::default();

    repo.set_unavailable(true);
    let err = service
        .render(&request)
        .await
        .expect_err("outage must fail the render");
    assert!(matches!(err, SiteCountsError::RepositoryUnavailable(_)));
    assert!(store.is_empty());

    repo.set_unavailable(false);
    let fragment = service.render(&request).await.expect("recovered render");
    assert!(fragment.contains("There are 3 Posts."));
    assert_eq!(store.len(), 1);
}
