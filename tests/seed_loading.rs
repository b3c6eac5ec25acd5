use std::fs;
use std::path::Path;
use std::sync::Arc;

use site_counts::application::repos::{ContentRepository, FragmentCache};
use site_counts::application::site_counts::{SiteCountsConfig, SiteCountsService};
use site_counts::cache::DisabledCache;
use site_counts::domain::entities::RenderRequest;
use site_counts::infra::seed::{self, SeedError};

#[tokio::test]
async fn fixture_seed_renders_counts_and_listing() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/content.toml");
    let content: Arc<dyn ContentRepository> = Arc::new(seed::load(&path).expect("fixture loads"));
    let cache: Arc<dyn FragmentCache> = Arc::new(DisabledCache);
    let service = SiteCountsService::new(content, cache, SiteCountsConfig::default());

    let fragment = service
        .render(&RenderRequest::new("is-style-fixture", 10))
        .await
        .expect("fragment renders");

    assert!(fragment.starts_with("<div class=\"is-style-fixture\">"));
    assert!(fragment.contains("There are 1 Posts."));
    assert!(fragment.contains("There are 1 Pages."));
    assert!(fragment.contains("<li>Fixture page</li>"));
    assert!(fragment.contains("<li>Fixture post</li>"));
    assert!(
        fragment.find("Fixture page") < fragment.find("Fixture post"),
        "newest item should be listed first"
    );
}

#[tokio::test]
async fn bundled_sample_seed_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("content/site.toml");
    let repo = seed::load(&path).expect("sample seed loads");

    assert_eq!(
        repo.list_public_types().await.expect("types"),
        vec!["post".to_string(), "page".to_string()]
    );
}

#[test]
fn missing_seed_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");

    let err = seed::load(&path).expect_err("missing file fails");
    assert!(matches!(err, SeedError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn duplicate_items_are_rejected_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dup.toml");
    fs::write(
        &path,
        r#"
[[types]]
id = "post"
name = "Posts"

[[items]]
id = 1
title = "One"
type = "post"
date = "2024-01-01 10:00:00"

[[items]]
id = 1
title = "One again"
type = "post"
date = "2024-01-02 10:00:00"
"#,
    )
    .expect("write seed");

    assert!(matches!(seed::load(&path), Err(SeedError::DuplicateItem(1))));
}

