//! In-memory content repository.
//!
//! Holds content types, a category hierarchy and items, and answers the
//! read-only queries the fragment service issues. Search walks items newest
//! first and applies every filter clause with AND.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::PrimitiveDateTime;
use tracing::debug;

use crate::application::repos::{ContentRepository, RepoError};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{ContentItem, ContentTypeInfo};
use crate::domain::filter::ItemFilter;
use crate::domain::types::ItemStatus;

use super::seed::SeedError;

const SOURCE: &str = "infra::memory::InMemoryContentRepository";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeRecord {
    pub id: String,
    pub display_name: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub id: u64,
    pub title: String,
    pub content_type: String,
    pub status: ItemStatus,
    /// Local publication date; the hour clauses read its hour.
    pub date: PrimitiveDateTime,
    /// Tag slugs.
    pub tags: Vec<String>,
    /// Category names.
    pub categories: Vec<String>,
}

#[derive(Debug, Default)]
struct Catalog {
    types: Vec<ContentTypeRecord>,
    /// Category name to parent name.
    parents: HashMap<String, Option<String>>,
    items: Vec<StoredItem>,
}

impl Catalog {
    fn find_type(&self, id: &str) -> Option<&ContentTypeRecord> {
        self.types.iter().find(|record| record.id == id)
    }

    /// Whether `category` is one of `wanted`, or a descendant of one when
    /// `include_children` is set.
    fn category_matches(
        &self,
        category: &str,
        wanted: &BTreeSet<String>,
        include_children: bool,
    ) -> bool {
        if wanted.contains(category) {
            return true;
        }
        if !include_children {
            return false;
        }

        let mut current = self.parents.get(category).and_then(Option::as_deref);
        // Parents are registered before children, so the walk cannot loop;
        // the bound only guards against a corrupted map.
        for _ in 0..self.parents.len() {
            let Some(parent) = current else {
                return false;
            };
            if wanted.contains(parent) {
                return true;
            }
            current = self.parents.get(parent).and_then(Option::as_deref);
        }
        false
    }

    fn admits(&self, item: &StoredItem, filter: &ItemFilter) -> bool {
        filter.admits_type(&item.content_type)
            && filter.status.admits(item.status)
            && filter.date.admits(item.date.hour())
            && filter.admits_tags(item.tags.iter().map(String::as_str))
            && (filter.categories.is_empty()
                || item.categories.iter().any(|category| {
                    self.category_matches(
                        category,
                        &filter.categories,
                        filter.include_child_categories,
                    )
                }))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    catalog: RwLock<Catalog>,
    unavailable: AtomicBool,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&self, record: ContentTypeRecord) -> Result<(), SeedError> {
        let mut catalog = rw_write(&self.catalog, SOURCE, "register_type");
        if catalog.find_type(&record.id).is_some() {
            return Err(SeedError::DuplicateType(record.id));
        }
        catalog.types.push(record);
        Ok(())
    }

    /// Register a category. A parent must already be registered.
    pub fn register_category(
        &self,
        name: impl Into<String>,
        parent: Option<String>,
    ) -> Result<(), SeedError> {
        let name = name.into();
        let mut catalog = rw_write(&self.catalog, SOURCE, "register_category");
        if catalog.parents.contains_key(&name) {
            return Err(SeedError::DuplicateCategory(name));
        }
        if let Some(parent) = parent.as_ref() {
            if !catalog.parents.contains_key(parent) {
                return Err(SeedError::UnknownCategory {
                    owner: format!("category `{name}`"),
                    category: parent.clone(),
                });
            }
        }
        catalog.parents.insert(name, parent);
        Ok(())
    }

    pub fn insert_item(&self, item: StoredItem) -> Result<(), SeedError> {
        let mut catalog = rw_write(&self.catalog, SOURCE, "insert_item");
        if catalog.items.iter().any(|existing| existing.id == item.id) {
            return Err(SeedError::DuplicateItem(item.id));
        }
        if catalog.find_type(&item.content_type).is_none() {
            return Err(SeedError::UnknownType {
                item: item.id,
                content_type: item.content_type,
            });
        }
        if let Some(category) = item
            .categories
            .iter()
            .find(|category| !catalog.parents.contains_key(category.as_str()))
        {
            return Err(SeedError::UnknownCategory {
                owner: format!("item {}", item.id),
                category: category.clone(),
            });
        }
        catalog.items.push(item);
        Ok(())
    }

    /// Make every query fail with [`RepoError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn item_count(&self) -> usize {
        rw_read(&self.catalog, SOURCE, "item_count").items.len()
    }

    fn ensure_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::unavailable("in-memory repository marked offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn list_public_types(&self) -> Result<Vec<String>, RepoError> {
        self.ensure_available()?;
        let catalog = rw_read(&self.catalog, SOURCE, "list_public_types");
        Ok(catalog
            .types
            .iter()
            .filter(|record| record.public)
            .map(|record| record.id.clone())
            .collect())
    }

    async fn type_info(&self, id: &str) -> Result<Option<ContentTypeInfo>, RepoError> {
        self.ensure_available()?;
        let catalog = rw_read(&self.catalog, SOURCE, "type_info");
        Ok(catalog.find_type(id).map(|record| ContentTypeInfo {
            display_name: record.display_name.clone(),
        }))
    }

    async fn count_published(&self, id: &str) -> Result<u64, RepoError> {
        self.ensure_available()?;
        let catalog = rw_read(&self.catalog, SOURCE, "count_published");
        let count = catalog
            .items
            .iter()
            .filter(|item| item.content_type == id && item.status == ItemStatus::Publish)
            .count();
        Ok(count as u64)
    }

    async fn search(&self, filter: &ItemFilter) -> Result<Vec<ContentItem>, RepoError> {
        self.ensure_available()?;
        let catalog = rw_read(&self.catalog, SOURCE, "search");

        let mut matches: Vec<&StoredItem> = catalog
            .items
            .iter()
            .filter(|item| catalog.admits(item, filter))
            .collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        let total = matches.len();
        let items: Vec<ContentItem> = matches
            .into_iter()
            .take(filter.limit)
            .map(|item| ContentItem {
                id: item.id,
                title: item.title.clone(),
            })
            .collect();

        debug!(
            target = SOURCE,
            matched = total,
            returned = items.len(),
            "Search completed"
        );
        Ok(items)
    }
}
