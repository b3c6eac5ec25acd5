//! Content seed loading.
//!
//! A seed is a TOML document declaring content types, categories and items.
//! Categories must be declared after their parent.

use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing::info;

use crate::domain::types::ItemStatus;

use super::memory::{ContentTypeRecord, InMemoryContentRepository, StoredItem};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read content seed `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse content seed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("content type `{0}` is declared more than once")]
    DuplicateType(String),
    #[error("category `{0}` is declared more than once")]
    DuplicateCategory(String),
    #[error("item {0} is declared more than once")]
    DuplicateItem(u64),
    #[error("item {item} references unknown content type `{content_type}`")]
    UnknownType { item: u64, content_type: String },
    #[error("{owner} references unknown category `{category}`")]
    UnknownCategory { owner: String, category: String },
    #[error("item {item} has invalid date `{value}`: {reason}")]
    InvalidDate {
        item: u64,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSeed {
    #[serde(default)]
    types: Vec<RawType>,
    #[serde(default)]
    categories: Vec<RawCategory>,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    id: String,
    name: String,
    #[serde(default = "default_public")]
    public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCategory {
    name: String,
    parent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    id: u64,
    title: String,
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default = "default_status")]
    status: ItemStatus,
    date: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
}

fn default_public() -> bool {
    true
}

fn default_status() -> ItemStatus {
    ItemStatus::Publish
}

/// Read and validate the seed at `path`.
pub fn load(path: &Path) -> Result<InMemoryContentRepository, SeedError> {
    let text = fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let repository = parse(&text)?;
    info!(
        target = "site_counts::seed",
        path = %path.display(),
        items = repository.item_count(),
        "Loaded content seed"
    );
    Ok(repository)
}

/// Build a repository from seed text.
pub fn parse(text: &str) -> Result<InMemoryContentRepository, SeedError> {
    let raw: RawSeed = toml::from_str(text)?;
    let repository = InMemoryContentRepository::new();

    for content_type in raw.types {
        repository.register_type(ContentTypeRecord {
            id: content_type.id,
            display_name: content_type.name,
            public: content_type.public,
        })?;
    }

    for category in raw.categories {
        repository.register_category(category.name, category.parent)?;
    }

    for item in raw.items {
        let date = PrimitiveDateTime::parse(item.date.trim(), DATE_FORMAT).map_err(|err| {
            SeedError::InvalidDate {
                item: item.id,
                value: item.date.clone(),
                reason: err.to_string(),
            }
        })?;
        repository.insert_item(StoredItem {
            id: item.id,
            title: item.title,
            content_type: item.content_type,
            status: item.status,
            date,
            tags: item.tags,
            categories: item.categories,
        })?;
    }

    Ok(repository)
}
