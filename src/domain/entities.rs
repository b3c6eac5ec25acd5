//! Read-only projections handed out by the content repository.

/// Publish count for a single registered content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeSummary {
    pub identifier: String,
    pub display_name: String,
    pub published_count: u64,
}

/// Metadata describing a registered content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeInfo {
    pub display_name: String,
}

/// Listing projection of a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: u64,
    pub title: String,
}

/// Per-invocation input supplied by the embedding host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderRequest {
    pub css_class_name: String,
    pub current_item_id: u64,
}

impl RenderRequest {
    pub fn new(css_class_name: impl Into<String>, current_item_id: u64) -> Self {
        Self {
            css_class_name: css_class_name.into(),
            current_item_id,
        }
    }
}
