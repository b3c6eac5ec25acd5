//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Lifecycle status of a stored content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    AutoDraft,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Publish => "publish",
            ItemStatus::Future => "future",
            ItemStatus::Draft => "draft",
            ItemStatus::Pending => "pending",
            ItemStatus::Private => "private",
            ItemStatus::Trash => "trash",
            ItemStatus::AutoDraft => "auto-draft",
        }
    }

    /// Whether the status is visible to an `any` status query.
    ///
    /// Trashed and auto-draft items never surface through `any`.
    pub fn is_listable(self) -> bool {
        !matches!(self, ItemStatus::Trash | ItemStatus::AutoDraft)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "publish" => Ok(ItemStatus::Publish),
            "future" => Ok(ItemStatus::Future),
            "draft" => Ok(ItemStatus::Draft),
            "pending" => Ok(ItemStatus::Pending),
            "private" => Ok(ItemStatus::Private),
            "trash" => Ok(ItemStatus::Trash),
            "auto-draft" => Ok(ItemStatus::AutoDraft),
            other => Err(DomainError::validation(format!(
                "unknown item status `{other}`"
            ))),
        }
    }
}

/// Status constraint applied by an item search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Any,
    Only(ItemStatus),
}

impl StatusFilter {
    pub fn admits(self, status: ItemStatus) -> bool {
        match self {
            StatusFilter::Any => status.is_listable(),
            StatusFilter::Only(expected) => status == expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_excludes_trash_and_auto_draft() {
        let filter = StatusFilter::Any;
        assert!(filter.admits(ItemStatus::Publish));
        assert!(filter.admits(ItemStatus::Draft));
        assert!(filter.admits(ItemStatus::Private));
        assert!(!filter.admits(ItemStatus::Trash));
        assert!(!filter.admits(ItemStatus::AutoDraft));
    }

    #[test]
    fn only_matches_exact_status() {
        let filter = StatusFilter::Only(ItemStatus::Draft);
        assert!(filter.admits(ItemStatus::Draft));
        assert!(!filter.admits(ItemStatus::Publish));
    }

    #[test]
    fn status_parses_kebab_case() {
        assert_eq!(
            "auto-draft".parse::<ItemStatus>().expect("parse"),
            ItemStatus::AutoDraft
        );
        assert!("published".parse::<ItemStatus>().is_err());
    }
}
