//! Item search filter and its matching rules.

use std::collections::BTreeSet;

use super::error::DomainError;
use super::types::StatusFilter;

const MAX_HOUR: u8 = 23;

/// Comparison applied by a single hour-of-day clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourCompare {
    AtLeast,
    AtMost,
}

/// One hour-of-day constraint on an item's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourClause {
    pub hour: u8,
    pub compare: HourCompare,
}

impl HourClause {
    pub fn admits(&self, hour: u8) -> bool {
        match self.compare {
            HourCompare::AtLeast => hour >= self.hour,
            HourCompare::AtMost => hour <= self.hour,
        }
    }
}

/// Pair of hour clauses that must both hold.
///
/// The window is evaluated as two independent clauses joined with AND, so a
/// `min_hour` greater than `max_hour` admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    min_hour: u8,
    max_hour: u8,
}

impl HourWindow {
    pub fn new(min_hour: u8, max_hour: u8) -> Result<Self, DomainError> {
        for (name, hour) in [("min_hour", min_hour), ("max_hour", max_hour)] {
            if hour > MAX_HOUR {
                return Err(DomainError::validation(format!(
                    "{name} must be between 0 and {MAX_HOUR}, got {hour}"
                )));
            }
        }
        Ok(Self { min_hour, max_hour })
    }

    pub fn min_hour(&self) -> u8 {
        self.min_hour
    }

    pub fn max_hour(&self) -> u8 {
        self.max_hour
    }

    pub fn clauses(&self) -> [HourClause; 2] {
        [
            HourClause {
                hour: self.min_hour,
                compare: HourCompare::AtLeast,
            },
            HourClause {
                hour: self.max_hour,
                compare: HourCompare::AtMost,
            },
        ]
    }

    pub fn admits(&self, hour: u8) -> bool {
        self.clauses().iter().all(|clause| clause.admits(hour))
    }
}

/// Filter passed to [`crate::application::repos::ContentRepository::search`].
///
/// Taxonomy constraints are joined with AND: an item must carry one of the
/// listed tag slugs and sit in one of the listed categories. An empty set
/// leaves that taxonomy unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    pub types: BTreeSet<String>,
    pub status: StatusFilter,
    pub limit: usize,
    pub date: HourWindow,
    pub tags: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub include_child_categories: bool,
}

impl ItemFilter {
    /// Filter used by the site counts fragment listing.
    pub fn dashboard() -> Self {
        Self {
            types: set(["post", "page"]),
            status: StatusFilter::Any,
            limit: 5,
            date: HourWindow {
                min_hour: 9,
                max_hour: 17,
            },
            tags: set(["foo"]),
            categories: set(["baz"]),
            include_child_categories: false,
        }
    }

    pub fn admits_type(&self, content_type: &str) -> bool {
        self.types.contains(content_type)
    }

    /// Tag clause: any of the item's tag slugs is listed.
    pub fn admits_tags<'a>(&self, mut item_tags: impl Iterator<Item = &'a str>) -> bool {
        self.tags.is_empty() || item_tags.any(|tag| self.tags.contains(tag))
    }
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self::dashboard()
    }
}

fn set<const N: usize>(values: [&str; N]) -> BTreeSet<String> {
    values.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_requires_both_clauses() {
        let window = HourWindow::new(9, 17).expect("valid window");
        assert!(!window.admits(8));
        assert!(window.admits(9));
        assert!(window.admits(13));
        assert!(window.admits(17));
        assert!(!window.admits(18));
    }

    #[test]
    fn inverted_window_admits_nothing() {
        let window = HourWindow::new(17, 9).expect("valid window");
        assert!((0..=23).all(|hour| !window.admits(hour)));
    }

    #[test]
    fn window_rejects_out_of_range_hours() {
        assert!(HourWindow::new(9, 24).is_err());
        assert!(HourWindow::new(30, 12).is_err());
    }

    #[test]
    fn dashboard_filter_matches_listing_query() {
        let filter = ItemFilter::dashboard();
        assert!(filter.admits_type("post"));
        assert!(filter.admits_type("page"));
        assert!(!filter.admits_type("attachment"));
        assert_eq!(filter.limit, 5);
        assert_eq!(filter.date.min_hour(), 9);
        assert_eq!(filter.date.max_hour(), 17);
        assert!(!filter.include_child_categories);
        assert!(filter.admits_tags(["bar", "foo"].into_iter()));
        assert!(!filter.admits_tags(["bar"].into_iter()));
    }

    #[test]
    fn empty_tag_set_is_unconstrained() {
        let filter = ItemFilter {
            tags: BTreeSet::new(),
            ..ItemFilter::dashboard()
        };
        assert!(filter.admits_tags(std::iter::empty()));
    }
}
