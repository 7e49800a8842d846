//! Offset paging for list queries.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paging {
    /// Items to skip.
    pub skip_count: usize,
    /// Maximum items to return.
    pub max_items: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            skip_count: 0,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl Paging {
    /// A window of `max_items` starting after `skip_count`.
    #[must_use]
    pub fn new(skip_count: usize, max_items: usize) -> Self {
        Self {
            skip_count,
            max_items,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,
    /// More items follow this page.
    pub has_more_items: bool,
    /// Total number of items across all pages.
    pub total_items: usize,
    /// Echo of the requested offset.
    pub skip_count: usize,
    /// Echo of the requested size.
    pub max_items: usize,
}

impl<T> Page<T> {
    /// Cuts a page out of an ordered iterator of known length.
    pub fn window<I>(items: I, total_items: usize, paging: Paging) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items
            .into_iter()
            .skip(paging.skip_count)
            .take(paging.max_items)
            .collect();
        Self {
            has_more_items: paging.skip_count.saturating_add(items.len()) < total_items,
            items,
            total_items,
            skip_count: paging.skip_count,
            max_items: paging.max_items,
        }
    }
}
