//! API handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use edumart_core::{ItemRef, ItemType};

use crate::error::ApiError;

pub mod admin;
pub mod assignments;
pub mod books;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod forum;
pub mod health;
pub mod library;
pub mod live_classes;
pub mod notifications;
pub mod orders;
pub mod paths;
pub mod reviews;
pub mod users;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest accepted page size.
pub const MAX_LIMIT: usize = 100;

/// `limit`/`offset` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page size (default 20, max 100).
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

/// A page of results.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Items across all pages.
    pub total: usize,
    /// Whether more items follow.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Cut one page out of a full, already ordered result set.
    #[must_use]
    pub fn slice(all: Vec<T>, limit: Option<usize>, offset: Option<usize>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let total = all.len();
        let items: Vec<T> = all.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(items.len()) < total;
        Self {
            items,
            total,
            has_more,
        }
    }

    /// Convert every item.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}

/// Item reference from `/:item_type/:item_id` path segments.
pub(crate) fn item_from_path(item_type: &str, item_id: Uuid) -> Result<ItemRef, ApiError> {
    let item_type: ItemType = item_type.parse()?;
    Ok(ItemRef::new(item_type, item_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_paths_accept_plural_types() {
        let id = Uuid::new_v4();
        let item = item_from_path("courses", id).unwrap();
        assert_eq!(item.item_type(), ItemType::Course);
        assert_eq!(item.uuid(), &id);
        assert!(item_from_path("videos", id).is_err());
    }

    #[test]
    fn page_defaults_and_bounds() {
        let page = Page::slice((0..50).collect::<Vec<_>>(), None, None);
        assert_eq!(page.items.len(), DEFAULT_LIMIT);
        assert_eq!(page.total, 50);
        assert!(page.has_more);

        let page = Page::slice((0..50).collect::<Vec<_>>(), Some(1000), Some(40));
        assert_eq!(page.items, (40..50).collect::<Vec<_>>());
        assert!(!page.has_more);

        let page = Page::slice((0..5).collect::<Vec<_>>(), Some(0), Some(10));
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }
}
