//! Shopping cart and wishlist entries.
//!
//! Both are sets of `(user, item)` pairs; prices and titles are looked up
//! from the catalog whenever the list is shown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemRef;
use crate::UserId;

/// An item waiting in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Owner of the cart.
    pub user_id: UserId,
    /// Item to buy.
    pub item: ItemRef,
    /// When it was added.
    pub added_at: DateTime<Utc>,
}

/// An item saved for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    /// Owner of the wishlist.
    pub user_id: UserId,
    /// Saved item.
    pub item: ItemRef,
    /// When it was added.
    pub added_at: DateTime<Utc>,
}

impl CartEntry {
    /// New entry stamped now.
    #[must_use]
    pub fn new(user_id: UserId, item: ItemRef) -> Self {
        Self {
            user_id,
            item,
            added_at: Utc::now(),
        }
    }
}

impl WishlistEntry {
    /// New entry stamped now.
    #[must_use]
    pub fn new(user_id: UserId, item: ItemRef) -> Self {
        Self {
            user_id,
            item,
            added_at: Utc::now(),
        }
    }
}
