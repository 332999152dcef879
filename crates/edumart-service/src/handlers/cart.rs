//! Cart and wishlist handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use edumart_core::{CartEntry, ItemRef, Listing, WishlistEntry};
use edumart_store::{keys, schema::table, Store, StoreError, StoreExt, WriteBatch};

use crate::access;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::item_from_path;
use crate::state::AppState;

/// A saved item with its current catalog data.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedItem {
    /// The item.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Current title.
    pub title: String,
    /// Current price in cents.
    pub price_cents: i64,
    /// Whether it can be bought right now.
    pub available: bool,
    /// When it was added.
    pub added_at: DateTime<Utc>,
}

/// Cart contents.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartView {
    /// Items still in the catalog.
    pub items: Vec<SavedItem>,
    /// Sum of available item prices.
    pub subtotal_cents: i64,
}

fn resolve(
    state: &AppState,
    entries: impl IntoIterator<Item = (ItemRef, DateTime<Utc>)>,
) -> Result<Vec<SavedItem>, ApiError> {
    let mut items = Vec::new();
    for (item, added_at) in entries {
        let Some(product) = access::find_product(state, &item)? else {
            continue;
        };
        let listing = product.listing();
        items.push(SavedItem {
            item,
            title: listing.title().to_string(),
            price_cents: listing.price_cents(),
            available: listing.is_public(),
            added_at,
        });
    }
    Ok(items)
}

/// Cart entries of a user, oldest first.
pub(crate) fn cart_entries(state: &AppState, caller: &Caller) -> Result<Vec<CartEntry>, ApiError> {
    let mut entries: Vec<CartEntry> = state.store.scan(caller.id().as_bytes())?;
    entries.sort_by_key(|e| e.added_at);
    Ok(entries)
}

/// Show the caller's cart.
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<CartView>, ApiError> {
    let entries = cart_entries(&state, &caller)?;
    let items = resolve(&state, entries.into_iter().map(|e| (e.item, e.added_at)))?;
    let subtotal_cents = items
        .iter()
        .filter(|i| i.available)
        .map(|i| i.price_cents)
        .sum();
    Ok(Json(CartView {
        items,
        subtotal_cents,
    }))
}

/// Add an item to the cart.
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(item): Json<ItemRef>,
) -> Result<Json<CartView>, ApiError> {
    access::purchasable(&state, &caller.user, &item)?;

    let mut batch = WriteBatch::new();
    batch.insert(&CartEntry::new(caller.id(), item))?;
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict { .. } => ApiError::Conflict("item already in cart".into()),
        other => other.into(),
    })?;

    tracing::debug!(user_id = %caller.id(), %item, "Added to cart");

    get_cart(State(state), caller).await
}

/// Remove an item from the cart.
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((item_type, item_id)): Path<(String, Uuid)>,
) -> Result<Json<CartView>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    let key = keys::user_item_key(&caller.id(), &item);
    if !state.store.contains(table::CART, &key)? {
        return Err(ApiError::NotFound("item not in cart".into()));
    }

    let mut batch = WriteBatch::new();
    batch.delete(table::CART, key);
    state.store.commit(batch)?;

    get_cart(State(state), caller).await
}

/// Show the caller's wishlist.
pub async fn get_wishlist(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<SavedItem>>, ApiError> {
    let mut entries: Vec<WishlistEntry> = state.store.scan(caller.id().as_bytes())?;
    entries.sort_by_key(|e| e.added_at);
    Ok(Json(resolve(
        &state,
        entries.into_iter().map(|e| (e.item, e.added_at)),
    )?))
}

/// Save an item to the wishlist.
pub async fn add_to_wishlist(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(item): Json<ItemRef>,
) -> Result<Json<Vec<SavedItem>>, ApiError> {
    access::purchasable(&state, &caller.user, &item)?;

    let mut batch = WriteBatch::new();
    batch.insert(&WishlistEntry::new(caller.id(), item))?;
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict { .. } => ApiError::Conflict("item already in wishlist".into()),
        other => other.into(),
    })?;

    get_wishlist(State(state), caller).await
}

/// Remove an item from the wishlist.
pub async fn remove_from_wishlist(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((item_type, item_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<SavedItem>>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    let key = keys::user_item_key(&caller.id(), &item);
    if !state.store.contains(table::WISHLIST, &key)? {
        return Err(ApiError::NotFound("item not in wishlist".into()));
    }

    let mut batch = WriteBatch::new();
    batch.delete(table::WISHLIST, key);
    state.store.commit(batch)?;

    get_wishlist(State(state), caller).await
}
