//! Review handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use edumart_core::{ItemRef, RatingSummary, Review};
use edumart_store::{keys, Store, StoreError, StoreExt, WriteBatch};

use crate::access;
use crate::auth::{Caller, MaybeCaller};
use crate::error::ApiError;
use crate::handlers::{item_from_path, Page, PageQuery};
use crate::state::AppState;

/// Review create/update request.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// 1..=5 stars.
    pub rating: u8,
    /// Free text.
    #[serde(default)]
    pub comment: String,
}

/// Reviews of one item with its summary.
#[derive(Debug, Serialize)]
pub struct ReviewPage {
    /// Summary over all reviews.
    pub summary: RatingSummary,
    /// The requested page, newest first.
    #[serde(flatten)]
    pub page: Page<Review>,
}

/// List reviews of an item.
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path((item_type, item_id)): Path<(String, Uuid)>,
    viewer: MaybeCaller,
    Query(query): Query<PageQuery>,
) -> Result<Json<ReviewPage>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    access::visible_product(&state, &item, viewer.user())?;

    let mut reviews: Vec<Review> = state.store.scan(&keys::reviews_prefix(&item))?;
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(ReviewPage {
        summary: RatingSummary::from_reviews(&reviews),
        page: Page::slice(reviews, query.limit, query.offset),
    }))
}

/// Review an owned item. One review per user per item.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((item_type, item_id)): Path<(String, Uuid)>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    if access::find_product(&state, &item)?.is_none() {
        return Err(ApiError::NotFound(format!("{} not found", item.item_type())));
    }
    if !access::is_entitled(&state, caller.id(), &item)? {
        return Err(ApiError::Forbidden);
    }

    let review = Review::new(
        item,
        caller.id(),
        caller.user.name.clone(),
        body.rating,
        &body.comment,
    )?;

    let mut batch = WriteBatch::new();
    batch.insert(&review)?;
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict { .. } => ApiError::Conflict("item already reviewed".into()),
        other => other.into(),
    })?;

    tracing::info!(user_id = %caller.id(), %item, rating = review.rating, "Review posted");

    Ok(Json(review))
}

fn own_review(state: &AppState, caller: &Caller, item: &ItemRef) -> Result<Review, ApiError> {
    state
        .store
        .fetch::<Review>(&keys::review_key(item, &caller.id()))?
        .ok_or_else(|| ApiError::NotFound("review not found".into()))
}

/// Edit the caller's review.
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((item_type, item_id)): Path<(String, Uuid)>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    let mut review = own_review(&state, &caller, &item)?;
    review.edit(body.rating, &body.comment)?;
    state.store.save(&review)?;
    Ok(Json(review))
}

/// Delete the caller's review.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((item_type, item_id)): Path<(String, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let item = item_from_path(&item_type, item_id)?;
    let review = own_review(&state, &caller, &item)?;

    let mut batch = WriteBatch::new();
    batch.remove(&review);
    state.store.commit(batch)?;

    tracing::info!(user_id = %caller.id(), %item, "Review deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
