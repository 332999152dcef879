//! Coupon validation and admin coupon handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use edumart_core::{normalize_code, quote, Coupon, CouponRejection, CouponSpec, ItemRef, Quote};
use edumart_store::{Store, StoreError, StoreExt, Versioned, WriteBatch};

use crate::auth::{AdminCaller, Caller};
use crate::error::ApiError;
use crate::handlers::orders::{requested_items, priced_lines};
use crate::handlers::{Page, PageQuery};
use crate::state::AppState;

/// Coupon validation request.
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    /// Coupon code, any case.
    pub code: String,
    /// Items to quote; the caller's cart when omitted.
    #[serde(default)]
    pub items: Option<Vec<ItemRef>>,
}

/// Load a coupon by code. Unknown and malformed codes are both `Unknown`.
pub(crate) fn find_coupon(state: &AppState, code: &str) -> Result<Versioned<Coupon>, ApiError> {
    let Ok(code) = normalize_code(code) else {
        return Err(CouponRejection::Unknown.into());
    };
    state
        .store
        .fetch_versioned::<Coupon>(code.as_bytes())?
        .ok_or_else(|| CouponRejection::Unknown.into())
}

/// Quote items with a coupon without placing an order.
pub async fn validate_coupon(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<ValidateCouponRequest>,
) -> Result<Json<Quote>, ApiError> {
    let items = requested_items(&state, &caller, body.items)?;
    let lines = priced_lines(&state, &caller, &items)?;
    let coupon = find_coupon(&state, &body.code)?;

    let quote = quote(lines, Some(&coupon.value), Utc::now())?;

    tracing::debug!(
        user_id = %caller.id(),
        code = %coupon.value.code,
        discount_cents = quote.discount_cents,
        "Coupon validated"
    );

    Ok(Json(quote))
}

/// Create a coupon.
pub async fn create_coupon(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Json(spec): Json<CouponSpec>,
) -> Result<Json<Coupon>, ApiError> {
    let coupon = Coupon::new(spec, admin.user.id)?;

    let mut batch = WriteBatch::new();
    batch.insert(&coupon)?;
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict { .. } => {
            ApiError::Conflict(format!("coupon {} already exists", coupon.code))
        }
        other => other.into(),
    })?;

    tracing::info!(code = %coupon.code, admin_id = %admin.user.id, "Coupon created");

    Ok(Json(coupon))
}

/// List all coupons, newest first.
pub async fn list_coupons(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Coupon>>, ApiError> {
    let mut coupons: Vec<Coupon> = state.store.scan(&[])?;
    coupons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(Page::slice(coupons, query.limit, query.offset)))
}

/// Deactivate a coupon.
pub async fn deactivate_coupon(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Path(code): Path<String>,
) -> Result<Json<Coupon>, ApiError> {
    let coupon = state.transact("deactivate_coupon", || {
        let current = find_coupon(&state, &code).map_err(|e| match e {
            ApiError::CouponRejected(_) => ApiError::NotFound("coupon not found".into()),
            other => other,
        })?;
        let mut next = current.value.clone();
        next.is_active = false;

        let mut batch = WriteBatch::new();
        batch.replace(&current, &next)?;
        state.store.commit(batch)?;
        Ok(next)
    })?;

    tracing::info!(code = %coupon.code, admin_id = %admin.user.id, "Coupon deactivated");

    Ok(Json(coupon))
}
