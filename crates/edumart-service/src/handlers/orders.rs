//! Order placement, history and refunds.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use edumart_core::{
    quote, Coupon, Entitlement, ItemRef, LineItem, Notification, NotificationKind, Order,
    OrderId, UserId,
};
use edumart_store::{keys, schema::table, Store, StoreError, StoreExt, Versioned, WriteBatch};

use crate::access::{self, Product};
use crate::auth::{AdminCaller, Caller};
use crate::error::ApiError;
use crate::handlers::cart::cart_entries;
use crate::handlers::coupons::find_coupon;
use crate::handlers::notifications::notify;
use crate::handlers::{Page, PageQuery};
use crate::state::AppState;

/// Order placement request.
#[derive(Debug, Default, Deserialize)]
pub struct PlaceOrderRequest {
    /// Items to buy; the caller's cart when omitted.
    #[serde(default)]
    pub items: Option<Vec<ItemRef>>,
    /// Optional coupon code.
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// The items an order or quote covers: the explicit list, or the cart.
///
/// Empty and duplicate item lists are rejected.
pub(crate) fn requested_items(
    state: &AppState,
    caller: &Caller,
    items: Option<Vec<ItemRef>>,
) -> Result<Vec<ItemRef>, ApiError> {
    let items = match items {
        Some(items) => items,
        None => cart_entries(state, caller)?
            .into_iter()
            .map(|e| e.item)
            .collect(),
    };
    if items.is_empty() {
        return Err(ApiError::BadRequest("no items to order".into()));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = items.iter().find(|i| !seen.insert(**i)) {
        return Err(ApiError::BadRequest(format!("{dup} is listed twice")));
    }
    Ok(items)
}

fn priced_products(
    state: &AppState,
    caller: &Caller,
    items: &[ItemRef],
) -> Result<Vec<(Product, LineItem)>, ApiError> {
    items
        .iter()
        .map(|item| access::purchasable(state, &caller.user, item))
        .collect()
}

/// Price each item for the caller, refusing anything they cannot buy.
pub(crate) fn priced_lines(
    state: &AppState,
    caller: &Caller,
    items: &[ItemRef],
) -> Result<Vec<LineItem>, ApiError> {
    Ok(priced_products(state, caller, items)?
        .into_iter()
        .map(|(_, line)| line)
        .collect())
}

/// Format cents as dollars for notification text.
pub(crate) fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

/// Entitlements an order grants: one per item, plus the courses of any
/// learning path the buyer does not already own.
fn entitlements_for(
    state: &AppState,
    order: &Order,
    products: &[(Product, LineItem)],
) -> Result<(Vec<Entitlement>, Vec<Entitlement>), ApiError> {
    let now = order.created_at;
    let grant = |item: ItemRef, via_path: bool| Entitlement {
        user_id: order.user_id,
        item,
        order_id: order.id,
        via_path,
        granted_at: now,
    };

    let direct: Vec<Entitlement> = products
        .iter()
        .map(|(_, line)| grant(line.item, false))
        .collect();
    let mut covered: HashSet<ItemRef> = direct.iter().map(|e| e.item).collect();

    let mut via_path = Vec::new();
    for (product, _) in products {
        let Product::Path(path) = product else {
            continue;
        };
        for course_id in &path.course_ids {
            let item = ItemRef::Course(*course_id);
            if !covered.insert(item) {
                continue;
            }
            if access::is_entitled(state, order.user_id, &item)? {
                continue;
            }
            via_path.push(grant(item, true));
        }
    }
    Ok((direct, via_path))
}

fn order_batch(
    state: &AppState,
    order: &Order,
    products: &[(Product, LineItem)],
    coupon: Option<&Versioned<Coupon>>,
) -> Result<WriteBatch, ApiError> {
    let mut batch = WriteBatch::new();
    batch.insert(order)?;
    batch.insert_raw(
        table::ORDERS_BY_USER,
        keys::user_order_key(&order.user_id, &order.id),
        Vec::new(),
    );

    let (direct, via_path) = entitlements_for(state, order, products)?;
    for entitlement in &direct {
        batch.insert(entitlement)?;
        batch.delete(table::CART, keys::user_item_key(&order.user_id, &entitlement.item));
    }
    for entitlement in &via_path {
        batch.put(entitlement)?;
    }
    for entitlement in direct.iter().chain(&via_path) {
        batch.put_raw(
            table::ENTITLEMENTS_BY_ITEM,
            keys::item_user_key(&entitlement.item, &order.user_id),
            Vec::new(),
        );
    }

    if let Some(current) = coupon {
        let mut next = current.value.clone();
        next.used_count += 1;
        batch.replace(current, &next)?;
    }

    let count = order.items.len();
    notify(
        &mut batch,
        &Notification::new(
            order.user_id,
            NotificationKind::OrderPlaced,
            "Order confirmed",
            format!(
                "Your order of {count} item{} totalling {} is complete.",
                if count == 1 { "" } else { "s" },
                format_cents(order.total_cents)
            ),
        )
        .with_link(format!("/orders/{}", order.id)),
    )?;

    let instructors: BTreeSet<UserId> = order.items.iter().map(|i| i.instructor_id).collect();
    for instructor_id in instructors {
        let titles: Vec<&str> = order
            .items
            .iter()
            .filter(|i| i.instructor_id == instructor_id)
            .map(|i| i.title.as_str())
            .collect();
        notify(
            &mut batch,
            &Notification::new(
                instructor_id,
                NotificationKind::Sale,
                "You made a sale",
                format!("Sold: {}.", titles.join(", ")),
            ),
        )?;
    }

    Ok(batch)
}

/// Price and commit one order attempt. `coupon` is the coupon as last read;
/// if its usage count moved since, the commit answers `ApiError::Busy`.
fn commit_order(
    state: &AppState,
    caller: &Caller,
    items: &[ItemRef],
    coupon: Option<&Versioned<Coupon>>,
) -> Result<Order, ApiError> {
    let products = priced_products(state, caller, items)?;
    let commission = state.settings()?.commission_percent;

    let lines = products.iter().map(|(_, line)| line.clone()).collect();
    let quote = quote(lines, coupon.map(|c| &c.value), Utc::now())?;
    let order = Order::from_quote(caller.id(), quote, commission);

    let batch = order_batch(state, &order, &products, coupon)?;
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict {
            table: table::ENTITLEMENTS,
        } => ApiError::Conflict("item already owned".into()),
        other => other.into(),
    })?;
    Ok(order)
}

/// Place an order for the given items or the caller's cart.
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    let items = requested_items(&state, &caller, body.items)?;

    let order = state.transact("place_order", || {
        let coupon = body
            .coupon_code
            .as_deref()
            .map(|code| find_coupon(&state, code))
            .transpose()?;
        commit_order(&state, &caller, &items, coupon.as_ref())
    })?;

    tracing::info!(
        order_id = %order.id,
        user_id = %caller.id(),
        items = order.items.len(),
        total_cents = order.total_cents,
        coupon = ?order.coupon_code,
        "Order placed"
    );

    Ok(Json(order))
}

/// List the caller's orders, newest first.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Order>>, ApiError> {
    let mut ids: Vec<OrderId> = state
        .store
        .scan_prefix(table::ORDERS_BY_USER, caller.id().as_bytes())?
        .into_iter()
        .filter_map(|(key, _)| keys::order_id_from_user_key(&key))
        .collect();
    ids.reverse();

    let page = Page::slice(ids, query.limit, query.offset);
    let mut items = Vec::with_capacity(page.items.len());
    for id in &page.items {
        if let Some(order) = state.store.fetch::<Order>(&keys::order_key(id))? {
            items.push(order);
        }
    }

    Ok(Json(Page {
        items,
        total: page.total,
        has_more: page.has_more,
    }))
}

/// Get one order. Admins may read any order.
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .store
        .fetch::<Order>(&keys::order_key(&id))?
        .filter(|o| o.user_id == caller.id() || caller.user.is_admin())
        .ok_or_else(|| ApiError::NotFound("order not found".into()))?;
    Ok(Json(order))
}

/// Refund an order and revoke what it granted.
pub async fn refund_order(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, ApiError> {
    let order = state.transact("refund_order", || {
        let current = state
            .store
            .fetch_versioned::<Order>(&keys::order_key(&id))?
            .ok_or_else(|| ApiError::NotFound("order not found".into()))?;
        let mut next = current.value.clone();
        next.refund(Utc::now())?;

        let mut batch = WriteBatch::new();
        batch.replace(&current, &next)?;

        let granted: Vec<Entitlement> = state.store.scan(next.user_id.as_bytes())?;
        for entitlement in granted.iter().filter(|e| e.order_id == next.id) {
            batch.remove(entitlement);
            batch.delete(
                table::ENTITLEMENTS_BY_ITEM,
                keys::item_user_key(&entitlement.item, &entitlement.user_id),
            );
        }

        notify(
            &mut batch,
            &Notification::new(
                next.user_id,
                NotificationKind::OrderRefunded,
                "Order refunded",
                format!(
                    "Your order was refunded ({}).",
                    format_cents(next.total_cents)
                ),
            )
            .with_link(format!("/orders/{}", next.id)),
        )?;

        state.store.commit(batch)?;
        Ok(next)
    })?;

    tracing::info!(order_id = %order.id, admin_id = %admin.user.id, "Order refunded");

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use edumart_core::{
        ApprovalStatus, Course, CouponRejection, CouponSpec, Discount, ListingDetails, Role, User,
    };
    use edumart_store::MemoryStore;

    use crate::config::ServiceConfig;

    fn caller(state: &AppState, name: &str) -> Caller {
        let user = User::new(
            UserId::generate(),
            name,
            &format!("{}@example.com", name.to_lowercase()),
            Role::Student,
        )
        .unwrap();
        state.store.save(&user).unwrap();
        Caller { user }
    }

    fn approved_course(state: &AppState) -> ItemRef {
        let mut course = Course::new(
            UserId::generate(),
            ListingDetails {
                title: "Rust 101".into(),
                description: String::new(),
                category: None,
                price_cents: 2000,
                sale_price_cents: None,
            },
        )
        .unwrap();
        course.approval_status = ApprovalStatus::Approved;
        state.store.save(&course).unwrap();
        ItemRef::Course(course.id)
    }

    fn single_use_coupon(state: &AppState) -> String {
        let coupon = Coupon::new(
            CouponSpec {
                code: "once".into(),
                discount: Discount::Fixed { amount_cents: 500 },
                applies_to: None,
                min_order_cents: None,
                usage_limit: Some(1),
                starts_at: None,
                expires_at: None,
            },
            UserId::generate(),
        )
        .unwrap();
        state.store.save(&coupon).unwrap();
        coupon.code
    }

    #[test]
    fn coupon_redeemed_between_read_and_commit_is_retried() {
        let state = AppState::new(Arc::new(MemoryStore::new()), ServiceConfig::default());
        let course = approved_course(&state);
        let code = single_use_coupon(&state);
        let ann = caller(&state, "Ann");
        let bob = caller(&state, "Bob");

        // Bob reads the coupon, then Ann redeems it before Bob commits.
        let bobs_view = find_coupon(&state, &code).unwrap();
        let anns_view = find_coupon(&state, &code).unwrap();
        let order = commit_order(&state, &ann, &[course], Some(&anns_view)).unwrap();
        assert_eq!(order.discount_cents, 500);

        let stale = commit_order(&state, &bob, &[course], Some(&bobs_view));
        assert!(matches!(stale, Err(ApiError::Busy)));
        assert!(!access::is_entitled(&state, bob.id(), &course).unwrap());

        // The retry sees the spent coupon and stops at the usage limit.
        let retried = state.transact("place_order", || {
            let coupon = find_coupon(&state, &code)?;
            commit_order(&state, &bob, &[course], Some(&coupon))
        });
        assert!(matches!(
            retried,
            Err(ApiError::CouponRejected(CouponRejection::UsageLimitReached))
        ));

        let stored = find_coupon(&state, &code).unwrap().value;
        assert_eq!(stored.used_count, 1);
    }

    #[test]
    fn cents_format() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(4999), "$49.99");
        assert_eq!(format_cents(100_005), "$1000.05");
        assert_eq!(format_cents(-250), "-$2.50");
    }
}
