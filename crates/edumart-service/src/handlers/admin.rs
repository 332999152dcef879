//! Admin handlers: users, approvals, revenue and settings.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use edumart_core::{
    ApprovalStatus, Book, Course, InstructorRevenue, ItemRef, ItemType, LearningPath, Listing,
    Notification, NotificationKind, Order, Period, PlatformSettings, RevenueReport, Role, User,
    UserId,
};
use edumart_store::{Store, StoreExt, WriteBatch};

use crate::access::{self, Product};
use crate::auth::{AdminCaller, Caller};
use crate::error::ApiError;
use crate::handlers::notifications::notify;
use crate::handlers::{Page, PageQuery};
use crate::state::AppState;

// ============================================================================
// Users
// ============================================================================

/// List users, oldest first.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<User>>, ApiError> {
    let mut users: Vec<User> = state.store.scan(&[])?;
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(Page::slice(users, query.limit, query.offset)))
}

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// New role.
    pub role: Role,
}

fn other_user(admin: &AdminCaller, state: &AppState, id: UserId) -> Result<User, ApiError> {
    if admin.user.id == id {
        return Err(ApiError::BadRequest("admins cannot change their own account".into()));
    }
    state
        .store
        .fetch::<User>(id.as_bytes())?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

/// Change a user's role.
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Path(id): Path<UserId>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<User>, ApiError> {
    let mut user = other_user(&admin, &state, id)?;
    user.role = body.role;
    user.updated_at = Utc::now();
    state.store.save(&user)?;

    tracing::info!(user_id = %id, role = ?user.role, admin_id = %admin.user.id, "Role changed");

    Ok(Json(user))
}

/// Deactivate a user.
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    let mut user = other_user(&admin, &state, id)?;
    user.is_active = false;
    user.updated_at = Utc::now();
    state.store.save(&user)?;

    tracing::info!(user_id = %id, admin_id = %admin.user.id, "User deactivated");

    Ok(Json(user))
}

// ============================================================================
// Approvals
// ============================================================================

/// Content awaiting review.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingItem {
    /// The item.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Title.
    pub title: String,
    /// Owner.
    pub owner_id: UserId,
    /// Price in cents.
    pub price_cents: i64,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl PendingItem {
    fn new(listing: &dyn Listing, created_at: DateTime<Utc>) -> Self {
        Self {
            item: listing.item_ref(),
            title: listing.title().to_string(),
            owner_id: listing.owner_id(),
            price_cents: listing.price_cents(),
            created_at,
        }
    }
}

fn awaiting(listing: &dyn Listing) -> bool {
    listing.approval_status() == ApprovalStatus::Pending && listing.is_active()
}

/// Everything awaiting approval, oldest first.
pub async fn pending(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
) -> Result<Json<Vec<PendingItem>>, ApiError> {
    let mut items = Vec::new();
    for course in state.store.scan::<Course>(&[])? {
        if awaiting(&course) {
            items.push(PendingItem::new(&course, course.created_at));
        }
    }
    for book in state.store.scan::<Book>(&[])? {
        if awaiting(&book) {
            items.push(PendingItem::new(&book, book.created_at));
        }
    }
    for path in state.store.scan::<LearningPath>(&[])? {
        if awaiting(&path) {
            items.push(PendingItem::new(&path, path.created_at));
        }
    }
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(items))
}

/// Approval decision.
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    /// Item type.
    pub item_type: ItemType,
    /// Item ID.
    pub item_id: Uuid,
    /// `approved` or `rejected`.
    pub status: ApprovalStatus,
}

/// Approve or reject an item and tell its owner.
pub async fn decide(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Json(body): Json<ApprovalRequest>,
) -> Result<Json<PendingItem>, ApiError> {
    if body.status == ApprovalStatus::Pending {
        return Err(ApiError::BadRequest(
            "status must be approved or rejected".into(),
        ));
    }
    let item = ItemRef::new(body.item_type, body.item_id);
    let product = access::find_product(&state, &item)?
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", item.item_type())))?;

    let mut batch = WriteBatch::new();
    let decided = match product {
        Product::Course(mut course) => {
            course.approval_status = body.status;
            course.updated_at = Utc::now();
            batch.put(&course)?;
            PendingItem::new(&course, course.created_at)
        }
        Product::Book(mut book) => {
            book.approval_status = body.status;
            book.updated_at = Utc::now();
            batch.put(&book)?;
            PendingItem::new(&book, book.created_at)
        }
        Product::Path(mut path) => {
            path.approval_status = body.status;
            batch.put(&path)?;
            PendingItem::new(&path, path.created_at)
        }
    };

    let verdict = match body.status {
        ApprovalStatus::Approved => "approved",
        _ => "rejected",
    };
    notify(
        &mut batch,
        &Notification::new(
            decided.owner_id,
            NotificationKind::ApprovalDecision,
            format!("Your {} was {verdict}", item.item_type()),
            format!("\"{}\" was {verdict} by the review team.", decided.title),
        ),
    )?;
    state.store.commit(batch)?;

    tracing::info!(%item, status = verdict, admin_id = %admin.user.id, "Approval decided");

    Ok(Json(decided))
}

// ============================================================================
// Revenue and settings
// ============================================================================

/// Report window.
#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    /// Inclusive start.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end.
    pub to: Option<DateTime<Utc>>,
}

impl RevenueQuery {
    fn period(&self) -> Result<Period, ApiError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if to <= from {
                return Err(ApiError::BadRequest("to must be after from".into()));
            }
        }
        Ok(Period {
            from: self.from,
            to: self.to,
        })
    }
}

fn report(state: &AppState, query: &RevenueQuery) -> Result<RevenueReport, ApiError> {
    let period = query.period()?;
    let orders: Vec<Order> = state.store.scan(&[])?;
    Ok(RevenueReport::build(&orders, period))
}

/// Platform-wide revenue per instructor.
pub async fn revenue(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, ApiError> {
    Ok(Json(report(&state, &query)?))
}

/// The caller's own revenue row.
pub async fn my_revenue(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<InstructorRevenue>, ApiError> {
    if !caller.user.can_teach() {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(report(&state, &query)?.for_instructor(caller.id())))
}

/// Current platform settings.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _admin: AdminCaller,
) -> Result<Json<PlatformSettings>, ApiError> {
    Ok(Json(state.settings()?))
}

/// Settings update.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    /// Commission percentage 0..=100.
    pub commission_percent: u8,
}

/// Replace the platform settings. Existing orders keep their snapshot.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    admin: AdminCaller,
    Json(body): Json<SettingsRequest>,
) -> Result<Json<PlatformSettings>, ApiError> {
    let settings = PlatformSettings::new(body.commission_percent)?;
    state.store.save(&settings)?;

    tracing::info!(
        commission_percent = settings.commission_percent,
        admin_id = %admin.user.id,
        "Platform settings updated"
    );

    Ok(Json(settings))
}
