//! Notification handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use edumart_core::{Notification, NotificationId};
use edumart_store::{keys, Store, StoreExt, WriteBatch};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::Page;
use crate::state::AppState;

/// Queue a notification in a batch.
pub(crate) fn notify(batch: &mut WriteBatch, notification: &Notification) -> Result<(), ApiError> {
    batch.insert(notification)?;
    Ok(())
}

/// Notification list parameters.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
    /// Page size.
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

fn newest_first(state: &AppState, caller: &Caller) -> Result<Vec<Notification>, ApiError> {
    let mut all: Vec<Notification> = state.store.scan(caller.id().as_bytes())?;
    all.reverse();
    Ok(all)
}

/// List the caller's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Page<Notification>>, ApiError> {
    let mut all = newest_first(&state, &caller)?;
    if query.unread_only {
        all.retain(|n| !n.is_read());
    }
    Ok(Json(Page::slice(all, query.limit, query.offset)))
}

/// Unread counter.
#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications.
    pub unread: usize,
}

/// Count the caller's unread notifications.
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread = newest_first(&state, &caller)?
        .iter()
        .filter(|n| !n.is_read())
        .count();
    Ok(Json(UnreadCount { unread }))
}

/// Mark one notification read. Already read notifications are returned as is.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, ApiError> {
    let mut notification = state
        .store
        .fetch::<Notification>(&keys::notification_key(&caller.id(), &id))?
        .ok_or_else(|| ApiError::NotFound("notification not found".into()))?;

    if notification.mark_read(Utc::now()) {
        state.store.save(&notification)?;
    }
    Ok(Json(notification))
}

/// Result of marking everything read.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkedRead {
    /// Notifications that changed.
    pub marked: usize,
}

/// Mark all of the caller's notifications read.
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<MarkedRead>, ApiError> {
    let now = Utc::now();
    let mut batch = WriteBatch::new();
    for mut notification in newest_first(&state, &caller)? {
        if notification.mark_read(now) {
            batch.put(&notification)?;
        }
    }

    let marked = batch.len();
    if !batch.is_empty() {
        state.store.commit(batch)?;
    }

    tracing::debug!(user_id = %caller.id(), marked, "Notifications marked read");

    Ok(Json(MarkedRead { marked }))
}
