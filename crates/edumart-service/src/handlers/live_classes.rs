//! Live class scheduling and registration handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edumart_core::{
    CourseId, ItemRef, LiveClass, LiveClassId, LiveClassSpec, LiveClassStatus,
    LiveRegistration, Notification, NotificationKind, UserId,
};
use edumart_store::{keys, schema::table, Store, StoreError, StoreExt, WriteBatch};

use crate::access::{self, can_manage};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::notifications::notify;
use crate::state::AppState;

/// A live class as shown to one viewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct LiveClassView {
    /// Class ID.
    pub id: LiveClassId,
    /// Course.
    pub course_id: CourseId,
    /// Host.
    pub instructor_id: UserId,
    /// Title.
    pub title: String,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// Length in minutes.
    pub duration_minutes: u32,
    /// Seat limit.
    pub capacity: Option<u32>,
    /// Seats taken.
    pub registered_count: u32,
    /// Status now.
    pub status: LiveClassStatus,
    /// Whether the viewer holds a seat.
    pub is_registered: bool,
    /// Meeting URL, for registered users, the host and admins.
    pub meeting_url: Option<String>,
}

impl LiveClassView {
    fn new(class: LiveClass, is_registered: bool, is_manager: bool, now: DateTime<Utc>) -> Self {
        Self {
            status: class.status(now),
            meeting_url: (is_registered || is_manager).then_some(class.meeting_url),
            id: class.id,
            course_id: class.course_id,
            instructor_id: class.instructor_id,
            title: class.title,
            starts_at: class.starts_at,
            duration_minutes: class.duration_minutes,
            capacity: class.capacity,
            registered_count: class.registered_count,
            is_registered,
        }
    }
}

fn is_registered(state: &AppState, class_id: LiveClassId, user_id: UserId) -> Result<bool, ApiError> {
    Ok(state
        .store
        .contains(table::LIVE_REGISTRATIONS, &keys::registration_key(&class_id, &user_id))?)
}

/// List a course's live classes by start time.
pub async fn list_live_classes(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
) -> Result<Json<Vec<LiveClassView>>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_course_access(&state, &caller.user, &course)?;
    let manager = can_manage(&caller.user, &course);

    let mut classes: Vec<LiveClass> = state.store.scan(id.as_bytes())?;
    classes.sort_by_key(|c| c.starts_at);

    let now = Utc::now();
    let mut views = Vec::with_capacity(classes.len());
    for class in classes {
        let registered = is_registered(&state, class.id, caller.id())?;
        views.push(LiveClassView::new(class, registered, manager, now));
    }
    Ok(Json(views))
}

/// Schedule a live class and notify everyone enrolled.
pub async fn schedule_live_class(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(spec): Json<LiveClassSpec>,
) -> Result<Json<LiveClassView>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_manager(&caller.user, &course)?;

    let now = Utc::now();
    let class = LiveClass::schedule(id, course.instructor_id, spec, now)?;

    let mut batch = WriteBatch::new();
    batch.insert(&class)?;

    let enrolled: Vec<UserId> = state
        .store
        .scan_prefix(
            table::ENTITLEMENTS_BY_ITEM,
            &keys::item_key(&ItemRef::Course(id)),
        )?
        .into_iter()
        .filter_map(|(key, _)| keys::user_id_from_item_key(&key))
        .collect();
    let mut notified = 0usize;
    for user_id in enrolled {
        notify(
            &mut batch,
            &Notification::new(
                user_id,
                NotificationKind::LiveClassScheduled,
                "Live class scheduled",
                format!(
                    "{} in {} starts {}.",
                    class.title,
                    course.details.title,
                    class.starts_at.format("%Y-%m-%d %H:%M UTC")
                ),
            )
            .with_link(format!("/courses/{id}/live-classes")),
        )?;
        notified += 1;
    }
    state.store.commit(batch)?;

    tracing::info!(course_id = %id, class_id = %class.id, notified, "Live class scheduled");

    Ok(Json(LiveClassView::new(class, false, true, now)))
}

/// Take a seat in a live class.
pub async fn register(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, class_id)): Path<(CourseId, LiveClassId)>,
) -> Result<Json<LiveClassView>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_enrolled(&state, &caller.user, &course)?;

    let now = Utc::now();
    let class = state.transact("register_live_class", || {
        let current = state
            .store
            .fetch_versioned::<LiveClass>(&keys::live_class_key(&id, &class_id))?
            .ok_or_else(|| ApiError::NotFound("live class not found".into()))?;
        let mut next = current.value.clone();
        next.take_seat(now)?;

        let mut batch = WriteBatch::new();
        batch.replace(&current, &next)?;
        batch.insert(&LiveRegistration {
            class_id,
            user_id: caller.id(),
            registered_at: now,
        })?;
        state.store.commit(batch).map_err(|e| match e {
            StoreError::Conflict { .. } => ApiError::Conflict("already registered".into()),
            other => other.into(),
        })?;
        Ok(next)
    })?;

    tracing::info!(class_id = %class_id, user_id = %caller.id(), seats = class.registered_count, "Registered for live class");

    Ok(Json(LiveClassView::new(class, true, false, now)))
}
