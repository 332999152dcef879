//! Learning path handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use edumart_core::{Course, CourseId, LearningPath, LearningPathId, Listing};
use edumart_store::{Store, StoreExt, WriteBatch};

use crate::access::{self, require_manager};
use crate::auth::{Caller, MaybeCaller};
use crate::error::ApiError;
use crate::handlers::{Page, PageQuery};
use crate::state::AppState;

/// Learning path creation request.
#[derive(Debug, Deserialize)]
pub struct CreatePathRequest {
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Approved courses in study order.
    pub course_ids: Vec<CourseId>,
    /// Bundle price in cents.
    pub price_cents: i64,
}

/// List approved, active learning paths.
pub async fn list_paths(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<LearningPath>>, ApiError> {
    let mut paths: Vec<LearningPath> = state
        .store
        .scan::<LearningPath>(&[])?
        .into_iter()
        .filter(Listing::is_public)
        .collect();
    paths.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(Page::slice(paths, query.limit, query.offset)))
}

/// Create a learning path (pending approval).
pub async fn create_path(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<CreatePathRequest>,
) -> Result<Json<LearningPath>, ApiError> {
    if !caller.user.can_teach() {
        return Err(ApiError::Forbidden);
    }

    for id in &body.course_ids {
        let course = access::course(&state, *id)?;
        if !course.is_public() {
            return Err(ApiError::BadRequest(format!(
                "course {id} is not an approved, active course"
            )));
        }
    }

    let path = LearningPath::new(
        caller.id(),
        &body.title,
        body.description,
        body.course_ids,
        body.price_cents,
    )?;

    let mut batch = WriteBatch::new();
    batch.insert(&path)?;
    state.store.commit(batch)?;

    tracing::info!(path_id = %path.id, owner_id = %caller.id(), "Learning path created");

    Ok(Json(path))
}

/// Learning path with its courses resolved.
#[derive(Debug, Serialize)]
pub struct PathDetail {
    /// The path.
    #[serde(flatten)]
    pub path: LearningPath,
    /// Courses still in the catalog, in path order.
    pub courses: Vec<Course>,
}

/// Get a learning path.
pub async fn get_path(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LearningPathId>,
    viewer: MaybeCaller,
) -> Result<Json<PathDetail>, ApiError> {
    let path = access::learning_path(&state, id)?;
    if !path.visible_to(viewer.user()) {
        return Err(ApiError::NotFound("learning path not found".into()));
    }

    let mut courses = Vec::with_capacity(path.course_ids.len());
    for course_id in &path.course_ids {
        if let Some(course) = state.store.fetch::<Course>(course_id.as_bytes())? {
            courses.push(course);
        }
    }

    Ok(Json(PathDetail { path, courses }))
}

/// Soft-delete a learning path.
pub async fn delete_path(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<LearningPathId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut path = access::learning_path(&state, id)?;
    require_manager(&caller.user, &path)?;

    path.is_active = false;
    state.store.save(&path)?;

    tracing::info!(path_id = %id, user_id = %caller.id(), "Learning path deactivated");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
