//! Course and lesson handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edumart_core::{
    ContentDetails, Course, CourseId, ItemRef, Lesson, LessonId, Listing, ListingDetails,
    RatingSummary, Review, User, UserId,
};
use edumart_store::{keys, Store, StoreExt, WriteBatch};

use crate::access::{self, require_manager};
use crate::auth::{Caller, MaybeCaller};
use crate::error::ApiError;
use crate::handlers::Page;
use crate::state::AppState;

/// Catalog search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive title substring.
    pub q: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Only items by this instructor.
    pub instructor_id: Option<UserId>,
    /// Page size.
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

impl CatalogQuery {
    /// Whether a public listing matches the filters.
    pub(crate) fn matches(&self, owner: UserId, details: &ListingDetails) -> bool {
        let title_ok = self.q.as_deref().map_or(true, |q| {
            details
                .title
                .to_lowercase()
                .contains(&q.trim().to_lowercase())
        });
        let category_ok = self.category.as_deref().map_or(true, |c| {
            details.category.as_deref() == Some(c.trim().to_lowercase().as_str())
        });
        let owner_ok = self.instructor_id.map_or(true, |id| id == owner);
        title_ok && category_ok && owner_ok
    }
}

/// List approved, active courses.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Course>>, ApiError> {
    let mut courses: Vec<Course> = state
        .store
        .scan::<Course>(&[])?
        .into_iter()
        .filter(|c| c.is_public() && query.matches(c.instructor_id, &c.details))
        .collect();
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(Page::slice(courses, query.limit, query.offset)))
}

/// Courses owned by the caller, any status.
pub async fn my_courses(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<Course>>, ApiError> {
    let mut courses: Vec<Course> = state
        .store
        .scan::<Course>(&[])?
        .into_iter()
        .filter(|c| c.instructor_id == caller.id() && c.is_active)
        .collect();
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(courses))
}

/// Create a course (pending approval).
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<ListingDetails>,
) -> Result<Json<Course>, ApiError> {
    if !caller.user.can_teach() {
        return Err(ApiError::Forbidden);
    }
    let course = Course::new(caller.id(), body)?;

    let mut batch = WriteBatch::new();
    batch.insert(&course)?;
    state.store.commit(batch)?;

    tracing::info!(course_id = %course.id, instructor_id = %caller.id(), "Course created");

    Ok(Json(course))
}

/// Course detail with rating summary.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    /// The course.
    #[serde(flatten)]
    pub course: Course,
    /// Number of lessons.
    pub lesson_count: usize,
    /// Review summary.
    pub rating: RatingSummary,
}

/// Get a course.
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CourseId>,
    viewer: MaybeCaller,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = access::visible_course(&state, id, viewer.user())?;
    let lesson_count = course_lessons(&state, id)?.len();
    let reviews: Vec<Review> = state
        .store
        .scan(&keys::reviews_prefix(&ItemRef::Course(id)))?;

    Ok(Json(CourseDetail {
        rating: RatingSummary::from_reviews(&reviews),
        lesson_count,
        course,
    }))
}

/// Replace a course's details. Approval status is kept.
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(body): Json<ListingDetails>,
) -> Result<Json<Course>, ApiError> {
    let mut course = access::course(&state, id)?;
    require_manager(&caller.user, &course)?;
    if !course.is_active {
        return Err(ApiError::NotFound("course not found".into()));
    }

    course.details = body.validated()?;
    course.updated_at = Utc::now();
    state.store.save(&course)?;

    tracing::info!(course_id = %id, user_id = %caller.id(), "Course updated");

    Ok(Json(course))
}

/// Soft-delete a course.
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut course = access::course(&state, id)?;
    require_manager(&caller.user, &course)?;

    course.is_active = false;
    course.updated_at = Utc::now();
    state.store.save(&course)?;

    tracing::info!(course_id = %id, user_id = %caller.id(), "Course deactivated");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ============================================================================
// Lessons
// ============================================================================

/// A lesson as shown to a viewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct LessonView {
    /// Lesson ID.
    pub id: LessonId,
    /// Parent course.
    pub course_id: CourseId,
    /// Title.
    pub title: String,
    /// Sort position.
    pub position: u32,
    /// Duration in minutes.
    pub duration_minutes: u32,
    /// Free preview.
    pub is_preview: bool,
    /// Body, when the viewer may read it.
    pub content: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl LessonView {
    fn new(lesson: Lesson, unlocked: bool) -> Self {
        let readable = unlocked || lesson.details.is_preview;
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            title: lesson.details.title,
            position: lesson.details.position,
            duration_minutes: lesson.details.duration_minutes,
            is_preview: lesson.details.is_preview,
            content: readable.then_some(lesson.details.content),
            created_at: lesson.created_at,
        }
    }
}

/// Lessons of a course ordered by position.
pub(crate) fn course_lessons(state: &AppState, id: CourseId) -> Result<Vec<Lesson>, ApiError> {
    let mut lessons: Vec<Lesson> = state.store.scan(id.as_bytes())?;
    lessons.sort_by(|a, b| {
        a.details
            .position
            .cmp(&b.details.position)
            .then(a.created_at.cmp(&b.created_at))
    });
    Ok(lessons)
}

fn unlocked_for(state: &AppState, viewer: Option<&User>, course: &Course) -> Result<bool, ApiError> {
    match viewer {
        Some(user) => access::has_course_access(state, user, course),
        None => Ok(false),
    }
}

/// List a course's lessons. Content is included for previews and for users
/// with course access.
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CourseId>,
    viewer: MaybeCaller,
) -> Result<Json<Vec<LessonView>>, ApiError> {
    let course = access::visible_course(&state, id, viewer.user())?;
    let unlocked = unlocked_for(&state, viewer.user(), &course)?;

    let lessons = course_lessons(&state, id)?
        .into_iter()
        .map(|l| LessonView::new(l, unlocked))
        .collect();
    Ok(Json(lessons))
}

/// Get one lesson.
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path((id, lesson_id)): Path<(CourseId, LessonId)>,
    viewer: MaybeCaller,
) -> Result<Json<LessonView>, ApiError> {
    let course = access::visible_course(&state, id, viewer.user())?;
    let lesson = find_lesson(&state, id, lesson_id)?;
    let unlocked = unlocked_for(&state, viewer.user(), &course)?;
    Ok(Json(LessonView::new(lesson, unlocked)))
}

pub(crate) fn find_lesson(
    state: &AppState,
    course_id: CourseId,
    lesson_id: LessonId,
) -> Result<Lesson, ApiError> {
    state
        .store
        .fetch::<Lesson>(&keys::lesson_key(&course_id, &lesson_id))?
        .ok_or_else(|| ApiError::NotFound("lesson not found".into()))
}

/// Add a lesson.
pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(body): Json<ContentDetails>,
) -> Result<Json<Lesson>, ApiError> {
    let course = access::course(&state, id)?;
    require_manager(&caller.user, &course)?;

    let lesson = Lesson {
        id: LessonId::generate(),
        course_id: id,
        details: body.validated()?,
        created_at: Utc::now(),
    };
    let mut batch = WriteBatch::new();
    batch.insert(&lesson)?;
    state.store.commit(batch)?;

    tracing::info!(course_id = %id, lesson_id = %lesson.id, "Lesson created");

    Ok(Json(lesson))
}

/// Replace a lesson's fields.
pub async fn update_lesson(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, lesson_id)): Path<(CourseId, LessonId)>,
    Json(body): Json<ContentDetails>,
) -> Result<Json<Lesson>, ApiError> {
    let course = access::course(&state, id)?;
    require_manager(&caller.user, &course)?;

    let mut lesson = find_lesson(&state, id, lesson_id)?;
    lesson.details = body.validated()?;
    state.store.save(&lesson)?;

    Ok(Json(lesson))
}

/// Remove a lesson.
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, lesson_id)): Path<(CourseId, LessonId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let course = access::course(&state, id)?;
    require_manager(&caller.user, &course)?;
    let lesson = find_lesson(&state, id, lesson_id)?;

    let mut batch = WriteBatch::new();
    batch.remove(&lesson);
    state.store.commit(batch)?;

    tracing::info!(course_id = %id, lesson_id = %lesson_id, "Lesson deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
