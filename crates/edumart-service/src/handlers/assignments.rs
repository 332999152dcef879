//! Assignment and submission handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use edumart_core::{
    Assignment, AssignmentId, AssignmentSpec, Course, CourseId, Notification, NotificationKind,
    StudentAssignment, Submission, SubmissionId, SubmittedAnswer,
};
use edumart_store::{keys, Store, StoreError, StoreExt, WriteBatch};

use crate::access::{self, can_manage};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::notifications::notify;
use crate::state::AppState;

/// A submission request.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// One chosen option per question.
    pub answers: Vec<SubmittedAnswer>,
}

/// An assignment with or without its answer key, depending on the caller.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AssignmentView {
    /// Course managers see everything.
    Full(Assignment),
    /// Students do not see which options are correct.
    Student(StudentAssignment),
}

impl AssignmentView {
    fn for_caller(assignment: Assignment, manager: bool) -> Self {
        if manager {
            Self::Full(assignment)
        } else {
            Self::Student(assignment.student_view())
        }
    }
}

fn find_assignment(
    state: &AppState,
    course_id: CourseId,
    assignment_id: AssignmentId,
) -> Result<Assignment, ApiError> {
    state
        .store
        .fetch::<Assignment>(&keys::assignment_key(&course_id, &assignment_id))?
        .ok_or_else(|| ApiError::NotFound("assignment not found".into()))
}

fn accessible_course(state: &AppState, caller: &Caller, id: CourseId) -> Result<Course, ApiError> {
    let course = access::course(state, id)?;
    access::require_course_access(state, &caller.user, &course)?;
    Ok(course)
}

/// List a course's assignments. Students do not see the answer key.
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
) -> Result<Json<Vec<AssignmentView>>, ApiError> {
    let course = accessible_course(&state, &caller, id)?;
    let manager = can_manage(&caller.user, &course);

    let mut assignments: Vec<Assignment> = state.store.scan(id.as_bytes())?;
    assignments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(Json(
        assignments
            .into_iter()
            .map(|a| AssignmentView::for_caller(a, manager))
            .collect(),
    ))
}

/// Create an assignment.
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(spec): Json<AssignmentSpec>,
) -> Result<Json<Assignment>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_manager(&caller.user, &course)?;

    let assignment = Assignment::new(id, spec)?;
    let mut batch = WriteBatch::new();
    batch.insert(&assignment)?;
    state.store.commit(batch)?;

    tracing::info!(course_id = %id, assignment_id = %assignment.id, questions = assignment.questions.len(), "Assignment created");

    Ok(Json(assignment))
}

/// Get one assignment.
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, assignment_id)): Path<(CourseId, AssignmentId)>,
) -> Result<Json<AssignmentView>, ApiError> {
    let course = accessible_course(&state, &caller, id)?;
    let assignment = find_assignment(&state, id, assignment_id)?;
    Ok(Json(AssignmentView::for_caller(
        assignment,
        can_manage(&caller.user, &course),
    )))
}

fn own_submissions(
    state: &AppState,
    assignment_id: AssignmentId,
    caller: &Caller,
) -> Result<Vec<Submission>, ApiError> {
    Ok(state
        .store
        .scan(&keys::user_submissions_prefix(&assignment_id, &caller.id()))?)
}

/// Submit answers. The attempt is graded immediately.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, assignment_id)): Path<(CourseId, AssignmentId)>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<Submission>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_enrolled(&state, &caller.user, &course)?;
    let assignment = find_assignment(&state, id, assignment_id)?;

    let submission = state.transact("submit_assignment", || {
        let now = Utc::now();
        let previous = u32::try_from(own_submissions(&state, assignment_id, &caller)?.len())
            .unwrap_or(u32::MAX);
        assignment.ensure_open(previous, now)?;

        let submission = Submission {
            id: SubmissionId::generate(),
            assignment_id,
            user_id: caller.id(),
            attempt: previous + 1,
            grade: assignment.grade(&body.answers),
            answers: body.answers.clone(),
            submitted_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.insert(&submission)?;
        notify(
            &mut batch,
            &Notification::new(
                caller.id(),
                NotificationKind::AssignmentGraded,
                "Assignment graded",
                format!(
                    "{}: {}/{} ({}%), {}.",
                    assignment.title,
                    submission.grade.score,
                    submission.grade.max_score,
                    submission.grade.percent,
                    if submission.grade.passed { "passed" } else { "not passed" }
                ),
            )
            .with_link(format!("/courses/{id}/assignments/{assignment_id}")),
        )?;
        // A concurrent attempt took this number: recount.
        state.store.commit(batch).map_err(|e| match e {
            StoreError::Conflict { .. } => ApiError::Busy,
            other => other.into(),
        })?;
        Ok(submission)
    })?;

    tracing::info!(
        assignment_id = %assignment_id,
        user_id = %caller.id(),
        attempt = submission.attempt,
        score = submission.grade.score,
        passed = submission.grade.passed,
        "Assignment submitted"
    );

    Ok(Json(submission))
}

/// The caller's attempts, in order.
pub async fn my_submissions(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, assignment_id)): Path<(CourseId, AssignmentId)>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    accessible_course(&state, &caller, id)?;
    find_assignment(&state, id, assignment_id)?;
    Ok(Json(own_submissions(&state, assignment_id, &caller)?))
}

/// Every submission, for the course owner.
pub async fn all_submissions(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, assignment_id)): Path<(CourseId, AssignmentId)>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_manager(&caller.user, &course)?;
    find_assignment(&state, id, assignment_id)?;

    let mut submissions: Vec<Submission> = state.store.scan(assignment_id.as_bytes())?;
    submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
    Ok(Json(submissions))
}
