//! Course Q&A forum handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use edumart_core::{
    Course, CourseId, Notification, NotificationKind, Post, PostId, Thread, ThreadId,
};
use edumart_store::{keys, Store, StoreExt, Versioned, WriteBatch};

use crate::access;
use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::notifications::notify;
use crate::handlers::{Page, PageQuery};
use crate::state::AppState;

/// New question.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Question title.
    pub title: String,
    /// Question body.
    pub body: String,
}

/// New answer.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Answer body.
    pub body: String,
}

/// Accept request.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    /// Answer to accept.
    pub post_id: PostId,
}

/// A thread with its answers, oldest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadDetail {
    /// The question.
    #[serde(flatten)]
    pub thread: Thread,
    /// Answers.
    pub posts: Vec<Post>,
}

fn accessible_course(state: &AppState, caller: &Caller, id: CourseId) -> Result<Course, ApiError> {
    let course = access::course(state, id)?;
    access::require_course_access(state, &caller.user, &course)?;
    Ok(course)
}

fn thread_versioned(
    state: &AppState,
    course_id: CourseId,
    thread_id: ThreadId,
) -> Result<Versioned<Thread>, ApiError> {
    state
        .store
        .fetch_versioned::<Thread>(&keys::thread_key(&course_id, &thread_id))?
        .ok_or_else(|| ApiError::NotFound("thread not found".into()))
}

fn thread_posts(state: &AppState, thread_id: ThreadId) -> Result<Vec<Post>, ApiError> {
    let mut posts: Vec<Post> = state.store.scan(thread_id.as_bytes())?;
    posts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(posts)
}

/// List a course's threads, newest first.
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Thread>>, ApiError> {
    accessible_course(&state, &caller, id)?;

    let mut threads: Vec<Thread> = state.store.scan(id.as_bytes())?;
    threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(Page::slice(threads, query.limit, query.offset)))
}

/// Ask a question.
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(body): Json<AskRequest>,
) -> Result<Json<Thread>, ApiError> {
    accessible_course(&state, &caller, id)?;

    let thread = Thread::new(
        id,
        caller.id(),
        caller.user.name.clone(),
        &body.title,
        &body.body,
    )?;
    let mut batch = WriteBatch::new();
    batch.insert(&thread)?;
    state.store.commit(batch)?;

    tracing::info!(course_id = %id, thread_id = %thread.id, user_id = %caller.id(), "Question asked");

    Ok(Json(thread))
}

/// Get a thread with its answers.
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, thread_id)): Path<(CourseId, ThreadId)>,
) -> Result<Json<ThreadDetail>, ApiError> {
    accessible_course(&state, &caller, id)?;
    let thread = thread_versioned(&state, id, thread_id)?.into_inner();
    let posts = thread_posts(&state, thread_id)?;
    Ok(Json(ThreadDetail { thread, posts }))
}

/// Answer a question. The asker is notified unless they answered themselves.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, thread_id)): Path<(CourseId, ThreadId)>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<Post>, ApiError> {
    let course = accessible_course(&state, &caller, id)?;
    let post = Post::new(thread_id, caller.id(), caller.user.name.clone(), &body.body)?;

    state.transact("create_post", || {
        let current = thread_versioned(&state, id, thread_id)?;
        let mut next = current.value.clone();
        next.answer_count += 1;
        next.updated_at = post.created_at;

        let mut batch = WriteBatch::new();
        batch.replace(&current, &next)?;
        batch.insert(&post)?;
        if next.author_id != caller.id() {
            notify(
                &mut batch,
                &Notification::new(
                    next.author_id,
                    NotificationKind::ForumAnswer,
                    "New answer to your question",
                    format!("{} answered \"{}\" in {}.", post.author_name, next.title, course.details.title),
                )
                .with_link(format!("/courses/{id}/threads/{thread_id}")),
            )?;
        }
        state.store.commit(batch)?;
        Ok(())
    })?;

    tracing::info!(thread_id = %thread_id, post_id = %post.id, user_id = %caller.id(), "Answer posted");

    Ok(Json(post))
}

/// Accept an answer. Only the asker may accept.
pub async fn accept_post(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, thread_id)): Path<(CourseId, ThreadId)>,
    Json(body): Json<AcceptRequest>,
) -> Result<Json<Thread>, ApiError> {
    accessible_course(&state, &caller, id)?;
    let post = state
        .store
        .fetch::<Post>(&keys::post_key(&thread_id, &body.post_id))?
        .ok_or_else(|| ApiError::NotFound("answer not found".into()))?;

    let thread = state.transact("accept_post", || {
        let current = thread_versioned(&state, id, thread_id)?;
        if current.value.author_id != caller.id() {
            return Err(ApiError::Forbidden);
        }
        let mut next = current.value.clone();
        next.accept(caller.id(), &post)?;

        let mut batch = WriteBatch::new();
        batch.replace(&current, &next)?;
        if post.author_id != caller.id() {
            notify(
                &mut batch,
                &Notification::new(
                    post.author_id,
                    NotificationKind::AnswerAccepted,
                    "Your answer was accepted",
                    format!("Your answer to \"{}\" was accepted.", next.title),
                )
                .with_link(format!("/courses/{id}/threads/{thread_id}")),
            )?;
        }
        state.store.commit(batch)?;
        Ok(next)
    })?;

    tracing::info!(thread_id = %thread_id, post_id = %post.id, "Answer accepted");

    Ok(Json(thread))
}
