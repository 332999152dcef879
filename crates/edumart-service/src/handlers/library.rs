//! Library, lesson progress and certificate handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edumart_core::{
    Certificate, Course, CourseId, CourseProgress, Entitlement, ItemRef, LessonId, Notification,
    NotificationKind, OrderId, ProgressSummary, User, UserId,
};
use edumart_store::{keys, schema::table, Store, StoreExt, Versioned, WriteBatch};

use crate::access;
use crate::auth::Caller;
use crate::crypto::{sign_certificate, verify_certificate};
use crate::error::ApiError;
use crate::handlers::catalog::{course_lessons, find_lesson};
use crate::handlers::notifications::notify;
use crate::state::AppState;

/// An owned item.
#[derive(Debug, Serialize, Deserialize)]
pub struct LibraryItem {
    /// The item.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Current title.
    pub title: String,
    /// Granting order.
    pub order_id: OrderId,
    /// Granted through a learning path.
    pub via_path: bool,
    /// Grant time.
    pub granted_at: DateTime<Utc>,
    /// Lesson progress, for courses.
    pub progress: Option<ProgressSummary>,
}

fn lesson_ids(state: &AppState, course_id: CourseId) -> Result<Vec<LessonId>, ApiError> {
    Ok(course_lessons(state, course_id)?
        .into_iter()
        .map(|l| l.id)
        .collect())
}

fn progress_summary(
    state: &AppState,
    user_id: UserId,
    course_id: CourseId,
) -> Result<ProgressSummary, ApiError> {
    let lessons = lesson_ids(state, course_id)?;
    let progress = state
        .store
        .fetch::<CourseProgress>(&keys::user_course_key(&user_id, &course_id))?
        .unwrap_or_else(|| CourseProgress::new(user_id, course_id));
    Ok(progress.summary(&lessons))
}

/// Everything the caller owns, most recent first.
pub async fn library(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<LibraryItem>>, ApiError> {
    let mut entitlements: Vec<Entitlement> = state.store.scan(caller.id().as_bytes())?;
    entitlements.sort_by(|a, b| b.granted_at.cmp(&a.granted_at));

    let mut items = Vec::with_capacity(entitlements.len());
    for entitlement in entitlements {
        let Some(product) = access::find_product(&state, &entitlement.item)? else {
            continue;
        };
        let progress = match entitlement.item {
            ItemRef::Course(course_id) => Some(progress_summary(&state, caller.id(), course_id)?),
            _ => None,
        };
        items.push(LibraryItem {
            item: entitlement.item,
            title: product.listing().title().to_string(),
            order_id: entitlement.order_id,
            via_path: entitlement.via_path,
            granted_at: entitlement.granted_at,
            progress,
        });
    }
    Ok(Json(items))
}

/// Progress in one course.
pub async fn course_progress(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_enrolled(&state, &caller.user, &course)?;
    Ok(Json(progress_summary(&state, caller.id(), id)?))
}

/// Result of completing a lesson.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Updated progress.
    pub progress: ProgressSummary,
    /// Certificate issued by this completion, if any.
    pub certificate: Option<Certificate>,
}

/// Apply one lesson completion on top of `current`, the progress as last
/// read. Answers `ApiError::Busy` if the stored progress changed since.
fn record_completion(
    state: &AppState,
    student: &User,
    course: &Course,
    lesson_id: LessonId,
    lessons: &[LessonId],
    current: Option<&Versioned<CourseProgress>>,
    now: DateTime<Utc>,
) -> Result<CompletionResponse, ApiError> {
    let mut progress = current.map_or_else(
        || CourseProgress::new(student.id, course.id),
        |v| v.value.clone(),
    );
    let finished = progress.complete_lesson(lesson_id, lessons, now);

    let mut batch = WriteBatch::new();
    batch.compare_and_put(current, &progress)?;

    let key = keys::user_course_key(&student.id, &course.id);
    let mut certificate = None;
    if finished && !state.store.contains(table::CERTIFICATES_BY_USER, &key)? {
        let mut cert = Certificate::unsigned(
            student.id,
            course.id,
            course.details.title.clone(),
            student.name.clone(),
        );
        cert.signature = sign_certificate(&state.config.certificate_secret, &cert)?;

        batch.insert(&cert)?;
        batch.insert_raw(
            table::CERTIFICATES_BY_USER,
            key,
            cert.serial.as_bytes().to_vec(),
        );
        notify(
            &mut batch,
            &Notification::new(
                student.id,
                NotificationKind::CertificateIssued,
                "Certificate issued",
                format!("You completed {}.", course.details.title),
            )
            .with_link(format!("/certificates/{}", cert.serial)),
        )?;
        certificate = Some(cert);
    }
    state.store.commit(batch)?;

    Ok(CompletionResponse {
        progress: progress.summary(lessons),
        certificate,
    })
}

/// Record a completed lesson; finishing the course issues a certificate.
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, lesson_id)): Path<(CourseId, LessonId)>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let course = access::course(&state, id)?;
    access::require_enrolled(&state, &caller.user, &course)?;
    let lesson = find_lesson(&state, id, lesson_id)?;
    let lessons = lesson_ids(&state, id)?;

    let key = keys::user_course_key(&caller.id(), &id);
    let completion = state.transact("complete_lesson", || {
        let current = state.store.fetch_versioned::<CourseProgress>(&key)?;
        record_completion(
            &state,
            &caller.user,
            &course,
            lesson.id,
            &lessons,
            current.as_ref(),
            Utc::now(),
        )
    })?;

    if let Some(cert) = &completion.certificate {
        tracing::info!(
            user_id = %caller.id(),
            course_id = %id,
            serial = %cert.serial,
            "Certificate issued"
        );
    }

    Ok(Json(completion))
}

/// The caller's certificates, newest first.
pub async fn my_certificates(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    let index = state
        .store
        .scan_prefix(table::CERTIFICATES_BY_USER, caller.id().as_bytes())?;

    let mut certificates = Vec::with_capacity(index.len());
    for (_, serial) in index {
        if let Some(cert) = state.store.fetch::<Certificate>(&serial)? {
            certificates.push(cert);
        }
    }
    certificates.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
    Ok(Json(certificates))
}

/// Certificate verification result.
#[derive(Debug, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the serial exists and its signature checks out.
    pub valid: bool,
    /// The certificate, when valid.
    pub certificate: Option<Certificate>,
}

/// Verify a certificate by serial. Public.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Path(serial): Path<String>,
) -> Result<Json<Verification>, ApiError> {
    let Some(cert) = state.store.fetch::<Certificate>(serial.trim().as_bytes())? else {
        return Ok(Json(Verification {
            valid: false,
            certificate: None,
        }));
    };

    let valid = verify_certificate(&state.config.certificate_secret, &cert)?;
    if !valid {
        tracing::warn!(serial = %cert.serial, "Certificate signature mismatch");
    }
    Ok(Json(Verification {
        valid,
        certificate: valid.then_some(cert),
    }))
}
