//! What a user owns and how far they got: entitlements, progress, certificates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemRef;
use crate::{CertificateId, CourseId, LessonId, OrderId, UserId};

/// Access to a purchased item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Owner.
    pub user_id: UserId,
    /// Owned item.
    pub item: ItemRef,
    /// Order that granted it.
    pub order_id: OrderId,
    /// Set when granted through a learning path rather than bought directly.
    pub via_path: bool,
    /// Grant time.
    pub granted_at: DateTime<Utc>,
}

/// Lesson completion for one user in one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseProgress {
    /// Student.
    pub user_id: UserId,
    /// Course.
    pub course_id: CourseId,
    /// Completed lessons.
    pub completed_lessons: BTreeSet<LessonId>,
    /// Set once every lesson was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Progress summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Completed lessons that still exist in the course.
    pub completed: usize,
    /// Lessons in the course.
    pub total: usize,
    /// Whole percent, rounded down.
    pub percent: u8,
    /// Whether the course is complete.
    pub is_complete: bool,
}

impl CourseProgress {
    /// Empty progress.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id,
            course_id,
            completed_lessons: BTreeSet::new(),
            completed_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Record a completed lesson. Returns `true` if this call completed the
    /// whole course (the first time only).
    pub fn complete_lesson(
        &mut self,
        lesson: LessonId,
        course_lessons: &[LessonId],
        now: DateTime<Utc>,
    ) -> bool {
        self.completed_lessons.insert(lesson);
        self.updated_at = now;
        if self.completed_at.is_none() && self.summary(course_lessons).is_complete {
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Summarize against the course's current lessons.
    #[must_use]
    pub fn summary(&self, course_lessons: &[LessonId]) -> ProgressSummary {
        let total = course_lessons.len();
        let completed = course_lessons
            .iter()
            .filter(|l| self.completed_lessons.contains(l))
            .count();
        let percent = if total == 0 {
            0
        } else {
            // completed <= total, so the quotient is at most 100.
            #[allow(clippy::cast_possible_truncation)]
            let pct = (completed * 100 / total) as u8;
            pct
        };
        ProgressSummary {
            completed,
            total,
            percent,
            is_complete: total > 0 && completed == total,
        }
    }
}

/// A signed course completion certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Certificate ID.
    pub id: CertificateId,
    /// Public serial printed on the certificate.
    pub serial: String,
    /// Recipient.
    pub user_id: UserId,
    /// Completed course.
    pub course_id: CourseId,
    /// Course title at issue time.
    pub course_title: String,
    /// Recipient name at issue time.
    pub student_name: String,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Hex HMAC over [`Certificate::signing_payload`].
    pub signature: String,
}

impl Certificate {
    /// Unsigned certificate with a fresh serial.
    #[must_use]
    pub fn unsigned(
        user_id: UserId,
        course_id: CourseId,
        course_title: String,
        student_name: String,
    ) -> Self {
        Self {
            id: CertificateId::generate(),
            serial: ulid::Ulid::new().to_string(),
            user_id,
            course_id,
            course_title,
            student_name,
            issued_at: Utc::now(),
            signature: String::new(),
        }
    }

    /// Canonical string the signature covers.
    #[must_use]
    pub fn signing_payload(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.serial,
            self.user_id,
            self.course_id,
            self.issued_at.timestamp()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_completes_once() {
        let lessons = vec![LessonId::generate(), LessonId::generate()];
        let mut progress = CourseProgress::new(UserId::generate(), CourseId::generate());
        let now = Utc::now();

        assert!(!progress.complete_lesson(lessons[0], &lessons, now));
        assert_eq!(progress.summary(&lessons).percent, 50);

        assert!(progress.complete_lesson(lessons[1], &lessons, now));
        assert!(progress.summary(&lessons).is_complete);

        // Repeating a lesson does not complete again.
        assert!(!progress.complete_lesson(lessons[1], &lessons, now));
    }

    #[test]
    fn summary_ignores_removed_lessons() {
        let kept = LessonId::generate();
        let removed = LessonId::generate();
        let mut progress = CourseProgress::new(UserId::generate(), CourseId::generate());
        progress.completed_lessons.insert(removed);

        let summary = progress.summary(&[kept]);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.total, 1);
        assert!(!summary.is_complete);
    }

    #[test]
    fn course_without_lessons_is_never_complete() {
        let progress = CourseProgress::new(UserId::generate(), CourseId::generate());
        let summary = progress.summary(&[]);
        assert_eq!(summary.percent, 0);
        assert!(!summary.is_complete);
    }

    #[test]
    fn signing_payload_covers_identity() {
        let cert = Certificate::unsigned(
            UserId::generate(),
            CourseId::generate(),
            "Rust".into(),
            "Ada".into(),
        );
        let payload = cert.signing_payload();
        assert!(payload.starts_with(&cert.serial));
        assert!(payload.contains(&cert.user_id.to_string()));
        assert!(payload.contains(&cert.course_id.to_string()));
    }
}
