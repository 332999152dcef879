//! Scheduled live classes attached to a course.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};
use crate::{CourseId, LiveClassId, UserId};

/// Longest allowed session, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 600;

/// Where a class is in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveClassStatus {
    /// Not started yet.
    Upcoming,
    /// In progress.
    Live,
    /// Over.
    Ended,
}

/// Instructor input for scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveClassSpec {
    /// Title.
    pub title: String,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// Length in minutes.
    pub duration_minutes: u32,
    /// Video meeting URL.
    pub meeting_url: String,
    /// Seat limit.
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// A scheduled session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveClass {
    /// Class ID.
    pub id: LiveClassId,
    /// Owning course.
    pub course_id: CourseId,
    /// Host.
    pub instructor_id: UserId,
    /// Title.
    pub title: String,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// Length in minutes.
    pub duration_minutes: u32,
    /// Meeting URL, revealed to registered users only.
    pub meeting_url: String,
    /// Seat limit.
    pub capacity: Option<u32>,
    /// Seats taken.
    pub registered_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl LiveClass {
    /// Schedule a class.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` if the start is not in the future, the
    /// duration is outside 1..=600 minutes, the URL is not http(s), or the
    /// capacity is zero.
    pub fn schedule(
        course_id: CourseId,
        instructor_id: UserId,
        spec: LiveClassSpec,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let title = spec.title.trim();
        if title.is_empty() {
            return Err(EduError::invalid("title", "must not be empty"));
        }
        if spec.starts_at <= now {
            return Err(EduError::invalid("starts_at", "must be in the future"));
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&spec.duration_minutes) {
            return Err(EduError::invalid(
                "duration_minutes",
                format!("must be between 1 and {MAX_DURATION_MINUTES}"),
            ));
        }
        let url = spec.meeting_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(EduError::invalid("meeting_url", "must be an http(s) URL"));
        }
        if spec.capacity == Some(0) {
            return Err(EduError::invalid("capacity", "must be at least 1"));
        }
        Ok(Self {
            id: LiveClassId::generate(),
            course_id,
            instructor_id,
            title: title.to_string(),
            starts_at: spec.starts_at,
            duration_minutes: spec.duration_minutes,
            meeting_url: url.to_string(),
            capacity: spec.capacity,
            registered_count: 0,
            created_at: now,
        })
    }

    /// End time.
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Status at `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> LiveClassStatus {
        if now < self.starts_at {
            LiveClassStatus::Upcoming
        } else if now < self.ends_at() {
            LiveClassStatus::Live
        } else {
            LiveClassStatus::Ended
        }
    }

    /// Take a seat.
    ///
    /// # Errors
    ///
    /// Returns `EduError::InvalidState` if the class ended or is full.
    pub fn take_seat(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status(now) == LiveClassStatus::Ended {
            return Err(EduError::InvalidState("live class has ended".into()));
        }
        if self
            .capacity
            .is_some_and(|cap| self.registered_count >= cap)
        {
            return Err(EduError::InvalidState("live class is full".into()));
        }
        self.registered_count += 1;
        Ok(())
    }
}

/// A user's seat in a live class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRegistration {
    /// Class.
    pub class_id: LiveClassId,
    /// Registered user.
    pub user_id: UserId,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(starts_at: DateTime<Utc>, capacity: Option<u32>) -> LiveClassSpec {
        LiveClassSpec {
            title: "Office hours".into(),
            starts_at,
            duration_minutes: 60,
            meeting_url: "https://meet.example.com/abc".into(),
            capacity,
        }
    }

    #[test]
    fn status_follows_clock() {
        let now = Utc::now();
        let class = LiveClass::schedule(
            CourseId::generate(),
            UserId::generate(),
            spec(now + Duration::minutes(10), None),
            now,
        )
        .unwrap();

        assert_eq!(class.status(now), LiveClassStatus::Upcoming);
        assert_eq!(class.status(now + Duration::minutes(30)), LiveClassStatus::Live);
        assert_eq!(class.status(now + Duration::minutes(70)), LiveClassStatus::Ended);
    }

    #[test]
    fn capacity_is_enforced() {
        let now = Utc::now();
        let mut class = LiveClass::schedule(
            CourseId::generate(),
            UserId::generate(),
            spec(now + Duration::hours(1), Some(1)),
            now,
        )
        .unwrap();

        class.take_seat(now).unwrap();
        assert!(class.take_seat(now).is_err());
        assert_eq!(class.registered_count, 1);
    }

    #[test]
    fn cannot_join_after_end() {
        let now = Utc::now();
        let mut class = LiveClass::schedule(
            CourseId::generate(),
            UserId::generate(),
            spec(now + Duration::minutes(1), None),
            now,
        )
        .unwrap();
        assert!(class.take_seat(now + Duration::hours(2)).is_err());
    }

    #[test]
    fn schedule_validation() {
        let now = Utc::now();
        let course = CourseId::generate();
        let host = UserId::generate();
        assert!(LiveClass::schedule(course, host, spec(now, None), now).is_err());

        let mut bad = spec(now + Duration::hours(1), Some(0));
        assert!(LiveClass::schedule(course, host, bad.clone(), now).is_err());

        bad.capacity = None;
        bad.meeting_url = "ftp://nope".into();
        assert!(LiveClass::schedule(course, host, bad.clone(), now).is_err());

        bad.meeting_url = "https://ok".into();
        bad.duration_minutes = 0;
        assert!(LiveClass::schedule(course, host, bad, now).is_err());
    }
}
