//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NotificationId, UserId};

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The buyer's order went through.
    OrderPlaced,
    /// An instructor sold an item.
    Sale,
    /// An order was refunded.
    OrderRefunded,
    /// Submitted content was approved or rejected.
    ApprovalDecision,
    /// Someone answered the user's forum question.
    ForumAnswer,
    /// The user's answer was accepted.
    AnswerAccepted,
    /// A live class was scheduled in an owned course.
    LiveClassScheduled,
    /// A certificate was issued.
    CertificateIssued,
    /// An assignment submission was graded.
    AssignmentGraded,
}

/// A notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// ULID, so per-user keys sort by time.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Trigger.
    pub kind: NotificationKind,
    /// Headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Relative frontend link.
    pub link: Option<String>,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// New unread notification.
    #[must_use]
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            link: None,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a frontend link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Whether it has been read.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Mark read. Returns `false` if it already was.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_read_is_idempotent() {
        let mut n = Notification::new(UserId::generate(), NotificationKind::Sale, "Sold", "x")
            .with_link("/orders");
        assert!(!n.is_read());
        let first = Utc::now();
        assert!(n.mark_read(first));
        assert!(!n.mark_read(Utc::now()));
        assert_eq!(n.read_at, Some(first));
        assert_eq!(n.link.as_deref(), Some("/orders"));
    }
}
