//! Course Q&A forum: threads (questions) and posts (answers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};
use crate::{CourseId, PostId, ThreadId, UserId};

/// Longest accepted question or answer body.
pub const MAX_BODY_LEN: usize = 10_000;

/// A question asked in a course forum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Thread ID.
    pub id: ThreadId,
    /// Course the question belongs to.
    pub course_id: CourseId,
    /// Asker.
    pub author_id: UserId,
    /// Asker name at posting time.
    pub author_name: String,
    /// Question title.
    pub title: String,
    /// Question body.
    pub body: String,
    /// Accepted answer, if any.
    pub accepted_post_id: Option<PostId>,
    /// Number of answers.
    pub answer_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity (new answer or acceptance).
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Create a thread.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a blank title or body, or an overlong body.
    pub fn new(
        course_id: CourseId,
        author_id: UserId,
        author_name: String,
        title: &str,
        body: &str,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() || title.chars().count() > crate::catalog::MAX_TITLE_LEN {
            return Err(EduError::invalid("title", "must be 1 to 200 characters"));
        }
        let body = validate_body(body)?;
        let now = Utc::now();
        Ok(Self {
            id: ThreadId::generate(),
            course_id,
            author_id,
            author_name,
            title: title.to_string(),
            body,
            accepted_post_id: None,
            answer_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether an answer has been accepted.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.accepted_post_id.is_some()
    }

    /// Accept an answer. Only the asker may accept, and only once.
    ///
    /// # Errors
    ///
    /// Returns `EduError::InvalidState` if the caller is not the asker, the
    /// post belongs to another thread, or an answer was already accepted.
    pub fn accept(&mut self, caller: UserId, post: &Post) -> Result<()> {
        if caller != self.author_id {
            return Err(EduError::InvalidState(
                "only the asker can accept an answer".into(),
            ));
        }
        if post.thread_id != self.id {
            return Err(EduError::InvalidState("answer belongs to another thread".into()));
        }
        if self.is_resolved() {
            return Err(EduError::InvalidState("an answer was already accepted".into()));
        }
        self.accepted_post_id = Some(post.id);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// An answer in a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Post ID.
    pub id: PostId,
    /// Parent thread.
    pub thread_id: ThreadId,
    /// Author.
    pub author_id: UserId,
    /// Author name at posting time.
    pub author_name: String,
    /// Answer body.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create an answer.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a blank or overlong body.
    pub fn new(thread_id: ThreadId, author_id: UserId, author_name: String, body: &str) -> Result<Self> {
        Ok(Self {
            id: PostId::generate(),
            thread_id,
            author_id,
            author_name,
            body: validate_body(body)?,
            created_at: Utc::now(),
        })
    }
}

fn validate_body(body: &str) -> Result<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(EduError::invalid("body", "must not be empty"));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(EduError::invalid(
            "body",
            format!("must be at most {MAX_BODY_LEN} characters"),
        ));
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_asker_accepts_once() {
        let asker = UserId::generate();
        let helper = UserId::generate();
        let mut thread =
            Thread::new(CourseId::generate(), asker, "Ada".into(), "Lifetimes?", "How?").unwrap();
        let post = Post::new(thread.id, helper, "Bob".into(), "Like this").unwrap();

        assert!(thread.accept(helper, &post).is_err());
        thread.accept(asker, &post).unwrap();
        assert!(thread.is_resolved());
        assert!(thread.accept(asker, &post).is_err());
    }

    #[test]
    fn foreign_post_cannot_be_accepted() {
        let asker = UserId::generate();
        let mut thread =
            Thread::new(CourseId::generate(), asker, "Ada".into(), "Q", "body").unwrap();
        let other = Post::new(ThreadId::generate(), asker, "Ada".into(), "x").unwrap();
        assert!(thread.accept(asker, &other).is_err());
    }

    #[test]
    fn blank_content_is_rejected() {
        let id = UserId::generate();
        assert!(Thread::new(CourseId::generate(), id, "A".into(), " ", "body").is_err());
        assert!(Thread::new(CourseId::generate(), id, "A".into(), "T", "  ").is_err());
        assert!(Post::new(ThreadId::generate(), id, "A".into(), "").is_err());
    }
}
