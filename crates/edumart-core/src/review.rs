//! Item reviews and rating summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemRef;
use crate::error::{EduError, Result};
use crate::{ReviewId, UserId};

/// Longest accepted review comment.
pub const MAX_COMMENT_LEN: usize = 2000;

/// A review. At most one per user per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Review ID.
    pub id: ReviewId,
    /// Reviewed item.
    pub item: ItemRef,
    /// Author.
    pub user_id: UserId,
    /// Author name at posting time.
    pub author_name: String,
    /// 1..=5 stars.
    pub rating: u8,
    /// Free text.
    pub comment: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit.
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Create a review after validating rating and comment.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for ratings outside 1..=5 or overlong comments.
    pub fn new(
        item: ItemRef,
        user_id: UserId,
        author_name: String,
        rating: u8,
        comment: &str,
    ) -> Result<Self> {
        let comment = validate(rating, comment)?;
        let now = Utc::now();
        Ok(Self {
            id: ReviewId::generate(),
            item,
            user_id,
            author_name,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace rating and comment.
    ///
    /// # Errors
    ///
    /// Same validation as [`Review::new`].
    pub fn edit(&mut self, rating: u8, comment: &str) -> Result<()> {
        self.comment = validate(rating, comment)?;
        self.rating = rating;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate(rating: u8, comment: &str) -> Result<String> {
    if !(1..=5).contains(&rating) {
        return Err(EduError::invalid("rating", "must be between 1 and 5"));
    }
    let comment = comment.trim();
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(EduError::invalid(
            "comment",
            format!("must be at most {MAX_COMMENT_LEN} characters"),
        ));
    }
    Ok(comment.to_string())
}

/// Aggregate rating of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of reviews.
    pub count: u64,
    /// Mean rating rounded to two decimals, 0 when there are none.
    pub average: f64,
    /// Counts for 1..=5 stars (index 0 is one star).
    pub histogram: [u64; 5],
}

impl RatingSummary {
    /// Summarize a set of reviews.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut summary = Self::default();
        let mut sum = 0u64;
        for review in reviews {
            let stars = review.rating.clamp(1, 5);
            summary.histogram[usize::from(stars - 1)] += 1;
            summary.count += 1;
            sum += u64::from(stars);
        }
        if summary.count > 0 {
            let avg = sum as f64 / summary.count as f64;
            summary.average = (avg * 100.0).round() / 100.0;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CourseId;

    fn review(rating: u8) -> Review {
        Review::new(
            ItemRef::Course(CourseId::generate()),
            UserId::generate(),
            "Ada".into(),
            rating,
            "good",
        )
        .unwrap()
    }

    #[test]
    fn rating_bounds() {
        let item = ItemRef::Course(CourseId::generate());
        assert!(Review::new(item, UserId::generate(), "A".into(), 0, "").is_err());
        assert!(Review::new(item, UserId::generate(), "A".into(), 6, "").is_err());
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(Review::new(item, UserId::generate(), "A".into(), 3, &long).is_err());
    }

    #[test]
    fn summary_average_and_histogram() {
        let reviews = [review(5), review(4), review(4)];
        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.count, 3);
        assert!((summary.average - 4.33).abs() < f64::EPSILON);
        assert_eq!(summary.histogram, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn empty_summary() {
        let summary = RatingSummary::from_reviews(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.average.abs() < f64::EPSILON);
    }

    #[test]
    fn edit_updates_rating() {
        let mut r = review(2);
        r.edit(5, "  changed my mind ").unwrap();
        assert_eq!(r.rating, 5);
        assert_eq!(r.comment, "changed my mind");
        assert!(r.edit(9, "").is_err());
        assert_eq!(r.rating, 5);
    }
}
