//! Request and response types for the edumart client.
//!
//! Domain records (courses, orders, notifications) come from `edumart-core`;
//! this module holds the API envelopes around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edumart_core::{
    Certificate, Course, ItemRef, OrderId, ProgressSummary, RatingSummary, SubmittedAnswer,
    UserId,
};

/// A page of results.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Items across all pages.
    pub total: usize,
    /// Whether more items follow.
    pub has_more: bool,
}

/// Catalog filters for [`crate::EdumartClient::list_courses`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseFilter {
    /// Case-insensitive title substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Exact category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Only courses by this instructor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<UserId>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Items to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl CourseFilter {
    /// Filter by title text only.
    #[must_use]
    pub fn search(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

/// Paging parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// A course with its lesson count and rating.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseDetail {
    /// The course.
    #[serde(flatten)]
    pub course: Course,
    /// Number of lessons.
    pub lesson_count: usize,
    /// Review summary.
    pub rating: RatingSummary,
}

/// A cart or wishlist entry as listed.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedItem {
    /// The item.
    #[serde(flatten)]
    pub item: ItemRef,
    /// Current title.
    pub title: String,
    /// Current price in cents.
    pub price_cents: i64,
    /// Whether it can still be bought.
    pub available: bool,
    /// When it was saved.
    pub added_at: DateTime<Utc>,
}

/// The caller's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartView {
    /// Entries, oldest first.
    pub items: Vec<SavedItem>,
    /// Sum of available item prices.
    pub subtotal_cents: i64,
}

/// An owned item in the caller's library.
#[derive(Debug, Clone, Deserialize)]
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

/// Coupon validation request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ValidateCouponRequest<'a> {
    pub code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<&'a [ItemRef]>,
}

/// Order placement request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PlaceOrderRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<&'a [ItemRef]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<&'a str>,
}

/// Assignment submission request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub answers: &'a [SubmittedAnswer],
}

/// Unread notification counter.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications.
    pub unread: usize,
}

/// Result of marking everything read.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkedRead {
    /// Notifications that changed.
    pub marked: usize,
}

/// Certificate verification result.
#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    /// Whether the serial exists and its signature checks out.
    pub valid: bool,
    /// The certificate, when valid.
    pub certificate: Option<Certificate>,
}

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
