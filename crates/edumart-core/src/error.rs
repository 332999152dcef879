//! Error types for edumart domain rules.

use crate::coupon::CouponRejection;
use crate::ids::IdError;

/// Result type for edumart domain operations.
pub type Result<T> = std::result::Result<T, EduError>;

/// Errors raised while validating or applying domain rules.
#[derive(Debug, thiserror::Error)]
pub enum EduError {
    /// A field failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A coupon cannot be applied to the order.
    #[error("coupon rejected: {0}")]
    Coupon(#[from] CouponRejection),

    /// The item cannot be bought (pending approval, inactive, or owned by the buyer).
    #[error("item not purchasable: {0}")]
    NotPurchasable(String),

    /// The action is not allowed in the record's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl EduError {
    /// Shorthand for a field validation error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
