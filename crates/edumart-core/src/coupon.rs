//! Coupons and the discount rules.
//!
//! A coupon either takes a percentage off the eligible subtotal (optionally
//! capped) or a fixed amount. The discount never exceeds the eligible
//! subtotal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemType;
use crate::error::{EduError, Result};
use crate::{CouponId, UserId};

/// Shortest accepted coupon code.
pub const MIN_CODE_LEN: usize = 3;

/// Longest accepted coupon code.
pub const MAX_CODE_LEN: usize = 32;

/// How a coupon reduces the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discount_type", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the eligible subtotal, optionally capped.
    Percentage {
        /// 1..=100.
        percent: u8,
        /// Upper bound on the discount in cents.
        #[serde(default)]
        max_discount_cents: Option<i64>,
    },
    /// Fixed amount off.
    Fixed {
        /// Amount in cents, > 0.
        amount_cents: i64,
    },
}

impl Discount {
    /// Discount in cents for the given eligible subtotal.
    ///
    /// Always within `0..=subtotal_cents`.
    #[must_use]
    pub fn amount_for(&self, subtotal_cents: i64) -> i64 {
        let subtotal_cents = subtotal_cents.max(0);
        let raw = match self {
            Self::Percentage {
                percent,
                max_discount_cents,
            } => {
                let pct = subtotal_cents * i64::from(*percent) / 100;
                max_discount_cents.map_or(pct, |max| pct.min(max))
            }
            Self::Fixed { amount_cents } => *amount_cents,
        };
        raw.clamp(0, subtotal_cents)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Percentage {
                percent,
                max_discount_cents,
            } => {
                if !(1..=100).contains(percent) {
                    return Err(EduError::invalid("percent", "must be between 1 and 100"));
                }
                if max_discount_cents.is_some_and(|max| max <= 0) {
                    return Err(EduError::invalid("max_discount_cents", "must be positive"));
                }
            }
            Self::Fixed { amount_cents } => {
                if *amount_cents <= 0 {
                    return Err(EduError::invalid("amount_cents", "must be positive"));
                }
            }
        }
        Ok(())
    }
}

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CouponRejection {
    /// No coupon with that code.
    #[error("unknown coupon code")]
    Unknown,
    /// Deactivated by an admin.
    #[error("coupon is no longer active")]
    Inactive,
    /// Before `starts_at`.
    #[error("coupon is not valid yet")]
    NotStarted,
    /// At or after `expires_at`.
    #[error("coupon has expired")]
    Expired,
    /// `used_count` reached `usage_limit`.
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    /// Eligible subtotal below `min_order_cents`.
    #[error("order total is below the coupon minimum")]
    MinimumNotMet,
    /// No line in the order matches the coupon's item type.
    #[error("coupon does not apply to these items")]
    NotApplicable,
}

impl CouponRejection {
    /// Stable machine-readable reason.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Inactive => "inactive",
            Self::NotStarted => "not_started",
            Self::Expired => "expired",
            Self::UsageLimitReached => "usage_limit_reached",
            Self::MinimumNotMet => "minimum_not_met",
            Self::NotApplicable => "not_applicable",
        }
    }
}

/// Admin input for a new coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponSpec {
    /// Code customers type in (case-insensitive).
    pub code: String,
    /// Discount rule.
    pub discount: Discount,
    /// Restrict to one item type.
    #[serde(default)]
    pub applies_to: Option<ItemType>,
    /// Minimum eligible subtotal in cents.
    #[serde(default)]
    pub min_order_cents: Option<i64>,
    /// Maximum number of orders that may use it.
    #[serde(default)]
    pub usage_limit: Option<u32>,
    /// Not valid before.
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Not valid from this instant on.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A discount coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon ID.
    pub id: CouponId,
    /// Upper-case code, unique.
    pub code: String,
    /// Discount rule.
    pub discount: Discount,
    /// Restrict to one item type.
    pub applies_to: Option<ItemType>,
    /// Minimum eligible subtotal in cents.
    pub min_order_cents: Option<i64>,
    /// Maximum number of orders that may use it.
    pub usage_limit: Option<u32>,
    /// Orders that used it so far.
    pub used_count: u32,
    /// Not valid before.
    pub starts_at: Option<DateTime<Utc>>,
    /// Not valid from this instant on.
    pub expires_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Admin who created it.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Create an active coupon from an admin spec.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a malformed code, an invalid discount,
    /// a negative minimum, a zero usage limit, or an empty validity window.
    pub fn new(spec: CouponSpec, created_by: UserId) -> Result<Self> {
        let code = normalize_code(&spec.code)?;
        spec.discount.validate()?;
        if spec.min_order_cents.is_some_and(|min| min < 0) {
            return Err(EduError::invalid("min_order_cents", "must not be negative"));
        }
        if spec.usage_limit == Some(0) {
            return Err(EduError::invalid("usage_limit", "must be at least 1"));
        }
        if let (Some(start), Some(end)) = (spec.starts_at, spec.expires_at) {
            if end <= start {
                return Err(EduError::invalid("expires_at", "must be after starts_at"));
            }
        }
        Ok(Self {
            id: CouponId::generate(),
            code,
            discount: spec.discount,
            applies_to: spec.applies_to,
            min_order_cents: spec.min_order_cents,
            usage_limit: spec.usage_limit,
            used_count: 0,
            starts_at: spec.starts_at,
            expires_at: spec.expires_at,
            is_active: true,
            created_by,
            created_at: Utc::now(),
        })
    }

    /// Whether lines of this type count towards the coupon.
    #[must_use]
    pub fn covers(&self, item_type: ItemType) -> bool {
        self.applies_to.map_or(true, |t| t == item_type)
    }

    /// Check the coupon against the clock and the eligible subtotal.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`CouponRejection`], checked in order:
    /// inactive, not started, expired, usage limit, not applicable, minimum.
    pub fn check(
        &self,
        now: DateTime<Utc>,
        eligible_lines: usize,
        eligible_subtotal_cents: i64,
    ) -> std::result::Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(CouponRejection::NotStarted);
        }
        if self.expires_at.is_some_and(|end| now >= end) {
            return Err(CouponRejection::Expired);
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.used_count >= limit)
        {
            return Err(CouponRejection::UsageLimitReached);
        }
        if eligible_lines == 0 {
            return Err(CouponRejection::NotApplicable);
        }
        if self
            .min_order_cents
            .is_some_and(|min| eligible_subtotal_cents < min)
        {
            return Err(CouponRejection::MinimumNotMet);
        }
        Ok(())
    }
}

/// Normalize a coupon code to upper case.
///
/// # Errors
///
/// Returns `EduError::Invalid` unless the code is 3..=32 characters of
/// `A-Z`, `0-9`, `-` or `_`.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    let len = code.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return Err(EduError::invalid(
            "code",
            format!("must be {MIN_CODE_LEN} to {MAX_CODE_LEN} characters"),
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(EduError::invalid(
            "code",
            "may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn spec(discount: Discount) -> CouponSpec {
        CouponSpec {
            code: "spring-25".into(),
            discount,
            applies_to: None,
            min_order_cents: None,
            usage_limit: None,
            starts_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn percentage_discount_is_capped() {
        let d = Discount::Percentage {
            percent: 50,
            max_discount_cents: Some(1500),
        };
        assert_eq!(d.amount_for(2000), 1000);
        assert_eq!(d.amount_for(10_000), 1500);
    }

    #[test]
    fn percentage_discount_floors_fractions() {
        let d = Discount::Percentage {
            percent: 15,
            max_discount_cents: None,
        };
        // 15% of 999 = 149.85
        assert_eq!(d.amount_for(999), 149);
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let d = Discount::Fixed { amount_cents: 5000 };
        assert_eq!(d.amount_for(12_000), 5000);
        assert_eq!(d.amount_for(3000), 3000);
        assert_eq!(d.amount_for(0), 0);
    }

    #[test]
    fn code_is_upper_cased() {
        let coupon = Coupon::new(
            spec(Discount::Fixed { amount_cents: 100 }),
            UserId::generate(),
        )
        .unwrap();
        assert_eq!(coupon.code, "SPRING-25");
        assert!(normalize_code("ab").is_err());
        assert!(normalize_code("has space").is_err());
    }

    #[test]
    fn invalid_discounts_are_rejected() {
        let admin = UserId::generate();
        let zero_pct = Discount::Percentage {
            percent: 0,
            max_discount_cents: None,
        };
        let over_pct = Discount::Percentage {
            percent: 101,
            max_discount_cents: None,
        };
        assert!(Coupon::new(spec(zero_pct), admin).is_err());
        assert!(Coupon::new(spec(over_pct), admin).is_err());
        assert!(Coupon::new(spec(Discount::Fixed { amount_cents: 0 }), admin).is_err());
    }

    #[test]
    fn expired_coupon_is_rejected() {
        let now = Utc::now();
        let mut s = spec(Discount::Fixed { amount_cents: 100 });
        s.expires_at = Some(now);
        let coupon = Coupon::new(s, UserId::generate()).unwrap();
        assert_eq!(coupon.check(now, 1, 1000), Err(CouponRejection::Expired));
        assert_eq!(
            coupon.check(now - Duration::seconds(1), 1, 1000),
            Ok(())
        );
    }

    #[test]
    fn not_started_and_inactive() {
        let now = Utc::now();
        let mut s = spec(Discount::Fixed { amount_cents: 100 });
        s.starts_at = Some(now + Duration::hours(1));
        let mut coupon = Coupon::new(s, UserId::generate()).unwrap();
        assert_eq!(coupon.check(now, 1, 1000), Err(CouponRejection::NotStarted));

        coupon.is_active = false;
        assert_eq!(coupon.check(now, 1, 1000), Err(CouponRejection::Inactive));
    }

    #[test]
    fn usage_limit_and_minimum() {
        let now = Utc::now();
        let mut s = spec(Discount::Fixed { amount_cents: 100 });
        s.usage_limit = Some(2);
        s.min_order_cents = Some(1000);
        let mut coupon = Coupon::new(s, UserId::generate()).unwrap();

        assert_eq!(coupon.check(now, 1, 999), Err(CouponRejection::MinimumNotMet));
        assert_eq!(coupon.check(now, 1, 1000), Ok(()));
        assert_eq!(coupon.check(now, 0, 0), Err(CouponRejection::NotApplicable));

        coupon.used_count = 2;
        assert_eq!(
            coupon.check(now, 1, 5000),
            Err(CouponRejection::UsageLimitReached)
        );
    }

    #[test]
    fn coverage_by_item_type() {
        let mut s = spec(Discount::Fixed { amount_cents: 100 });
        s.applies_to = Some(ItemType::Book);
        let coupon = Coupon::new(s, UserId::generate()).unwrap();
        assert!(coupon.covers(ItemType::Book));
        assert!(!coupon.covers(ItemType::Course));
    }

    #[test]
    fn discount_json_shape() {
        let json = serde_json::to_value(Discount::Percentage {
            percent: 10,
            max_discount_cents: None,
        })
        .unwrap();
        assert_eq!(json["discount_type"], "percentage");
        assert_eq!(json["percent"], 10);
    }
}
