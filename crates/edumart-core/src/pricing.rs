//! Order pricing: coupon discount allocation and the platform revenue split.
//!
//! All amounts are integer cents. The order-level discount is spread over the
//! eligible lines in proportion to their price so that every order line
//! carries its own net amount, which is what commission is charged on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemRef;
use crate::coupon::{Coupon, CouponRejection};
use crate::UserId;

/// A priced item about to be bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What is being bought.
    pub item: ItemRef,
    /// Title at the time of purchase.
    pub title: String,
    /// Revenue recipient.
    pub instructor_id: UserId,
    /// Price before coupons.
    pub price_cents: i64,
}

/// A line with its share of the discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedLine {
    /// The priced item.
    #[serde(flatten)]
    pub line: LineItem,
    /// Share of the order discount.
    pub discount_cents: i64,
    /// `price_cents - discount_cents`.
    pub net_cents: i64,
}

/// Priced order, before it is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Lines in request order.
    pub lines: Vec<QuotedLine>,
    /// Sum of line prices.
    pub subtotal_cents: i64,
    /// Total discount.
    pub discount_cents: i64,
    /// Amount payable.
    pub total_cents: i64,
    /// Applied coupon code.
    pub coupon_code: Option<String>,
}

/// Price a set of lines, optionally applying a coupon.
///
/// # Errors
///
/// Returns the coupon's [`CouponRejection`] if it cannot be applied at `now`.
pub fn quote(
    lines: Vec<LineItem>,
    coupon: Option<&Coupon>,
    now: DateTime<Utc>,
) -> Result<Quote, CouponRejection> {
    let subtotal_cents: i64 = lines.iter().map(|l| l.price_cents).sum();

    let (discount_cents, shares) = match coupon {
        None => (0, vec![0; lines.len()]),
        Some(coupon) => {
            let eligible: Vec<bool> = lines
                .iter()
                .map(|l| coupon.covers(l.item.item_type()))
                .collect();
            let eligible_count = eligible.iter().filter(|e| **e).count();
            let eligible_subtotal: i64 = lines
                .iter()
                .zip(&eligible)
                .filter(|(_, e)| **e)
                .map(|(l, _)| l.price_cents)
                .sum();

            coupon.check(now, eligible_count, eligible_subtotal)?;

            let discount = coupon.discount.amount_for(eligible_subtotal);
            let weights: Vec<i64> = lines
                .iter()
                .zip(&eligible)
                .map(|(l, e)| if *e { l.price_cents } else { 0 })
                .collect();
            (discount, allocate(discount, &weights))
        }
    };

    let lines = lines
        .into_iter()
        .zip(shares)
        .map(|(line, share)| QuotedLine {
            net_cents: line.price_cents - share,
            discount_cents: share,
            line,
        })
        .collect();

    Ok(Quote {
        lines,
        subtotal_cents,
        discount_cents,
        total_cents: subtotal_cents - discount_cents,
        coupon_code: coupon.map(|c| c.code.clone()),
    })
}

/// Split `amount` across `weights` proportionally.
///
/// Each share is floored, then the leftover cents go to the largest
/// fractional remainders, earlier positions first on ties. The shares sum to
/// `amount` whenever `0 <= amount <= sum(weights)`, and no share exceeds its
/// weight.
#[must_use]
pub fn allocate(amount: i64, weights: &[i64]) -> Vec<i64> {
    let total: i64 = weights.iter().sum();
    if total <= 0 || amount <= 0 {
        return vec![0; weights.len()];
    }
    let amount = amount.min(total);

    let total = i128::from(total);
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (idx, weight) in weights.iter().enumerate() {
        let exact = i128::from(amount) * i128::from(*weight);
        // Quotient fits: amount * weight / total <= amount.
        #[allow(clippy::cast_possible_truncation)]
        shares.push((exact / total) as i64);
        remainders.push((exact % total, idx));
    }

    let mut leftover = amount - shares.iter().sum::<i64>();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (remainder, idx) in remainders {
        if leftover == 0 {
            break;
        }
        if remainder > 0 {
            shares[idx] += 1;
            leftover -= 1;
        }
    }
    shares
}

/// Platform fee and instructor earning for one net amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    /// Platform commission.
    pub platform_fee_cents: i64,
    /// What the instructor earns.
    pub instructor_earning_cents: i64,
}

impl RevenueSplit {
    /// Apply a flat commission percentage (rounded half up) to `net_cents`.
    #[must_use]
    pub fn new(net_cents: i64, commission_percent: u8) -> Self {
        let net_cents = net_cents.max(0);
        let pct = i64::from(commission_percent.min(100));
        let platform_fee_cents = (net_cents * pct + 50) / 100;
        Self {
            platform_fee_cents,
            instructor_earning_cents: net_cents - platform_fee_cents,
        }
    }
}
