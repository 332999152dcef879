//! Orders and order items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ItemRef;
use crate::error::{EduError, Result};
use crate::pricing::{Quote, RevenueSplit};
use crate::{OrderId, UserId};

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Completed purchase.
    Paid,
    /// Reversed by an admin; excluded from revenue.
    Refunded,
}

/// One purchased item. Belongs to exactly one order (embedded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// What was bought.
    pub item: ItemRef,
    /// Title at purchase time.
    pub title: String,
    /// Revenue recipient.
    pub instructor_id: UserId,
    /// Price before discount.
    pub price_cents: i64,
    /// Coupon share.
    pub discount_cents: i64,
    /// Price after discount.
    pub net_cents: i64,
    /// Platform commission on the net amount.
    pub platform_fee_cents: i64,
    /// Instructor's part of the net amount.
    pub instructor_earning_cents: i64,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID (ULID).
    pub id: OrderId,
    /// Buyer.
    pub user_id: UserId,
    /// Status.
    pub status: OrderStatus,
    /// Purchased items.
    pub items: Vec<OrderItem>,
    /// Sum of item prices.
    pub subtotal_cents: i64,
    /// Coupon discount.
    pub discount_cents: i64,
    /// Amount charged.
    pub total_cents: i64,
    /// Coupon used, if any.
    pub coupon_code: Option<String>,
    /// Commission rate in effect when the order was placed.
    pub commission_percent: u8,
    /// Placement time.
    pub created_at: DateTime<Utc>,
    /// Refund time, if refunded.
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Turn a quote into a paid order, splitting every line's net amount.
    #[must_use]
    pub fn from_quote(user_id: UserId, quote: Quote, commission_percent: u8) -> Self {
        let items = quote
            .lines
            .into_iter()
            .map(|q| {
                let split = RevenueSplit::new(q.net_cents, commission_percent);
                OrderItem {
                    item: q.line.item,
                    title: q.line.title,
                    instructor_id: q.line.instructor_id,
                    price_cents: q.line.price_cents,
                    discount_cents: q.discount_cents,
                    net_cents: q.net_cents,
                    platform_fee_cents: split.platform_fee_cents,
                    instructor_earning_cents: split.instructor_earning_cents,
                }
            })
            .collect();

        Self {
            id: OrderId::generate(),
            user_id,
            status: OrderStatus::Paid,
            items,
            subtotal_cents: quote.subtotal_cents,
            discount_cents: quote.discount_cents,
            total_cents: quote.total_cents,
            coupon_code: quote.coupon_code,
            commission_percent,
            created_at: Utc::now(),
            refunded_at: None,
        }
    }

    /// Mark the order refunded.
    ///
    /// # Errors
    ///
    /// Returns `EduError::InvalidState` if it was already refunded.
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status == OrderStatus::Refunded {
            return Err(EduError::InvalidState("order already refunded".into()));
        }
        self.status = OrderStatus::Refunded;
        self.refunded_at = Some(now);
        Ok(())
    }

    /// Total platform commission on this order.
    #[must_use]
    pub fn platform_fee_cents(&self) -> i64 {
        self.items.iter().map(|i| i.platform_fee_cents).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{quote, LineItem};
    use crate::CourseId;

    fn paid_order() -> Order {
        let lines = vec![
            LineItem {
                item: ItemRef::Course(CourseId::generate()),
                title: "A".into(),
                instructor_id: UserId::generate(),
                price_cents: 2500,
            },
            LineItem {
                item: ItemRef::Course(CourseId::generate()),
                title: "B".into(),
                instructor_id: UserId::generate(),
                price_cents: 1500,
            },
        ];
        let q = quote(lines, None, Utc::now()).unwrap();
        Order::from_quote(UserId::generate(), q, 30)
    }

    #[test]
    fn order_items_carry_revenue_split() {
        let order = paid_order();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_cents, 4000);
        assert_eq!(order.items[0].platform_fee_cents, 750);
        assert_eq!(order.items[0].instructor_earning_cents, 1750);
        assert_eq!(order.platform_fee_cents(), 1200);
        for item in &order.items {
            assert_eq!(
                item.platform_fee_cents + item.instructor_earning_cents,
                item.net_cents
            );
        }
    }

    #[test]
    fn refund_only_once() {
        let mut order = paid_order();
        order.refund(Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
        assert!(order.refunded_at.is_some());
        assert!(order.refund(Utc::now()).is_err());
    }
}
