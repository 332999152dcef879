//! Per-instructor revenue aggregation over paid orders.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};
use crate::UserId;

/// Half-open time window `[from, to)`; unbounded sides are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Inclusive start.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive end.
    pub to: Option<DateTime<Utc>>,
}

impl Period {
    /// Whether `at` falls in the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }
}

/// Aggregated figures for one instructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorRevenue {
    /// The instructor.
    pub instructor_id: Option<UserId>,
    /// Order lines sold.
    pub items_sold: u64,
    /// Sum of list prices.
    pub gross_cents: i64,
    /// Sum of coupon shares.
    pub discount_cents: i64,
    /// Sum of net amounts.
    pub net_cents: i64,
    /// Commission kept by the platform.
    pub platform_fee_cents: i64,
    /// Paid out to the instructor.
    pub earnings_cents: i64,
}

impl InstructorRevenue {
    fn add(&mut self, other: &Self) {
        self.items_sold += other.items_sold;
        self.gross_cents += other.gross_cents;
        self.discount_cents += other.discount_cents;
        self.net_cents += other.net_cents;
        self.platform_fee_cents += other.platform_fee_cents;
        self.earnings_cents += other.earnings_cents;
    }
}

/// Revenue report for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueReport {
    /// Window covered.
    pub period: Period,
    /// Paid orders counted.
    pub orders_counted: u64,
    /// Rows sorted by earnings, highest first.
    pub instructors: Vec<InstructorRevenue>,
    /// Column totals (`instructor_id` is `None`).
    pub totals: InstructorRevenue,
}

impl RevenueReport {
    /// Aggregate paid orders placed within `period`.
    pub fn build<'a>(orders: impl IntoIterator<Item = &'a Order>, period: Period) -> Self {
        let mut rows: BTreeMap<UserId, InstructorRevenue> = BTreeMap::new();
        let mut orders_counted = 0;

        for order in orders {
            if order.status != OrderStatus::Paid || !period.contains(order.created_at) {
                continue;
            }
            orders_counted += 1;
            for item in &order.items {
                let row = rows
                    .entry(item.instructor_id)
                    .or_insert_with(|| InstructorRevenue {
                        instructor_id: Some(item.instructor_id),
                        ..InstructorRevenue::default()
                    });
                row.items_sold += 1;
                row.gross_cents += item.price_cents;
                row.discount_cents += item.discount_cents;
                row.net_cents += item.net_cents;
                row.platform_fee_cents += item.platform_fee_cents;
                row.earnings_cents += item.instructor_earning_cents;
            }
        }

        let mut totals = InstructorRevenue::default();
        let mut instructors: Vec<_> = rows.into_values().collect();
        for row in &instructors {
            totals.add(row);
        }
        instructors.sort_by(|a, b| {
            b.earnings_cents
                .cmp(&a.earnings_cents)
                .then(a.instructor_id.cmp(&b.instructor_id))
        });

        Self {
            period,
            orders_counted,
            instructors,
            totals,
        }
    }

    /// The row for one instructor (zeroes if they sold nothing).
    #[must_use]
    pub fn for_instructor(&self, instructor_id: UserId) -> InstructorRevenue {
        self.instructors
            .iter()
            .find(|row| row.instructor_id == Some(instructor_id))
            .cloned()
            .unwrap_or_else(|| InstructorRevenue {
                instructor_id: Some(instructor_id),
                ..InstructorRevenue::default()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemRef;
    use crate::coupon::{Coupon, CouponSpec, Discount};
    use crate::pricing::{quote, LineItem};
    use crate::CourseId;
    use chrono::Duration;

    fn line(instructor: UserId, price: i64) -> LineItem {
        LineItem {
            item: ItemRef::Course(CourseId::generate()),
            title: "Course".into(),
            instructor_id: instructor,
            price_cents: price,
        }
    }

    #[test]
    fn aggregates_per_instructor() {
        let alice = UserId::generate();
        let bob = UserId::generate();
        let coupon = Coupon::new(
            CouponSpec {
                code: "HALF".into(),
                discount: Discount::Percentage {
                    percent: 50,
                    max_discount_cents: None,
                },
                applies_to: None,
                min_order_cents: None,
                usage_limit: None,
                starts_at: None,
                expires_at: None,
            },
            UserId::generate(),
        )
        .unwrap();

        let o1 = Order::from_quote(
            UserId::generate(),
            quote(vec![line(alice, 1000), line(bob, 3000)], None, Utc::now()).unwrap(),
            10,
        );
        let o2 = Order::from_quote(
            UserId::generate(),
            quote(vec![line(alice, 2000)], Some(&coupon), Utc::now()).unwrap(),
            10,
        );

        let report = RevenueReport::build([&o1, &o2], Period::default());
        assert_eq!(report.orders_counted, 2);

        let a = report.for_instructor(alice);
        assert_eq!(a.items_sold, 2);
        assert_eq!(a.gross_cents, 3000);
        assert_eq!(a.discount_cents, 1000);
        assert_eq!(a.net_cents, 2000);
        assert_eq!(a.platform_fee_cents, 200);
        assert_eq!(a.earnings_cents, 1800);

        // Bob earned more, so he comes first.
        assert_eq!(report.instructors[0].instructor_id, Some(bob));
        assert_eq!(report.totals.net_cents, 5000);
        assert_eq!(report.totals.earnings_cents, 4500);
    }

    #[test]
    fn refunded_and_out_of_period_orders_are_skipped() {
        let alice = UserId::generate();
        let mut refunded = Order::from_quote(
            UserId::generate(),
            quote(vec![line(alice, 1000)], None, Utc::now()).unwrap(),
            20,
        );
        refunded.refund(Utc::now()).unwrap();

        let old = Order::from_quote(
            UserId::generate(),
            quote(vec![line(alice, 1000)], None, Utc::now()).unwrap(),
            20,
        );
        let period = Period {
            from: Some(Utc::now() + Duration::hours(1)),
            to: None,
        };

        let report = RevenueReport::build([&refunded], Period::default());
        assert_eq!(report.orders_counted, 0);
        let report = RevenueReport::build([&old], period);
        assert_eq!(report.orders_counted, 0);
        assert_eq!(report.for_instructor(alice).earnings_cents, 0);
    }

    #[test]
    fn period_is_half_open() {
        let t = Utc::now();
        let p = Period {
            from: Some(t),
            to: Some(t + Duration::seconds(10)),
        };
        assert!(p.contains(t));
        assert!(!p.contains(t + Duration::seconds(10)));
        assert!(!p.contains(t - Duration::seconds(1)));
    }
}
