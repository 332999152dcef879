//! Table and key of every stored record type.

use edumart_core::{
    Assignment, Book, CartEntry, Certificate, Chapter, Coupon, Course, CourseProgress,
    Entitlement, LearningPath, Lesson, LiveClass, LiveRegistration, Notification, Order,
    PlatformSettings, Post, Review, Submission, Thread, User, WishlistEntry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::keys;
use crate::schema::table;

/// A value stored in a fixed table under a key derived from its fields.
pub trait Record: Serialize + DeserializeOwned {
    /// Table the record lives in.
    const TABLE: &'static str;

    /// Primary key.
    fn key(&self) -> Vec<u8>;
}

macro_rules! record {
    ($ty:ty, $table:expr, |$r:ident| $key:expr) => {
        impl Record for $ty {
            const TABLE: &'static str = $table;

            fn key(&self) -> Vec<u8> {
                let $r = self;
                $key
            }
        }
    };
}

record!(User, table::USERS, |r| r.id.as_bytes().to_vec());
record!(Course, table::COURSES, |r| r.id.as_bytes().to_vec());
record!(Lesson, table::LESSONS, |r| keys::lesson_key(&r.course_id, &r.id));
record!(Book, table::BOOKS, |r| r.id.as_bytes().to_vec());
record!(Chapter, table::CHAPTERS, |r| keys::chapter_key(&r.book_id, &r.id));
record!(LearningPath, table::LEARNING_PATHS, |r| r.id.as_bytes().to_vec());
record!(CartEntry, table::CART, |r| keys::user_item_key(&r.user_id, &r.item));
record!(WishlistEntry, table::WISHLIST, |r| keys::user_item_key(&r.user_id, &r.item));
record!(Coupon, table::COUPONS, |r| r.code.as_bytes().to_vec());
record!(Order, table::ORDERS, |r| keys::order_key(&r.id));
record!(Entitlement, table::ENTITLEMENTS, |r| keys::user_item_key(&r.user_id, &r.item));
record!(CourseProgress, table::PROGRESS, |r| keys::user_course_key(&r.user_id, &r.course_id));
record!(Review, table::REVIEWS, |r| keys::review_key(&r.item, &r.user_id));
record!(Notification, table::NOTIFICATIONS, |r| keys::notification_key(&r.user_id, &r.id));
record!(Thread, table::FORUM_THREADS, |r| keys::thread_key(&r.course_id, &r.id));
record!(Post, table::FORUM_POSTS, |r| keys::post_key(&r.thread_id, &r.id));
record!(LiveClass, table::LIVE_CLASSES, |r| keys::live_class_key(&r.course_id, &r.id));
record!(LiveRegistration, table::LIVE_REGISTRATIONS, |r| {
    keys::registration_key(&r.class_id, &r.user_id)
});
record!(Assignment, table::ASSIGNMENTS, |r| keys::assignment_key(&r.course_id, &r.id));
record!(Submission, table::SUBMISSIONS, |r| {
    keys::submission_key(&r.assignment_id, &r.user_id, r.attempt)
});
record!(Certificate, table::CERTIFICATES, |r| r.serial.as_bytes().to_vec());
record!(PlatformSettings, table::SETTINGS, |_r| keys::SETTINGS_KEY.to_vec());
