//! Table names.
//!
//! Every table is a sorted byte map. With the `RocksDB` backend each table is
//! a column family.

/// Table names.
pub mod table {
    /// User records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: lower-cased email to `user_id`. Enforces email uniqueness.
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Courses, keyed by `course_id`.
    pub const COURSES: &str = "courses";

    /// Lessons, keyed by `course_id || lesson_id`.
    pub const LESSONS: &str = "lessons";

    /// Books, keyed by `book_id`.
    pub const BOOKS: &str = "books";

    /// Chapters, keyed by `book_id || chapter_id`.
    pub const CHAPTERS: &str = "chapters";

    /// Learning paths, keyed by `path_id`.
    pub const LEARNING_PATHS: &str = "learning_paths";

    /// Cart entries, keyed by `user_id || item_key`.
    pub const CART: &str = "cart";

    /// Wishlist entries, keyed by `user_id || item_key`.
    pub const WISHLIST: &str = "wishlist";

    /// Coupons, keyed by upper-case code.
    pub const COUPONS: &str = "coupons";

    /// Orders, keyed by `order_id` (ULID).
    pub const ORDERS: &str = "orders";

    /// Index: orders by buyer, keyed by `user_id || order_id`. Empty value.
    pub const ORDERS_BY_USER: &str = "orders_by_user";

    /// Entitlements, keyed by `user_id || item_key`.
    pub const ENTITLEMENTS: &str = "entitlements";

    /// Index: owners of an item, keyed by `item_key || user_id`. Empty value.
    pub const ENTITLEMENTS_BY_ITEM: &str = "entitlements_by_item";

    /// Course progress, keyed by `user_id || course_id`.
    pub const PROGRESS: &str = "progress";

    /// Reviews, keyed by `item_key || user_id`. One per user per item.
    pub const REVIEWS: &str = "reviews";

    /// Notifications, keyed by `user_id || notification_id` (ULID).
    pub const NOTIFICATIONS: &str = "notifications";

    /// Forum questions, keyed by `course_id || thread_id`.
    pub const FORUM_THREADS: &str = "forum_threads";

    /// Forum answers, keyed by `thread_id || post_id`.
    pub const FORUM_POSTS: &str = "forum_posts";

    /// Live classes, keyed by `course_id || class_id`.
    pub const LIVE_CLASSES: &str = "live_classes";

    /// Live class seats, keyed by `class_id || user_id`.
    pub const LIVE_REGISTRATIONS: &str = "live_registrations";

    /// Assignments, keyed by `course_id || assignment_id`.
    pub const ASSIGNMENTS: &str = "assignments";

    /// Submissions, keyed by `assignment_id || user_id || attempt (u32 BE)`.
    pub const SUBMISSIONS: &str = "submissions";

    /// Certificates, keyed by serial.
    pub const CERTIFICATES: &str = "certificates";

    /// Index: `user_id || course_id` to certificate serial. One per course.
    pub const CERTIFICATES_BY_USER: &str = "certificates_by_user";

    /// Platform settings, single key `platform`.
    pub const SETTINGS: &str = "settings";
}

/// Returns all table names for database initialization.
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![
        table::USERS,
        table::USERS_BY_EMAIL,
        table::COURSES,
        table::LESSONS,
        table::BOOKS,
        table::CHAPTERS,
        table::LEARNING_PATHS,
        table::CART,
        table::WISHLIST,
        table::COUPONS,
        table::ORDERS,
        table::ORDERS_BY_USER,
        table::ENTITLEMENTS,
        table::ENTITLEMENTS_BY_ITEM,
        table::PROGRESS,
        table::REVIEWS,
        table::NOTIFICATIONS,
        table::FORUM_THREADS,
        table::FORUM_POSTS,
        table::LIVE_CLASSES,
        table::LIVE_REGISTRATIONS,
        table::ASSIGNMENTS,
        table::SUBMISSIONS,
        table::CERTIFICATES,
        table::CERTIFICATES_BY_USER,
        table::SETTINGS,
    ]
}
