//! Core types and business rules for edumart.
//!
//! This crate holds the domain model of the marketplace and the small amount
//! of real computation it needs:
//!
//! - **Identifiers**: `UserId`, `CourseId`, `OrderId`, ...
//! - **Catalog**: `Course`, `Book`, `LearningPath`, `Lesson`, `Chapter`
//! - **Pricing**: `Coupon`, `Discount`, `quote`, `allocate`, `RevenueSplit`
//! - **Orders**: `Order`, `OrderItem`, `RevenueReport`
//! - **Learning**: `Entitlement`, `CourseProgress`, `Certificate`, `Assignment`
//! - **Community**: `Review`, `Thread`, `Post`, `LiveClass`, `Notification`
//!
//! # Money
//!
//! All amounts are `i64` integer cents. Percentages are whole `u8` values in
//! `0..=100`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assignment;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod error;
pub mod forum;
pub mod ids;
pub mod library;
pub mod live_class;
pub mod notification;
pub mod order;
pub mod pricing;
pub mod revenue;
pub mod review;
pub mod settings;
pub mod user;

pub use assignment::{
    Assignment, AssignmentSpec, Grade, OptionSpec, QuestionResult, QuestionSpec, QuizOption,
    QuizQuestion, StudentAssignment, StudentOption, StudentQuestion, Submission, SubmittedAnswer,
    MAX_QUESTIONS, MAX_QUESTION_POINTS,
};
pub use cart::{CartEntry, WishlistEntry};
pub use catalog::{
    ApprovalStatus, Book, Chapter, ContentDetails, Course, ItemRef, ItemType, LearningPath,
    Lesson, Listing, ListingDetails, MAX_PRICE_CENTS, MAX_TITLE_LEN,
};
pub use coupon::{normalize_code, Coupon, CouponRejection, CouponSpec, Discount};
pub use error::{EduError, Result};
pub use forum::{Post, Thread};
pub use ids::{
    AssignmentId, BookId, CertificateId, ChapterId, CouponId, CourseId, IdError, LearningPathId,
    LessonId, LiveClassId, NotificationId, OptionId, OrderId, PostId, QuestionId, ReviewId,
    SubmissionId, ThreadId, UserId,
};
pub use library::{Certificate, CourseProgress, Entitlement, ProgressSummary};
pub use live_class::{LiveClass, LiveClassSpec, LiveClassStatus, LiveRegistration};
pub use notification::{Notification, NotificationKind};
pub use order::{Order, OrderItem, OrderStatus};
pub use pricing::{allocate, quote, LineItem, Quote, QuotedLine, RevenueSplit};
pub use revenue::{InstructorRevenue, Period, RevenueReport};
pub use review::{RatingSummary, Review};
pub use settings::PlatformSettings;
pub use user::{normalize_email, validate_name, Role, User};
