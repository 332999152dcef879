//! Key encoding.
//!
//! Keys are fixed-width binary composites: a parent id followed by a child id,
//! so a prefix scan over the parent lists its children. UUIDs and ULIDs are
//! 16 bytes each. ULID-keyed children (orders, notifications) come back in
//! creation order.

use edumart_core::{
    AssignmentId, BookId, ChapterId, CourseId, ItemRef, LessonId, LiveClassId, NotificationId,
    OrderId, PostId, ThreadId, UserId,
};

/// Length of an encoded [`ItemRef`].
pub const ITEM_KEY_LEN: usize = 17;

/// Key of the single settings record.
pub const SETTINGS_KEY: &[u8] = b"platform";

/// Concatenate key parts.
#[must_use]
pub fn compose(parts: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Encode an item reference as `type code (1 byte) || uuid (16 bytes)`.
#[must_use]
pub fn item_key(item: &ItemRef) -> [u8; ITEM_KEY_LEN] {
    let mut key = [0u8; ITEM_KEY_LEN];
    key[0] = item.item_type().code();
    key[1..].copy_from_slice(item.uuid().as_bytes());
    key
}

/// `user_id || item_key`, used by the cart, wishlist and entitlement tables.
#[must_use]
pub fn user_item_key(user_id: &UserId, item: &ItemRef) -> Vec<u8> {
    compose(&[user_id.as_bytes(), &item_key(item)])
}

/// `item_key || user_id`, the review and item-owner index key.
#[must_use]
pub fn review_key(item: &ItemRef, user_id: &UserId) -> Vec<u8> {
    item_user_key(item, user_id)
}

/// `item_key || user_id`.
#[must_use]
pub fn item_user_key(item: &ItemRef, user_id: &UserId) -> Vec<u8> {
    compose(&[&item_key(item), user_id.as_bytes()])
}

/// Extract the user ID from an `item_key || user_id` key.
///
/// Returns `None` for keys of the wrong length.
#[must_use]
pub fn user_id_from_item_key(key: &[u8]) -> Option<UserId> {
    if key.len() != ITEM_KEY_LEN + 16 {
        return None;
    }
    let bytes: [u8; 16] = key.get(ITEM_KEY_LEN..)?.try_into().ok()?;
    Some(UserId::from_bytes(bytes))
}

/// Prefix for all reviews of an item.
#[must_use]
pub fn reviews_prefix(item: &ItemRef) -> Vec<u8> {
    item_key(item).to_vec()
}

/// `course_id || lesson_id`.
#[must_use]
pub fn lesson_key(course_id: &CourseId, lesson_id: &LessonId) -> Vec<u8> {
    compose(&[course_id.as_bytes(), lesson_id.as_bytes()])
}

/// `book_id || chapter_id`.
#[must_use]
pub fn chapter_key(book_id: &BookId, chapter_id: &ChapterId) -> Vec<u8> {
    compose(&[book_id.as_bytes(), chapter_id.as_bytes()])
}

/// Order key (ULID bytes).
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.to_bytes().to_vec()
}

/// `user_id || order_id` index key.
#[must_use]
pub fn user_order_key(user_id: &UserId, order_id: &OrderId) -> Vec<u8> {
    compose(&[user_id.as_bytes(), &order_id.to_bytes()])
}

/// Extract the order ID from a `user_id || order_id` index key.
///
/// Returns `None` for keys of the wrong length.
#[must_use]
pub fn order_id_from_user_key(key: &[u8]) -> Option<OrderId> {
    let bytes: [u8; 16] = key.get(16..32)?.try_into().ok()?;
    Some(OrderId::from_bytes(bytes))
}

/// `user_id || course_id`, the progress and certificate index key.
#[must_use]
pub fn user_course_key(user_id: &UserId, course_id: &CourseId) -> Vec<u8> {
    compose(&[user_id.as_bytes(), course_id.as_bytes()])
}

/// `user_id || notification_id`.
#[must_use]
pub fn notification_key(user_id: &UserId, id: &NotificationId) -> Vec<u8> {
    compose(&[user_id.as_bytes(), &id.to_bytes()])
}

/// `course_id || thread_id`.
#[must_use]
pub fn thread_key(course_id: &CourseId, thread_id: &ThreadId) -> Vec<u8> {
    compose(&[course_id.as_bytes(), thread_id.as_bytes()])
}

/// `thread_id || post_id`.
#[must_use]
pub fn post_key(thread_id: &ThreadId, post_id: &PostId) -> Vec<u8> {
    compose(&[thread_id.as_bytes(), post_id.as_bytes()])
}

/// `course_id || class_id`.
#[must_use]
pub fn live_class_key(course_id: &CourseId, class_id: &LiveClassId) -> Vec<u8> {
    compose(&[course_id.as_bytes(), class_id.as_bytes()])
}

/// `class_id || user_id`.
#[must_use]
pub fn registration_key(class_id: &LiveClassId, user_id: &UserId) -> Vec<u8> {
    compose(&[class_id.as_bytes(), user_id.as_bytes()])
}

/// `course_id || assignment_id`.
#[must_use]
pub fn assignment_key(course_id: &CourseId, assignment_id: &AssignmentId) -> Vec<u8> {
    compose(&[course_id.as_bytes(), assignment_id.as_bytes()])
}

/// `assignment_id || user_id || attempt`, attempt big-endian so attempts sort.
#[must_use]
pub fn submission_key(assignment_id: &AssignmentId, user_id: &UserId, attempt: u32) -> Vec<u8> {
    compose(&[
        assignment_id.as_bytes(),
        user_id.as_bytes(),
        &attempt.to_be_bytes(),
    ])
}

/// Prefix for one user's attempts at an assignment.
#[must_use]
pub fn user_submissions_prefix(assignment_id: &AssignmentId, user_id: &UserId) -> Vec<u8> {
    compose(&[assignment_id.as_bytes(), user_id.as_bytes()])
}
