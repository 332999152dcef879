//! Catalog records: courses, lessons, books, chapters and learning paths.
//!
//! Everything an instructor publishes goes through approval before it is
//! publicly listed. Records are never hard-deleted; `is_active` is cleared
//! instead.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EduError, Result};
use crate::pricing::LineItem;
use crate::{BookId, ChapterId, CourseId, LearningPathId, LessonId, UserId};

/// Maximum accepted title length.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum list price in cents ($100,000).
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

// ============================================================================
// Item references
// ============================================================================

/// Discriminator for purchasable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A video course.
    Course,
    /// A book.
    Book,
    /// A bundle of courses.
    LearningPath,
}

impl ItemType {
    /// Integer code used in keys and exports (`1=course, 2=book, 3=learning_path`).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Course => 1,
            Self::Book => 2,
            Self::LearningPath => 3,
        }
    }

    /// Resolve an integer code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Course),
            2 => Some(Self::Book),
            3 => Some(Self::LearningPath),
            _ => None,
        }
    }

    /// The snake_case name used in URLs and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Book => "book",
            Self::LearningPath => "learning_path",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = EduError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "course" | "courses" => Ok(Self::Course),
            "book" | "books" => Ok(Self::Book),
            "learning_path" | "learning-path" | "learning_paths" => Ok(Self::LearningPath),
            other => Err(EduError::invalid("item_type", format!("unknown item type {other:?}"))),
        }
    }
}

/// A typed reference to a purchasable item.
///
/// Serializes as `{"item_type": "course", "item_id": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "item_type", content = "item_id", rename_all = "snake_case")]
pub enum ItemRef {
    /// A course.
    Course(CourseId),
    /// A book.
    Book(BookId),
    /// A learning path.
    LearningPath(LearningPathId),
}

impl ItemRef {
    /// Build a reference from a type and a raw UUID.
    #[must_use]
    pub const fn new(item_type: ItemType, id: uuid::Uuid) -> Self {
        match item_type {
            ItemType::Course => Self::Course(CourseId::from_uuid(id)),
            ItemType::Book => Self::Book(BookId::from_uuid(id)),
            ItemType::LearningPath => Self::LearningPath(LearningPathId::from_uuid(id)),
        }
    }

    /// The item type.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Course(_) => ItemType::Course,
            Self::Book(_) => ItemType::Book,
            Self::LearningPath(_) => ItemType::LearningPath,
        }
    }

    /// The raw UUID of the referenced item.
    #[must_use]
    pub const fn uuid(&self) -> &uuid::Uuid {
        match self {
            Self::Course(id) => id.as_uuid(),
            Self::Book(id) => id.as_uuid(),
            Self::LearningPath(id) => id.as_uuid(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type(), self.uuid())
    }
}

/// Approval state of instructor-submitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting review (code 0).
    Pending,
    /// Publicly visible (code 1).
    Approved,
    /// Turned down by an admin (code 2).
    Rejected,
}

impl ApprovalStatus {
    /// Integer code (`0=pending, 1=approved, 2=rejected`).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Editable fields shared by courses and books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDetails {
    /// Title shown in the catalog.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Free-form category ("programming", "math", ...).
    #[serde(default)]
    pub category: Option<String>,
    /// List price in cents. Zero means free.
    pub price_cents: i64,
    /// Optional discounted price in cents.
    #[serde(default)]
    pub sale_price_cents: Option<i64>,
}

impl ListingDetails {
    /// Validate and normalize the details.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a blank/long title, negative or
    /// excessive prices, or a sale price above the list price.
    pub fn validated(mut self) -> Result<Self> {
        self.title = validate_title(&self.title)?;
        validate_price(self.price_cents)?;
        if let Some(sale) = self.sale_price_cents {
            validate_price(sale)?;
            if sale > self.price_cents {
                return Err(EduError::invalid(
                    "sale_price_cents",
                    "must not exceed price_cents",
                ));
            }
        }
        self.category = self
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        Ok(self)
    }

    /// Price a buyer pays before coupons.
    #[must_use]
    pub fn effective_price_cents(&self) -> i64 {
        self.sale_price_cents
            .map_or(self.price_cents, |sale| sale.min(self.price_cents))
    }
}

/// Common view over courses, books and learning paths.
pub trait Listing {
    /// Reference to this item.
    fn item_ref(&self) -> ItemRef;
    /// Owner (instructor or curator) receiving the revenue.
    fn owner_id(&self) -> UserId;
    /// Catalog title.
    fn title(&self) -> &str;
    /// Price before coupons.
    fn price_cents(&self) -> i64;
    /// Current approval state.
    fn approval_status(&self) -> ApprovalStatus;
    /// Soft-delete flag.
    fn is_active(&self) -> bool;

    /// Approved and active.
    fn is_public(&self) -> bool {
        self.approval_status() == ApprovalStatus::Approved && self.is_active()
    }

    /// The owner or an admin may see non-public items.
    fn visible_to(&self, viewer: Option<&crate::User>) -> bool {
        self.is_public()
            || viewer.is_some_and(|v| v.is_admin() || v.id == self.owner_id())
    }

    /// Line item for pricing, if the item can be sold.
    ///
    /// # Errors
    ///
    /// Returns `EduError::NotPurchasable` for non-public items.
    fn line_item(&self) -> Result<LineItem> {
        if !self.is_public() {
            return Err(EduError::NotPurchasable(self.item_ref().to_string()));
        }
        Ok(LineItem {
            item: self.item_ref(),
            title: self.title().to_string(),
            instructor_id: self.owner_id(),
            price_cents: self.price_cents(),
        })
    }
}

/// A video course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Course ID.
    pub id: CourseId,
    /// Publishing instructor.
    pub instructor_id: UserId,
    /// Editable details.
    #[serde(flatten)]
    pub details: ListingDetails,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Create a pending course.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`ListingDetails::validated`].
    pub fn new(instructor_id: UserId, details: ListingDetails) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: CourseId::generate(),
            instructor_id,
            details: details.validated()?,
            approval_status: ApprovalStatus::Pending,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Listing for Course {
    fn item_ref(&self) -> ItemRef {
        ItemRef::Course(self.id)
    }
    fn owner_id(&self) -> UserId {
        self.instructor_id
    }
    fn title(&self) -> &str {
        &self.details.title
    }
    fn price_cents(&self) -> i64 {
        self.details.effective_price_cents()
    }
    fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// A book sold as a whole, read chapter by chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Book ID.
    pub id: BookId,
    /// Author/seller.
    pub instructor_id: UserId,
    /// Editable details.
    #[serde(flatten)]
    pub details: ListingDetails,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a pending book.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`ListingDetails::validated`].
    pub fn new(instructor_id: UserId, details: ListingDetails) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: BookId::generate(),
            instructor_id,
            details: details.validated()?,
            approval_status: ApprovalStatus::Pending,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Listing for Book {
    fn item_ref(&self) -> ItemRef {
        ItemRef::Book(self.id)
    }
    fn owner_id(&self) -> UserId {
        self.instructor_id
    }
    fn title(&self) -> &str {
        &self.details.title
    }
    fn price_cents(&self) -> i64 {
        self.details.effective_price_cents()
    }
    fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// A curated, separately priced bundle of courses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPath {
    /// Path ID.
    pub id: LearningPathId,
    /// Curator receiving the revenue.
    pub owner_id: UserId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Courses in study order.
    pub course_ids: Vec<CourseId>,
    /// Bundle price in cents.
    pub price_cents: i64,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl LearningPath {
    /// Create a pending learning path.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a bad title or price, an empty course
    /// list, or duplicate courses.
    pub fn new(
        owner_id: UserId,
        title: &str,
        description: String,
        course_ids: Vec<CourseId>,
        price_cents: i64,
    ) -> Result<Self> {
        let title = validate_title(title)?;
        validate_price(price_cents)?;
        if course_ids.is_empty() {
            return Err(EduError::invalid("course_ids", "must not be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        if !course_ids.iter().all(|id| seen.insert(*id)) {
            return Err(EduError::invalid("course_ids", "contains duplicates"));
        }
        Ok(Self {
            id: LearningPathId::generate(),
            owner_id,
            title,
            description,
            course_ids,
            price_cents,
            approval_status: ApprovalStatus::Pending,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

impl Listing for LearningPath {
    fn item_ref(&self) -> ItemRef {
        ItemRef::LearningPath(self.id)
    }
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn price_cents(&self) -> i64 {
        self.price_cents
    }
    fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
}

// ============================================================================
// Content units
// ============================================================================

/// Editable fields of a lesson or chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDetails {
    /// Title.
    pub title: String,
    /// Body text or video/embed reference.
    #[serde(default)]
    pub content: String,
    /// Sort position within the parent.
    #[serde(default)]
    pub position: u32,
    /// Estimated duration in minutes.
    #[serde(default)]
    pub duration_minutes: u32,
    /// Free preview, visible without purchase.
    #[serde(default)]
    pub is_preview: bool,
}

impl ContentDetails {
    /// Validate the title.
    ///
    /// # Errors
    ///
    /// Returns `EduError::Invalid` for a blank or overlong title.
    pub fn validated(mut self) -> Result<Self> {
        self.title = validate_title(&self.title)?;
        Ok(self)
    }
}

/// A lesson of a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson ID.
    pub id: LessonId,
    /// Parent course.
    pub course_id: CourseId,
    /// Lesson fields.
    #[serde(flatten)]
    pub details: ContentDetails,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A chapter of a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter ID.
    pub id: ChapterId,
    /// Parent book.
    pub book_id: BookId,
    /// Chapter fields.
    #[serde(flatten)]
    pub details: ContentDetails,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EduError::invalid("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(EduError::invalid(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_string())
}

fn validate_price(cents: i64) -> Result<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(EduError::invalid(
            "price_cents",
            format!("must be between 0 and {MAX_PRICE_CENTS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, User};

    fn details(price: i64, sale: Option<i64>) -> ListingDetails {
        ListingDetails {
            title: "  Rust for Beginners ".into(),
            description: String::new(),
            category: Some(" Programming ".into()),
            price_cents: price,
            sale_price_cents: sale,
        }
    }

    #[test]
    fn new_course_is_pending_and_normalized() {
        let course = Course::new(UserId::generate(), details(4999, None)).unwrap();
        assert_eq!(course.approval_status, ApprovalStatus::Pending);
        assert_eq!(course.details.title, "Rust for Beginners");
        assert_eq!(course.details.category.as_deref(), Some("programming"));
        assert!(!course.is_public());
    }

    #[test]
    fn sale_price_is_effective() {
        let course = Course::new(UserId::generate(), details(4999, Some(1999))).unwrap();
        assert_eq!(course.price_cents(), 1999);
    }

    #[test]
    fn sale_price_above_list_price_is_rejected() {
        assert!(Course::new(UserId::generate(), details(1000, Some(2000))).is_err());
        assert!(Course::new(UserId::generate(), details(-1, None)).is_err());
    }

    #[test]
    fn pending_items_are_not_purchasable() {
        let mut course = Course::new(UserId::generate(), details(1000, None)).unwrap();
        assert!(matches!(course.line_item(), Err(EduError::NotPurchasable(_))));

        course.approval_status = ApprovalStatus::Approved;
        let line = course.line_item().unwrap();
        assert_eq!(line.price_cents, 1000);
        assert_eq!(line.item, ItemRef::Course(course.id));

        course.is_active = false;
        assert!(course.line_item().is_err());
    }

    #[test]
    fn visibility_rules() {
        let owner = User::new(UserId::generate(), "Owner", "o@example.com", Role::Instructor).unwrap();
        let other = User::new(UserId::generate(), "Other", "x@example.com", Role::Student).unwrap();
        let admin = User::new(UserId::generate(), "Admin", "a@example.com", Role::Admin).unwrap();
        let course = Course::new(owner.id, details(0, None)).unwrap();

        assert!(course.visible_to(Some(&owner)));
        assert!(course.visible_to(Some(&admin)));
        assert!(!course.visible_to(Some(&other)));
        assert!(!course.visible_to(None));
    }

    #[test]
    fn item_ref_serializes_with_type_tag() {
        let id = CourseId::generate();
        let json = serde_json::to_value(ItemRef::Course(id)).unwrap();
        assert_eq!(json["item_type"], "course");
        assert_eq!(json["item_id"], id.to_string());

        let back: ItemRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, ItemRef::Course(id));
    }

    #[test]
    fn item_type_codes() {
        for ty in [ItemType::Course, ItemType::Book, ItemType::LearningPath] {
            assert_eq!(ItemType::from_code(ty.code()), Some(ty));
            assert_eq!(ty.as_str().parse::<ItemType>().unwrap(), ty);
        }
        assert!("video".parse::<ItemType>().is_err());
    }

    #[test]
    fn learning_path_requires_distinct_courses() {
        let owner = UserId::generate();
        let c = CourseId::generate();
        assert!(LearningPath::new(owner, "Path", String::new(), vec![], 100).is_err());
        assert!(LearningPath::new(owner, "Path", String::new(), vec![c, c], 100).is_err());
        let path = LearningPath::new(owner, "Path", String::new(), vec![c], 100).unwrap();
        assert_eq!(path.approval_status, ApprovalStatus::Pending);
    }
}
