//! Catalog lookups and access rules shared by the handlers.

use edumart_core::{
    Book, BookId, Course, CourseId, ItemRef, LearningPath, LearningPathId, LineItem, Listing,
    User, UserId,
};
use edumart_store::{keys, schema::table, StoreExt};

use crate::error::ApiError;
use crate::state::AppState;

/// A purchasable catalog item of any type.
#[derive(Debug, Clone)]
pub enum Product {
    /// A course.
    Course(Course),
    /// A book.
    Book(Book),
    /// A learning path.
    Path(LearningPath),
}

impl Product {
    /// Common listing view.
    #[must_use]
    pub fn listing(&self) -> &dyn Listing {
        match self {
            Self::Course(c) => c,
            Self::Book(b) => b,
            Self::Path(p) => p,
        }
    }
}

/// Load any item, `None` if it does not exist.
pub fn find_product(state: &AppState, item: &ItemRef) -> Result<Option<Product>, ApiError> {
    let product = match item {
        ItemRef::Course(id) => state
            .store
            .fetch::<Course>(id.as_bytes())?
            .map(Product::Course),
        ItemRef::Book(id) => state.store.fetch::<Book>(id.as_bytes())?.map(Product::Book),
        ItemRef::LearningPath(id) => state
            .store
            .fetch::<LearningPath>(id.as_bytes())?
            .map(Product::Path),
    };
    Ok(product)
}

/// Load an item the viewer may see; hidden items are reported as missing.
pub fn visible_product(
    state: &AppState,
    item: &ItemRef,
    viewer: Option<&User>,
) -> Result<Product, ApiError> {
    find_product(state, item)?
        .filter(|p| p.listing().visible_to(viewer))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", item.item_type())))
}

/// Load a course, regardless of visibility.
pub fn course(state: &AppState, id: CourseId) -> Result<Course, ApiError> {
    state
        .store
        .fetch::<Course>(id.as_bytes())?
        .ok_or_else(|| ApiError::NotFound("course not found".into()))
}

/// Load a course the viewer may see.
pub fn visible_course(
    state: &AppState,
    id: CourseId,
    viewer: Option<&User>,
) -> Result<Course, ApiError> {
    let course = course(state, id)?;
    if !course.visible_to(viewer) {
        return Err(ApiError::NotFound("course not found".into()));
    }
    Ok(course)
}

/// Load a book, regardless of visibility.
pub fn book(state: &AppState, id: BookId) -> Result<Book, ApiError> {
    state
        .store
        .fetch::<Book>(id.as_bytes())?
        .ok_or_else(|| ApiError::NotFound("book not found".into()))
}

/// Load a learning path, regardless of visibility.
pub fn learning_path(state: &AppState, id: LearningPathId) -> Result<LearningPath, ApiError> {
    state
        .store
        .fetch::<LearningPath>(id.as_bytes())?
        .ok_or_else(|| ApiError::NotFound("learning path not found".into()))
}

/// Whether the user holds an entitlement for the item.
pub fn is_entitled(state: &AppState, user_id: UserId, item: &ItemRef) -> Result<bool, ApiError> {
    Ok(state
        .store
        .contains(table::ENTITLEMENTS, &keys::user_item_key(&user_id, item))?)
}

/// The owner or an admin may manage an item.
pub fn can_manage(user: &User, listing: &dyn Listing) -> bool {
    user.is_admin() || listing.owner_id() == user.id
}

/// Fail with 403 unless the user may manage the item.
pub fn require_manager(user: &User, listing: &dyn Listing) -> Result<(), ApiError> {
    if can_manage(user, listing) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Owners, admins and entitled users may use a course's content, forum,
/// live classes and assignments.
pub fn has_course_access(state: &AppState, user: &User, course: &Course) -> Result<bool, ApiError> {
    if can_manage(user, course) {
        return Ok(true);
    }
    is_entitled(state, user.id, &ItemRef::Course(course.id))
}

/// Fail with 403 unless the user has course access.
pub fn require_course_access(
    state: &AppState,
    user: &User,
    course: &Course,
) -> Result<(), ApiError> {
    if has_course_access(state, user, course)? {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Fail with 403 unless the user holds an entitlement for the course.
pub fn require_enrolled(state: &AppState, user: &User, course: &Course) -> Result<(), ApiError> {
    if is_entitled(state, user.id, &ItemRef::Course(course.id))? {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Load an item the user may buy right now and price it.
///
/// Missing items are 404. Hidden, own and already owned items are refused.
pub fn purchasable(
    state: &AppState,
    buyer: &User,
    item: &ItemRef,
) -> Result<(Product, LineItem), ApiError> {
    let product = find_product(state, item)?
        .filter(|p| p.listing().visible_to(Some(buyer)))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", item.item_type())))?;
    let listing = product.listing();

    if listing.owner_id() == buyer.id {
        return Err(ApiError::BadRequest("cannot buy your own item".into()));
    }
    let line = listing.line_item()?;
    if is_entitled(state, buyer.id, item)? {
        return Err(ApiError::Conflict(format!("{item} is already owned")));
    }
    Ok((product, line))
}
