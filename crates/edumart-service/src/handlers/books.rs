//! Book and chapter handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edumart_core::{
    Book, BookId, Chapter, ChapterId, ContentDetails, ItemRef, Listing, ListingDetails,
    RatingSummary, Review, User,
};
use edumart_store::{keys, Store, StoreExt, WriteBatch};

use crate::access::{self, can_manage, require_manager};
use crate::auth::{Caller, MaybeCaller};
use crate::error::ApiError;
use crate::handlers::catalog::CatalogQuery;
use crate::handlers::Page;
use crate::state::AppState;

/// List approved, active books.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Book>>, ApiError> {
    let mut books: Vec<Book> = state
        .store
        .scan::<Book>(&[])?
        .into_iter()
        .filter(|b| b.is_public() && query.matches(b.instructor_id, &b.details))
        .collect();
    books.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(Page::slice(books, query.limit, query.offset)))
}

/// Create a book (pending approval).
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<ListingDetails>,
) -> Result<Json<Book>, ApiError> {
    if !caller.user.can_teach() {
        return Err(ApiError::Forbidden);
    }
    let book = Book::new(caller.id(), body)?;

    let mut batch = WriteBatch::new();
    batch.insert(&book)?;
    state.store.commit(batch)?;

    tracing::info!(book_id = %book.id, instructor_id = %caller.id(), "Book created");

    Ok(Json(book))
}

/// Book detail with rating summary.
#[derive(Debug, Serialize)]
pub struct BookDetail {
    /// The book.
    #[serde(flatten)]
    pub book: Book,
    /// Number of chapters.
    pub chapter_count: usize,
    /// Review summary.
    pub rating: RatingSummary,
}

/// Get a book.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookId>,
    viewer: MaybeCaller,
) -> Result<Json<BookDetail>, ApiError> {
    let book = visible_book(&state, id, viewer.user())?;
    let chapter_count = book_chapters(&state, id)?.len();
    let reviews: Vec<Review> = state.store.scan(&keys::reviews_prefix(&ItemRef::Book(id)))?;

    Ok(Json(BookDetail {
        rating: RatingSummary::from_reviews(&reviews),
        chapter_count,
        book,
    }))
}

/// Replace a book's details.
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<BookId>,
    Json(body): Json<ListingDetails>,
) -> Result<Json<Book>, ApiError> {
    let mut book = access::book(&state, id)?;
    require_manager(&caller.user, &book)?;
    if !book.is_active {
        return Err(ApiError::NotFound("book not found".into()));
    }

    book.details = body.validated()?;
    book.updated_at = Utc::now();
    state.store.save(&book)?;

    tracing::info!(book_id = %id, user_id = %caller.id(), "Book updated");

    Ok(Json(book))
}

/// Soft-delete a book.
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<BookId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut book = access::book(&state, id)?;
    require_manager(&caller.user, &book)?;

    book.is_active = false;
    book.updated_at = Utc::now();
    state.store.save(&book)?;

    tracing::info!(book_id = %id, user_id = %caller.id(), "Book deactivated");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

fn visible_book(state: &AppState, id: BookId, viewer: Option<&User>) -> Result<Book, ApiError> {
    let book = access::book(state, id)?;
    if !book.visible_to(viewer) {
        return Err(ApiError::NotFound("book not found".into()));
    }
    Ok(book)
}

// ============================================================================
// Chapters
// ============================================================================

/// A chapter as shown to a viewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterView {
    /// Chapter ID.
    pub id: ChapterId,
    /// Parent book.
    pub book_id: BookId,
    /// Title.
    pub title: String,
    /// Sort position.
    pub position: u32,
    /// Free preview.
    pub is_preview: bool,
    /// Text, when the viewer may read it.
    pub content: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ChapterView {
    fn new(chapter: Chapter, unlocked: bool) -> Self {
        let readable = unlocked || chapter.details.is_preview;
        Self {
            id: chapter.id,
            book_id: chapter.book_id,
            title: chapter.details.title,
            position: chapter.details.position,
            is_preview: chapter.details.is_preview,
            content: readable.then_some(chapter.details.content),
            created_at: chapter.created_at,
        }
    }
}

fn book_chapters(state: &AppState, id: BookId) -> Result<Vec<Chapter>, ApiError> {
    let mut chapters: Vec<Chapter> = state.store.scan(id.as_bytes())?;
    chapters.sort_by(|a, b| {
        a.details
            .position
            .cmp(&b.details.position)
            .then(a.created_at.cmp(&b.created_at))
    });
    Ok(chapters)
}

fn can_read(state: &AppState, viewer: Option<&User>, book: &Book) -> Result<bool, ApiError> {
    let Some(user) = viewer else {
        return Ok(false);
    };
    if can_manage(user, book) {
        return Ok(true);
    }
    access::is_entitled(state, user.id, &ItemRef::Book(book.id))
}

fn find_chapter(state: &AppState, book_id: BookId, chapter_id: ChapterId) -> Result<Chapter, ApiError> {
    state
        .store
        .fetch::<Chapter>(&keys::chapter_key(&book_id, &chapter_id))?
        .ok_or_else(|| ApiError::NotFound("chapter not found".into()))
}

/// List a book's chapters.
pub async fn list_chapters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookId>,
    viewer: MaybeCaller,
) -> Result<Json<Vec<ChapterView>>, ApiError> {
    let book = visible_book(&state, id, viewer.user())?;
    let unlocked = can_read(&state, viewer.user(), &book)?;

    Ok(Json(
        book_chapters(&state, id)?
            .into_iter()
            .map(|c| ChapterView::new(c, unlocked))
            .collect(),
    ))
}

/// Get one chapter.
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Path((id, chapter_id)): Path<(BookId, ChapterId)>,
    viewer: MaybeCaller,
) -> Result<Json<ChapterView>, ApiError> {
    let book = visible_book(&state, id, viewer.user())?;
    let chapter = find_chapter(&state, id, chapter_id)?;
    let unlocked = can_read(&state, viewer.user(), &book)?;
    Ok(Json(ChapterView::new(chapter, unlocked)))
}

/// Add a chapter.
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<BookId>,
    Json(body): Json<ContentDetails>,
) -> Result<Json<Chapter>, ApiError> {
    let book = access::book(&state, id)?;
    require_manager(&caller.user, &book)?;

    let chapter = Chapter {
        id: ChapterId::generate(),
        book_id: id,
        details: body.validated()?,
        created_at: Utc::now(),
    };
    let mut batch = WriteBatch::new();
    batch.insert(&chapter)?;
    state.store.commit(batch)?;

    tracing::info!(book_id = %id, chapter_id = %chapter.id, "Chapter created");

    Ok(Json(chapter))
}

/// Replace a chapter's fields.
pub async fn update_chapter(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, chapter_id)): Path<(BookId, ChapterId)>,
    Json(body): Json<ContentDetails>,
) -> Result<Json<Chapter>, ApiError> {
    let book = access::book(&state, id)?;
    require_manager(&caller.user, &book)?;

    let mut chapter = find_chapter(&state, id, chapter_id)?;
    chapter.details = body.validated()?;
    state.store.save(&chapter)?;

    Ok(Json(chapter))
}

/// Remove a chapter.
pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((id, chapter_id)): Path<(BookId, ChapterId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let book = access::book(&state, id)?;
    require_manager(&caller.user, &book)?;
    let chapter = find_chapter(&state, id, chapter_id)?;

    let mut batch = WriteBatch::new();
    batch.remove(&chapter);
    state.store.commit(batch)?;

    tracing::info!(book_id = %id, chapter_id = %chapter_id, "Chapter deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
