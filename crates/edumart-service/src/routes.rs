//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin, assignments, books, cart, catalog, coupons, forum, health, library, live_classes,
    notifications, orders, paths, reviews, users,
};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent checkout requests (order placement, coupon quotes).
const CHECKOUT_MAX_CONCURRENT_REQUESTS: usize = 25;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health`
/// - `GET /v1/courses`, `/v1/books`, `/v1/learning-paths` and their details
/// - `GET /v1/reviews/:item_type/:item_id`
/// - `GET /v1/certificates/:serial/verify`
///
/// ## Caller (`x-user-id`)
/// - users, catalog management, cart, wishlist, orders, library, reviews,
///   notifications, forum, live classes, assignments
///
/// ## Checkout (own concurrency limit)
/// - `POST /v1/orders`, `POST /v1/coupons/validate`
///
/// ## Admin
/// - `/v1/admin/*`: users, approvals, coupons, refunds, revenue, settings
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Checkout endpoints have their own, lower concurrency limit.
    let checkout_limit = ConcurrencyLimitLayer::new(CHECKOUT_MAX_CONCURRENT_REQUESTS);

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", post(admin::set_role))
        .route("/users/:id/deactivate", post(admin::deactivate_user))
        .route("/pending", get(admin::pending))
        .route("/approvals", post(admin::decide))
        .route(
            "/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route("/coupons/:code/deactivate", post(coupons::deactivate_coupon))
        .route("/orders/:id/refund", post(orders::refund_order))
        .route("/revenue", get(admin::revenue))
        .route(
            "/settings",
            get(admin::get_settings).put(admin::update_settings),
        );

    let api_routes = Router::new()
        // Users
        .route("/users", post(users::register))
        .route("/users/me", get(users::me).patch(users::update_me))
        // Courses and lessons
        .route(
            "/courses",
            get(catalog::list_courses).post(catalog::create_course),
        )
        .route(
            "/courses/:id",
            get(catalog::get_course)
                .put(catalog::update_course)
                .delete(catalog::delete_course),
        )
        .route(
            "/courses/:id/lessons",
            get(catalog::list_lessons).post(catalog::create_lesson),
        )
        .route(
            "/courses/:id/lessons/:lesson_id",
            get(catalog::get_lesson)
                .put(catalog::update_lesson)
                .delete(catalog::delete_lesson),
        )
        .route(
            "/courses/:id/lessons/:lesson_id/complete",
            post(library::complete_lesson),
        )
        .route("/courses/:id/progress", get(library::course_progress))
        .route("/instructors/me/courses", get(catalog::my_courses))
        .route("/instructors/me/revenue", get(admin::my_revenue))
        // Books and chapters
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/books/:id/chapters",
            get(books::list_chapters).post(books::create_chapter),
        )
        .route(
            "/books/:id/chapters/:chapter_id",
            get(books::get_chapter)
                .put(books::update_chapter)
                .delete(books::delete_chapter),
        )
        // Learning paths
        .route(
            "/learning-paths",
            get(paths::list_paths).post(paths::create_path),
        )
        .route(
            "/learning-paths/:id",
            get(paths::get_path).delete(paths::delete_path),
        )
        // Cart and wishlist
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart))
        .route(
            "/cart/:item_type/:item_id",
            delete(cart::remove_from_cart),
        )
        .route(
            "/wishlist",
            get(cart::get_wishlist).post(cart::add_to_wishlist),
        )
        .route(
            "/wishlist/:item_type/:item_id",
            delete(cart::remove_from_wishlist),
        )
        // Orders and checkout
        .route(
            "/orders",
            get(orders::list_orders)
                .merge(post(orders::place_order).layer(checkout_limit.clone())),
        )
        .route(
            "/coupons/validate",
            post(coupons::validate_coupon).layer(checkout_limit),
        )
        .route("/orders/:id", get(orders::get_order))
        // Library and certificates
        .route("/me/library", get(library::library))
        .route("/me/certificates", get(library::my_certificates))
        .route("/certificates/:serial/verify", get(library::verify))
        // Reviews
        .route(
            "/reviews/:item_type/:item_id",
            get(reviews::list_reviews)
                .post(reviews::create_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // Forum
        .route(
            "/courses/:id/threads",
            get(forum::list_threads).post(forum::create_thread),
        )
        .route("/courses/:id/threads/:thread_id", get(forum::get_thread))
        .route(
            "/courses/:id/threads/:thread_id/posts",
            post(forum::create_post),
        )
        .route(
            "/courses/:id/threads/:thread_id/accept",
            post(forum::accept_post),
        )
        // Live classes
        .route(
            "/courses/:id/live-classes",
            get(live_classes::list_live_classes).post(live_classes::schedule_live_class),
        )
        .route(
            "/courses/:id/live-classes/:class_id/register",
            post(live_classes::register),
        )
        // Assignments
        .route(
            "/courses/:id/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/courses/:id/assignments/:assignment_id",
            get(assignments::get_assignment),
        )
        .route(
            "/courses/:id/assignments/:assignment_id/submissions",
            get(assignments::all_submissions).post(assignments::submit),
        )
        .route(
            "/courses/:id/assignments/:assignment_id/submissions/me",
            get(assignments::my_submissions),
        )
        .nest("/admin", admin_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
