//! Edumart HTTP API Service.
//!
//! This crate provides the HTTP API for the edumart marketplace, including:
//!
//! - Catalog: courses, lessons, books, chapters and learning paths
//! - Cart, wishlist, coupons and orders
//! - Library, lesson progress and signed certificates
//! - Reviews, notifications, course forums, live classes and assignments
//! - Admin approvals, refunds, revenue reports and platform settings
//!
//! # Identity
//!
//! Authentication happens in the identity gateway in front of the service.
//! The gateway forwards the user id in `x-user-id` and, when configured, a
//! shared key in `x-gateway-key`. See [`auth`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when they never await

pub mod access;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
