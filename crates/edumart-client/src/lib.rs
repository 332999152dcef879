//! Edumart Client SDK.
//!
//! A typed client for the edumart marketplace API. Requests carry the user
//! identity the gateway would forward, so the client is meant for trusted
//! callers inside the platform (the web frontend's backend, admin tools,
//! integration tests).
//!
//! # Example
//!
//! ```no_run
//! use edumart_client::{CourseFilter, EdumartClient};
//! use edumart_core::{ItemRef, UserId};
//!
//! # async fn example(user_id: UserId) -> Result<(), edumart_client::ClientError> {
//! let client = EdumartClient::new("http://edumart.internal:8080", user_id)?;
//!
//! let courses = client.list_courses(&CourseFilter::search("rust")).await?;
//! let first = &courses.items[0];
//! client.add_to_cart(ItemRef::Course(first.id)).await?;
//!
//! let order = client.place_order(None, Some("SAVE10")).await?;
//! println!("Paid {} cents", order.total_cents);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, EdumartClient};
pub use error::ClientError;
pub use types::*;
