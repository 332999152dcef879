//! Edumart HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use edumart_core::{
    AssignmentId, Course, CourseId, ItemRef, Notification, Order, OrderId, Quote, Submission,
    SubmittedAnswer, UserId,
};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, CartView, CourseDetail, CourseFilter, LibraryItem, MarkedRead, Page,
    PageParams, PlaceOrderRequest, SubmitRequest, UnreadCount, ValidateCouponRequest,
    Verification,
};

const USER_ID_HEADER: &str = "x-user-id";
const GATEWAY_KEY_HEADER: &str = "x-gateway-key";

/// Edumart API client acting as one user.
#[derive(Debug, Clone)]
pub struct EdumartClient {
    client: Client,
    base_url: String,
    user_id: UserId,
    gateway_key: Option<String>,
}

impl EdumartClient {
    /// Create a client that acts as `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Result<Self, ClientError> {
        Self::with_options(base_url, user_id, ClientOptions::default())
    }

    /// Create a client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        user_id: UserId,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
            gateway_key: options.gateway_key,
        })
    }

    /// The same connection settings acting as another user.
    #[must_use]
    pub fn as_user(&self, user_id: UserId) -> Self {
        Self {
            user_id,
            ..self.clone()
        }
    }

    /// List approved courses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_courses(&self, filter: &CourseFilter) -> Result<Page<Course>, ClientError> {
        let request = self.get("/v1/courses").query(filter);
        self.send(request).await
    }

    /// Get one course with its lesson count and rating.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the course is not visible to the caller.
    pub async fn get_course(&self, id: CourseId) -> Result<CourseDetail, ClientError> {
        self.send(self.get(&format!("/v1/courses/{id}"))).await
    }

    /// The caller's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn cart(&self) -> Result<CartView, ClientError> {
        self.send(self.get("/v1/cart")).await
    }

    /// Add an item to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be bought by the caller or is
    /// already in the cart.
    pub async fn add_to_cart(&self, item: ItemRef) -> Result<CartView, ClientError> {
        self.send(self.post("/v1/cart").json(&item)).await
    }

    /// Price items (the cart when `items` is `None`) with a coupon.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CouponRejected` if the coupon does not apply.
    pub async fn validate_coupon(
        &self,
        code: &str,
        items: Option<&[ItemRef]>,
    ) -> Result<Quote, ClientError> {
        let body = ValidateCouponRequest { code, items };
        self.send(self.post("/v1/coupons/validate").json(&body)).await
    }

    /// Place an order for `items`, or for the whole cart when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CouponRejected` for an unusable coupon, or an API
    /// error for unpurchasable or already owned items.
    pub async fn place_order(
        &self,
        items: Option<&[ItemRef]>,
        coupon_code: Option<&str>,
    ) -> Result<Order, ClientError> {
        let body = PlaceOrderRequest { items, coupon_code };
        let order: Order = self.send(self.post("/v1/orders").json(&body)).await?;
        tracing::debug!(order_id = %order.id, total_cents = order.total_cents, "Order placed");
        Ok(order)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_orders(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Page<Order>, ClientError> {
        let request = self
            .get("/v1/orders")
            .query(&PageParams { limit, offset });
        self.send(request).await
    }

    /// One of the caller's orders.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the order does not belong to the caller.
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ClientError> {
        self.send(self.get(&format!("/v1/orders/{id}"))).await
    }

    /// Everything the caller owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn library(&self) -> Result<Vec<LibraryItem>, ClientError> {
        self.send(self.get("/v1/me/library")).await
    }

    /// The caller's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn notifications(&self, unread_only: bool) -> Result<Page<Notification>, ClientError> {
        let request = self
            .get("/v1/notifications")
            .query(&[("unread_only", unread_only)]);
        self.send(request).await
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn unread_count(&self) -> Result<usize, ClientError> {
        let count: UnreadCount = self.send(self.get("/v1/notifications/unread-count")).await?;
        Ok(count.unread)
    }

    /// Mark every notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn mark_all_read(&self) -> Result<usize, ClientError> {
        let marked: MarkedRead = self.send(self.post("/v1/notifications/read-all")).await?;
        Ok(marked.marked)
    }

    /// Submit answers to an assignment and get the graded attempt back.
    ///
    /// # Errors
    ///
    /// Returns an API error once the deadline passed or no attempts are left.
    pub async fn submit_assignment(
        &self,
        course_id: CourseId,
        assignment_id: AssignmentId,
        answers: &[SubmittedAnswer],
    ) -> Result<Submission, ClientError> {
        let path = format!("/v1/courses/{course_id}/assignments/{assignment_id}/submissions");
        self.send(self.post(&path).json(&SubmitRequest { answers }))
            .await
    }

    /// Verify a certificate serial. Needs no identity, but one is sent anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn verify_certificate(&self, serial: &str) -> Result<Verification, ClientError> {
        self.send(self.get(&format!("/v1/certificates/{serial}/verify")))
            .await
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.base_url)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(USER_ID_HEADER, self.user_id.to_string());
        match &self.gateway_key {
            Some(key) => request.header(GATEWAY_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                match code {
                    "coupon_rejected" => {
                        let reason = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("reason"))
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or("unknown")
                            .to_string();
                        Err(ClientError::CouponRejected { reason })
                    }
                    "not_found" => Err(ClientError::NotFound { message }),
                    "unauthorized" => Err(ClientError::Unauthorized),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Shared secret the service expects from the gateway, if configured.
    pub gateway_key: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            gateway_key: None,
        }
    }
}

impl ClientOptions {
    /// Options carrying a gateway key.
    #[must_use]
    pub fn with_gateway_key(key: impl Into<String>) -> Self {
        Self {
            gateway_key: Some(key.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = EdumartClient::new("http://localhost:8080/", UserId::generate()).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn as_user_keeps_settings() {
        let options = ClientOptions::with_gateway_key("secret");
        let client =
            EdumartClient::with_options("http://localhost:8080", UserId::generate(), options)
                .unwrap();
        let other = UserId::generate();
        let switched = client.as_user(other);
        assert_eq!(switched.user_id, other);
        assert_eq!(switched.gateway_key.as_deref(), Some("secret"));
    }
}
