//! Shared harness for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};

use edumart_core::UserId;
use edumart_service::auth::{GATEWAY_KEY_HEADER, USER_ID_HEADER};
use edumart_service::{create_router, AppState, ServiceConfig};
use edumart_store::MemoryStore;

/// Email registered as admin in every harness.
pub const ADMIN_EMAIL: &str = "admin@edumart.test";

/// An in-memory service plus a registered admin.
pub struct TestHarness {
    pub server: TestServer,
    pub admin_id: UserId,
    gateway_key: Option<String>,
}

impl TestHarness {
    /// Start a fresh service with the default config.
    pub async fn start() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    /// Start a fresh service with a custom config. The admin email list is
    /// always set.
    pub async fn with_config(mut config: ServiceConfig) -> Self {
        config.admin_emails = vec![ADMIN_EMAIL.into()];
        let gateway_key = config.gateway_key.clone();
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        let harness = Self {
            server,
            admin_id: UserId::generate(),
            gateway_key,
        };
        harness
            .register(harness.admin_id, "Admin", ADMIN_EMAIL, "student")
            .await;
        harness
    }

    /// Attach the identity headers the gateway would forward.
    pub fn as_user(&self, request: TestRequest, user: UserId) -> TestRequest {
        let request = request.add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&user.to_string()).unwrap(),
        );
        match &self.gateway_key {
            Some(key) => request.add_header(
                HeaderName::from_static(GATEWAY_KEY_HEADER),
                HeaderValue::from_str(key).unwrap(),
            ),
            None => request,
        }
    }

    pub fn get(&self, path: &str, user: UserId) -> TestRequest {
        self.as_user(self.server.get(path), user)
    }

    pub fn post(&self, path: &str, user: UserId) -> TestRequest {
        self.as_user(self.server.post(path), user)
    }

    pub fn put(&self, path: &str, user: UserId) -> TestRequest {
        self.as_user(self.server.put(path), user)
    }

    pub fn patch(&self, path: &str, user: UserId) -> TestRequest {
        self.as_user(self.server.patch(path), user)
    }

    pub fn delete(&self, path: &str, user: UserId) -> TestRequest {
        self.as_user(self.server.delete(path), user)
    }

    /// Register a user and return its id.
    pub async fn register(&self, id: UserId, name: &str, email: &str, role: &str) -> UserId {
        let response = self
            .post("/v1/users", id)
            .json(&json!({ "name": name, "email": email, "role": role }))
            .await;
        response.assert_status_ok();
        id
    }

    pub async fn student(&self, name: &str) -> UserId {
        let email = format!("{}@example.com", name.to_lowercase());
        self.register(UserId::generate(), name, &email, "student").await
    }

    pub async fn instructor(&self, name: &str) -> UserId {
        let email = format!("{}@example.com", name.to_lowercase());
        self.register(UserId::generate(), name, &email, "instructor").await
    }

    /// Approve an item as the admin.
    pub async fn approve(&self, item_type: &str, item_id: &str) {
        self.post("/v1/admin/approvals", self.admin_id)
            .json(&json!({ "item_type": item_type, "item_id": item_id, "status": "approved" }))
            .await
            .assert_status_ok();
    }

    /// Create a course and return its id, without approving it.
    pub async fn draft_course(&self, instructor: UserId, title: &str, price_cents: i64) -> String {
        let response = self
            .post("/v1/courses", instructor)
            .json(&json!({
                "title": title,
                "description": "A course",
                "category": "programming",
                "price_cents": price_cents
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    /// Create and approve a course.
    pub async fn course(&self, instructor: UserId, title: &str, price_cents: i64) -> String {
        let id = self.draft_course(instructor, title, price_cents).await;
        self.approve("course", &id).await;
        id
    }

    /// Create and approve a book.
    pub async fn book(&self, instructor: UserId, title: &str, price_cents: i64) -> String {
        let response = self
            .post("/v1/books", instructor)
            .json(&json!({ "title": title, "price_cents": price_cents }))
            .await;
        response.assert_status_ok();
        let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
        self.approve("book", &id).await;
        id
    }

    /// Add a lesson and return its id.
    pub async fn lesson(&self, instructor: UserId, course_id: &str, title: &str, position: u32) -> String {
        let response = self
            .post(&format!("/v1/courses/{course_id}/lessons"), instructor)
            .json(&json!({
                "title": title,
                "content": format!("{title} body"),
                "position": position,
                "duration_minutes": 10
            }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }

    /// Place an order for the given items and return the order JSON.
    pub async fn buy(&self, user: UserId, items: Value, coupon_code: Option<&str>) -> Value {
        let response = self
            .post("/v1/orders", user)
            .json(&json!({ "items": items, "coupon_code": coupon_code }))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Create a coupon as the admin.
    pub async fn coupon(&self, spec: Value) -> Value {
        let response = self.post("/v1/admin/coupons", self.admin_id).json(&spec).await;
        response.assert_status_ok();
        response.json()
    }
}

/// `{item_type, item_id}` JSON.
pub fn item(item_type: &str, id: &str) -> Value {
    json!({ "item_type": item_type, "item_id": id })
}
