//! Client tests against a mocked edumart API.

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edumart_client::{ClientError, ClientOptions, CourseFilter, EdumartClient};
use edumart_core::{quote, CourseId, ItemRef, LineItem, Order, UserId};

fn sample_order(user_id: UserId, course_id: CourseId) -> Order {
    let line = LineItem {
        item: ItemRef::Course(course_id),
        title: "Rust 101".into(),
        instructor_id: UserId::generate(),
        price_cents: 4999,
    };
    let priced = quote(vec![line], None, Utc::now()).unwrap();
    Order::from_quote(user_id, priced, 20)
}

fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({ "error": { "code": code, "message": message } })
}

#[tokio::test]
async fn place_order_sends_identity_and_body() {
    let server = MockServer::start().await;
    let user_id = UserId::generate();
    let course_id = CourseId::generate();
    let order = sample_order(user_id, course_id);

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(header("x-user-id", user_id.to_string().as_str()))
        .and(body_json(json!({
            "items": [{ "item_type": "course", "item_id": course_id }],
            "coupon_code": "SAVE10"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&order))
        .expect(1)
        .mount(&server)
        .await;

    let client = EdumartClient::new(server.uri(), user_id).unwrap();
    let placed = client
        .place_order(Some(&[ItemRef::Course(course_id)]), Some("SAVE10"))
        .await
        .unwrap();

    assert_eq!(placed.id, order.id);
    assert_eq!(placed.total_cents, 4999);
    assert_eq!(placed.items[0].platform_fee_cents, 1000);
}

#[tokio::test]
async fn coupon_rejection_is_typed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/coupons/validate"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {
                "code": "coupon_rejected",
                "message": "coupon has expired",
                "details": { "reason": "expired" }
            }
        })))
        .mount(&server)
        .await;

    let client = EdumartClient::new(server.uri(), UserId::generate()).unwrap();
    let err = client.validate_coupon("OLD", None).await.unwrap_err();

    match err {
        ClientError::CouponRejected { reason } => assert_eq!(reason, "expired"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn not_found_and_unauthorized_are_typed() {
    let server = MockServer::start().await;
    let course_id = CourseId::generate();

    Mock::given(method("GET"))
        .and(path(format!("/v1/courses/{course_id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body("not_found", "course not found")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/cart"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("unauthorized", "unknown user")))
        .mount(&server)
        .await;

    let client = EdumartClient::new(server.uri(), UserId::generate()).unwrap();

    assert!(matches!(
        client.get_course(course_id).await,
        Err(ClientError::NotFound { .. })
    ));
    assert!(matches!(client.cart().await, Err(ClientError::Unauthorized)));
}

#[tokio::test]
async fn other_errors_keep_code_and_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/cart"))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body("conflict", "item already in cart")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/library"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = EdumartClient::new(server.uri(), UserId::generate()).unwrap();

    match client.add_to_cart(ItemRef::Course(CourseId::generate())).await {
        Err(ClientError::Api { code, status, .. }) => {
            assert_eq!(code, "conflict");
            assert_eq!(status, 409);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    match client.library().await {
        Err(ClientError::Api { code, status, .. }) => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 502);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn gateway_key_and_query_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/courses"))
        .and(query_param("q", "rust"))
        .and(header("x-gateway-key", "shared-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "total": 0,
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/notifications/read-all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "marked": 3 })))
        .mount(&server)
        .await;

    let client = EdumartClient::with_options(
        server.uri(),
        UserId::generate(),
        ClientOptions::with_gateway_key("shared-secret"),
    )
    .unwrap();

    let page = client.list_courses(&CourseFilter::search("rust")).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(!page.has_more);
    assert_eq!(client.mark_all_read().await.unwrap(), 3);
}

#[tokio::test]
async fn verify_certificate_reports_invalid_serials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/certificates/NOPE/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "certificate": null
        })))
        .mount(&server)
        .await;

    let client = EdumartClient::new(server.uri(), UserId::generate()).unwrap();
    let verification = client.verify_certificate("NOPE").await.unwrap();
    assert!(!verification.valid);
    assert!(verification.certificate.is_none());
}
