//! Catalog, approval and content visibility tests.

mod common;

use axum::http::StatusCode;
use common::{item, TestHarness};
use serde_json::{json, Value};

#[tokio::test]
async fn pending_course_is_hidden_until_approved() {
    let harness = TestHarness::start().await;
    let teacher = harness.instructor("Tess").await;
    let student = harness.student("Sam").await;
    let id = harness.draft_course(teacher, "Rust 101", 4999).await;

    let listed: Value = harness.server.get("/v1/courses").await.json();
    assert_eq!(listed["total"], 0);
    harness
        .get(&format!("/v1/courses/{id}"), student)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    harness
        .get(&format!("/v1/courses/{id}"), teacher)
        .await
        .assert_status_ok();

    let pending: Value = harness.get("/v1/admin/pending", harness.admin_id).await.json();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["item_id"], id);

    harness.approve("course", &id).await;

    let listed: Value = harness.server.get("/v1/courses").await.json();
    assert_eq!(listed["total"], 1);
    let detail: Value = harness.server.get(&format!("/v1/courses/{id}")).await.json();
    assert_eq!(detail["approval_status"], "approved");
    assert_eq!(detail["rating"]["count"], 0);

    let notes: Value = harness.get("/v1/notifications", teacher).await.json();
    assert_eq!(notes["items"][0]["kind"], "approval_decision");
}

#[tokio::test]
async fn catalog_filters() {
    let harness = TestHarness::start().await;
    let tess = harness.instructor("Tess").await;
    let ivan = harness.instructor("Ivan").await;
    harness.course(tess, "Advanced Rust", 1000).await;
    harness.course(ivan, "Intro to Go", 1000).await;

    let rust: Value = harness.server.get("/v1/courses?q=RUST").await.json();
    assert_eq!(rust["total"], 1);
    assert_eq!(rust["items"][0]["title"], "Advanced Rust");

    let by_ivan: Value = harness
        .server
        .get(&format!("/v1/courses?instructor_id={ivan}"))
        .await
        .json();
    assert_eq!(by_ivan["total"], 1);
    assert_eq!(by_ivan["items"][0]["title"], "Intro to Go");

    let math: Value = harness.server.get("/v1/courses?category=math").await.json();
    assert_eq!(math["total"], 0);

    let paged: Value = harness.server.get("/v1/courses?limit=1").await.json();
    assert_eq!(paged["items"].as_array().unwrap().len(), 1);
    assert_eq!(paged["has_more"], true);
}

#[tokio::test]
async fn only_instructors_create_and_only_owners_edit() {
    let harness = TestHarness::start().await;
    let student = harness.student("Sam").await;
    let teacher = harness.instructor("Tess").await;
    let other = harness.instructor("Olga").await;

    harness
        .post("/v1/courses", student)
        .json(&json!({ "title": "Nope", "price_cents": 100 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let id = harness.course(teacher, "Rust 101", 4999).await;
    let edit = json!({ "title": "Rust 102", "price_cents": 5999, "sale_price_cents": 2999 });

    harness
        .put(&format!("/v1/courses/{id}"), other)
        .json(&edit)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let updated = harness.put(&format!("/v1/courses/{id}"), teacher).json(&edit).await;
    updated.assert_status_ok();
    let updated: Value = updated.json();
    assert_eq!(updated["title"], "Rust 102");
    assert_eq!(updated["approval_status"], "approved");

    harness
        .put(&format!("/v1/courses/{id}"), teacher)
        .json(&json!({ "title": "Bad", "price_cents": 100, "sale_price_cents": 500 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn soft_deleted_course_leaves_catalog() {
    let harness = TestHarness::start().await;
    let teacher = harness.instructor("Tess").await;
    let id = harness.course(teacher, "Rust 101", 4999).await;

    harness
        .delete(&format!("/v1/courses/{id}"), teacher)
        .await
        .assert_status_ok();

    let listed: Value = harness.server.get("/v1/courses").await.json();
    assert_eq!(listed["total"], 0);
    harness
        .server
        .get(&format!("/v1/courses/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_content_requires_access_unless_preview() {
    let harness = TestHarness::start().await;
    let teacher = harness.instructor("Tess").await;
    let student = harness.student("Sam").await;
    let id = harness.course(teacher, "Rust 101", 0).await;

    harness
        .post(&format!("/v1/courses/{id}/lessons"), teacher)
        .json(&json!({ "title": "Welcome", "content": "free", "position": 1, "is_preview": true }))
        .await
        .assert_status_ok();
    harness.lesson(teacher, &id, "Ownership", 2).await;

    let lessons: Value = harness
        .server
        .get(&format!("/v1/courses/{id}/lessons"))
        .await
        .json();
    assert_eq!(lessons[0]["title"], "Welcome");
    assert_eq!(lessons[0]["content"], "free");
    assert!(lessons[1]["content"].is_null());

    harness.buy(student, json!([item("course", &id)]), None).await;

    let lessons: Value = harness
        .get(&format!("/v1/courses/{id}/lessons"), student)
        .await
        .json();
    assert_eq!(lessons[1]["content"], "Ownership body");

    let detail: Value = harness.server.get(&format!("/v1/courses/{id}")).await.json();
    assert_eq!(detail["lesson_count"], 2);
}

#[tokio::test]
async fn book_chapters_follow_the_same_rules() {
    let harness = TestHarness::start().await;
    let teacher = harness.instructor("Tess").await;
    let id = harness.book(teacher, "The Rust Book", 2500).await;

    let chapter = harness
        .post(&format!("/v1/books/{id}/chapters"), teacher)
        .json(&json!({ "title": "Getting started", "content": "install rustup", "position": 1 }))
        .await;
    chapter.assert_status_ok();

    let chapters: Value = harness
        .server
        .get(&format!("/v1/books/{id}/chapters"))
        .await
        .json();
    assert_eq!(chapters[0]["title"], "Getting started");
    assert!(chapters[0]["content"].is_null());

    let owner_view: Value = harness
        .get(&format!("/v1/books/{id}/chapters"), teacher)
        .await
        .json();
    assert_eq!(owner_view[0]["content"], "install rustup");

    let books: Value = harness.server.get("/v1/books").await.json();
    assert_eq!(books["total"], 1);
}

#[tokio::test]
async fn learning_paths_bundle_approved_courses() {
    let harness = TestHarness::start().await;
    let teacher = harness.instructor("Tess").await;
    let a = harness.course(teacher, "Rust 101", 3000).await;
    let b = harness.course(teacher, "Rust 201", 3000).await;
    let draft = harness.draft_course(teacher, "Rust 301", 3000).await;

    harness
        .post("/v1/learning-paths", teacher)
        .json(&json!({ "title": "Rust track", "course_ids": [a, draft], "price_cents": 5000 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let path = harness
        .post("/v1/learning-paths", teacher)
        .json(&json!({ "title": "Rust track", "course_ids": [a, b], "price_cents": 5000 }))
        .await;
    path.assert_status_ok();
    let path_id = path.json::<Value>()["id"].as_str().unwrap().to_string();

    let listed: Value = harness.server.get("/v1/learning-paths").await.json();
    assert_eq!(listed["total"], 0);

    harness.approve("learning_path", &path_id).await;

    let detail: Value = harness
        .server
        .get(&format!("/v1/learning-paths/{path_id}"))
        .await
        .json();
    assert_eq!(detail["courses"].as_array().unwrap().len(), 2);
    assert_eq!(detail["courses"][0]["title"], "Rust 101");
}
