// tests/api_tests.rs

mod common;

use std::sync::atomic::Ordering;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use blog_backend::utils::jwt::sign_jwt;
use common::{InMemoryPostStore, RecordingMediaStore, TEST_SECRET, test_app};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----blog-backend-test-boundary";

fn token(role: &str) -> String {
    sign_jwt("u1", "tester", role, TEST_SECRET, 600).unwrap()
}

/// Hand-built multipart body: text fields plus an optional `image` file part.
fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn form_request(method: &str, uri: &str, bearer: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = test_app(&InMemoryPostStore::new(), &RecordingMediaStore::new());

    let response = app.oneshot(get("/random_path_that_does_not_exist")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_posts_returns_envelope_with_pagination() {
    // Arrange
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    for i in 0..3 {
        store.seed_post(&format!("post-{}", i), "Post", "C1", "", i);
    }
    let app = test_app(&store, &RecordingMediaStore::new());

    // Act
    let response = app.oneshot(get("/api/v1/post?page=1&limit=2")).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["id"], "post-0");
    assert_eq!(body["data"][0]["category"]["name"], "News");
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["totalPosts"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn list_posts_uses_default_paging() {
    let app = test_app(&InMemoryPostStore::new(), &RecordingMediaStore::new());

    let response = app.oneshot(get("/api/v1/post")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["totalPages"], 0);
}

#[tokio::test]
async fn zero_page_is_bad_request() {
    let app = test_app(&InMemoryPostStore::new(), &RecordingMediaStore::new());

    let response = app.oneshot(get("/api/v1/post?page=0")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 400);
}

#[tokio::test]
async fn missing_post_is_404_with_error_body() {
    let app = test_app(&InMemoryPostStore::new(), &RecordingMediaStore::new());

    let response = app.oneshot(get("/api/v1/post/ghost")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "Post not found");
}

#[tokio::test]
async fn search_failure_still_returns_200_and_empty_list() {
    let store = InMemoryPostStore::new();
    store.fail_reads.store(true, Ordering::SeqCst);
    let app = test_app(&store, &RecordingMediaStore::new());

    let response = app.oneshot(get("/api/v1/post/search?q=rust")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn category_listing_route_is_not_shadowed_by_id_route() {
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    store.seed_post("p1", "In C1", "C1", "", 0);
    let app = test_app(&store, &RecordingMediaStore::new());

    let response = app.oneshot(get("/api/v1/post/category/C1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["id"], "p1");
    assert_eq!(body["data"][0]["comments"], serde_json::json!([]));
}

#[tokio::test]
async fn create_without_token_is_401() {
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    let app = test_app(&store, &RecordingMediaStore::new());

    let body = multipart_body(&[("title", "T"), ("content", "C"), ("categoryId", "C1")], None);
    let response = app
        .oneshot(form_request("POST", "/api/v1/post", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.creates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_with_non_admin_token_is_403() {
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    let app = test_app(&store, &RecordingMediaStore::new());

    let body = multipart_body(&[("title", "T"), ("content", "C"), ("categoryId", "C1")], None);
    let response = app
        .oneshot(form_request("POST", "/api/v1/post", Some(&token("user")), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_post_with_cover() {
    // Arrange
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    let media = RecordingMediaStore::new();
    let app = test_app(&store, &media);

    let body = multipart_body(
        &[("title", "Post A"), ("content", "<p>Hello</p>"), ("categoryId", "C1")],
        Some(b"\x89PNG fake"),
    );

    // Act
    let response = app
        .oneshot(form_request("POST", "/api/v1/post", Some(&token("admin")), body))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["message"], "Post created successfully");
    assert_eq!(body["data"]["title"], "Post A");
    assert_eq!(body["data"]["categoryId"], "C1");
    assert_eq!(body["data"]["imageUrl"], "http://media.test/covers/img-1.jpg");

    let uploads = media.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].file_name.as_deref(), Some("cover.png"));
}

#[tokio::test]
async fn admin_update_replaces_cover() {
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    store.seed_post("A", "Post A", "C1", "http://host/old.jpg", 0);
    let media = RecordingMediaStore::new();
    let app = test_app(&store, &media);

    let body = multipart_body(&[("title", "Renamed")], Some(b"\x89PNG new"));
    let response = app
        .oneshot(form_request("PUT", "/api/v1/post/A", Some(&token("admin")), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Post updated successfully");
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["imageUrl"], "http://media.test/covers/img-1.jpg");
    assert_eq!(media.deleted_ids(), vec!["old".to_string()]);
}

#[tokio::test]
async fn delete_missing_post_is_404() {
    let store = InMemoryPostStore::new();
    let app = test_app(&store, &RecordingMediaStore::new());

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/post/ghost")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("admin")))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delete_existing_post_returns_message_only() {
    let store = InMemoryPostStore::new();
    store.add_category("C1", "News");
    store.seed_post("A", "Post A", "C1", "", 0);
    let app = test_app(&store, &RecordingMediaStore::new());

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/post/A")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("admin")))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Post deleted successfully");
    assert!(body.get("data").is_none());
    assert!(store.post("A").is_none());
}

#[tokio::test]
async fn openapi_document_lists_post_paths() {
    let app = test_app(&InMemoryPostStore::new(), &RecordingMediaStore::new());

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/api/v1/post/{id}"].is_object());
}
