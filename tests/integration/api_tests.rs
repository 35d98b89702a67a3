//! API integration tests against a running server
//!
//! Start the server first (`catalog-server serve`), then run them with
//! `cargo test -- --ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const SERVER_URL: &str = "http://localhost:8000";
const BASE_URL: &str = "http://localhost:8000/api";

/// Helper to create an author and return its id
async fn create_author(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({
            "name": name,
            "birth_date": "1950-01-01",
            "country": "Testland"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", SERVER_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_authors() {
    let client = Client::new();

    let response = client
        .get(format!("{}/authors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_author_crud() {
    let client = Client::new();
    let id = create_author(&client, "Integration Author").await;

    // Read
    let response = client
        .get(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "Integration Author");
    assert_eq!(body["books"], json!([]));

    // Partial update
    let response = client
        .patch(format!("{}/authors/{}", BASE_URL, id))
        .json(&json!({ "country": "Elsewhere" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["country"], "Elsewhere");
    assert_eq!(body["birth_date"], "1950-01-01");

    // Delete
    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle_and_cascade() {
    let client = Client::new();
    let author_id = create_author(&client, "Cascade Author").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Cascade Book",
            "author_id": author_id,
            "published_date": "2000-02-02",
            "isbn": "0000000001"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["author"]["id"].as_i64(), Some(author_id));
    let book_id = book["id"].as_i64().expect("No id in response");

    // Same ISBN again
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Cascade Book Again",
            "author_id": author_id,
            "published_date": "2000-02-02",
            "isbn": "0000000001"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, author_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_create_book_with_unknown_author() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "Orphan",
            "author_id": i32::MAX,
            "published_date": "2000-02-02",
            "isbn": "0000000002"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BadReference");
}

#[tokio::test]
#[ignore]
async fn test_invalid_ordering() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?ordering=price", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
