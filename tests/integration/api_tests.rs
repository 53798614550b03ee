//! API integration tests
//!
//! These run against a live server (any store backend).

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Each test works as its own user so reruns do not collide
fn user_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .subsec_nanos();
    (100_000 + nanos as i64 % 1_000_000).to_string()
}

/// Helper to create a book and return its id
async fn create_book(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "name": name,
            "author": "Integration",
            "category": "Testing",
            "price": "9.99",
            "description": "Created by the API tests"
        }))
        .send()
        .await
        .expect("Failed to send create request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse create response");
    body["id"].as_i64().expect("No id in response")
}

async fn favorite_count(client: &Client, id: i64) -> i64 {
    let body: Value = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["favorite_count"].as_i64().unwrap_or(0)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_book_crud() {
    let client = Client::new();
    let id = create_book(&client, "Integration CRUD").await;

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .json(&json!({ "name": "Integration CRUD v2" }))
        .send()
        .await
        .expect("Failed to send update request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["name"], "Integration CRUD v2");
    assert_eq!(body["favorite_count"], 0);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_search_books() {
    let client = Client::new();
    create_book(&client, "Integration Searchable").await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .query(&[("query", "integration searchable")])
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(!body.as_array().expect("Expected an array").is_empty());

    let response = client
        .get(format!("{}/books/favorite-sort", BASE_URL))
        .query(&[("query", "integration"), ("sort_type", "asc")])
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_favorite_flow() {
    let client = Client::new();
    let user = user_id();
    let id = create_book(&client, "Integration Favorite").await;

    let response = client
        .post(format!("{}/favorites", BASE_URL))
        .header("X-User-Id", &user)
        .json(&json!({ "book_id": id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(favorite_count(&client, id).await, 1);

    let response = client
        .post(format!("{}/favorites", BASE_URL))
        .header("X-User-Id", &user)
        .json(&json!({ "book_id": id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(favorite_count(&client, id).await, 1);

    let body: Value = client
        .get(format!("{}/favorites/check/{}", BASE_URL, id))
        .header("X-User-Id", &user)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["favorite"], true);

    let response = client
        .delete(format!("{}/favorites/{}", BASE_URL, id))
        .header("X-User-Id", &user)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(favorite_count(&client, id).await, 0);
}
