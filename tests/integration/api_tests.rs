//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

/// Isbn that does not collide with data left by earlier runs
fn unique_isbn(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn create_book(client: &Client, isbn: &str) -> Value {
    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({
            "title": "Integration Book",
            "author": "Integration Author",
            "isbn": isbn
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn create_loan(client: &Client, isbn: &str, customer: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&json!({
            "isbn": isbn,
            "customer": customer,
            "email": "customer@example.com"
        }))
        .send()
        .await
        .expect("Failed to send request")
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
async fn test_create_and_get_book() {
    let client = Client::new();
    let isbn = unique_isbn("get");
    let created = create_book(&client, &isbn).await;
    let id = created["id"].as_i64().expect("No book ID");

    let response = client
        .get(format!("{}/api/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["isbn"], isbn.as_str());
    assert_eq!(body["title"], "Integration Book");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let isbn = unique_isbn("dup");
    create_book(&client, &isbn).await;

    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({ "title": "Other", "author": "Other", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Isbn already exists.");
}

#[tokio::test]
#[ignore]
async fn test_search_books_by_isbn() {
    let client = Client::new();
    let isbn = unique_isbn("search");
    create_book(&client, &isbn).await;

    let response = client
        .get(format!("{}/api/books", BASE_URL))
        .query(&[("isbn", isbn.as_str())])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["content"].is_array());
    assert_eq!(body["total_elements"], 1);
}

#[tokio::test]
#[ignore]
async fn test_loan_and_return() {
    let client = Client::new();
    let isbn = unique_isbn("loan");
    create_book(&client, &isbn).await;

    let response = create_loan(&client, &isbn, "First Customer").await;
    assert_eq!(response.status(), 201);
    let loan_id: i64 = response.json().await.expect("Failed to parse response");

    let response = create_loan(&client, &isbn, "Second Customer").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book already loaned");

    let response = client
        .patch(format!("{}/api/loans/{}", BASE_URL, loan_id))
        .json(&json!({ "returned": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = create_loan(&client, &isbn, "Second Customer").await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_loan_unknown_isbn() {
    let client = Client::new();

    let response = create_loan(&client, &unique_isbn("missing"), "Customer").await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book not found for this isbn");
}

#[tokio::test]
#[ignore]
async fn test_missing_book_is_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/books/{}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
