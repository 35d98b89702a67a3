//! In-process tests of the HTTP API over the in-memory store

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use catalog_server::{
    api, models::Fixture, repository::Repository, AppConfig, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const FIXTURE: &str = r#"{
    "authors": [
        {"id": 1, "name": "J.R.R. Tolkien", "birth_date": "1892-01-03", "country": "UK"},
        {"id": 2, "name": "Ursula K. Le Guin", "birth_date": "1929-10-21", "country": "USA"}
    ],
    "books": [
        {"title": "The Hobbit", "author_id": 1, "published_date": "1937-09-21", "isbn": "9780547928227"},
        {"title": "The Fellowship of the Ring", "author_id": 1, "published_date": "1954-07-29", "isbn": "9780547928210"},
        {"title": "A Wizard of Earthsea", "author_id": 2, "published_date": "1968-11-01", "isbn": "9780547773742"}
    ]
}"#;

fn empty_app() -> (Router, AppState) {
    let state = AppState::new(AppConfig::default(), Repository::in_memory());
    (api::create_router(state.clone()), state)
}

async fn loaded_app() -> Router {
    let (app, state) = empty_app();
    let fixture = Fixture::from_json(FIXTURE).expect("fixture parses");
    state
        .services
        .fixtures
        .load(&fixture)
        .await
        .expect("fixture loads");
    app
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("router never fails");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, text) = send_raw(app, method, uri, body).await;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).expect("JSON body")
    };
    (status, value)
}

fn titles(books: &Value) -> Vec<&str> {
    books
        .as_array()
        .expect("array")
        .iter()
        .map(|b| b["title"].as_str().expect("title"))
        .collect()
}

#[tokio::test]
async fn test_fixture_scenario() {
    let app = loaded_app().await;

    let (status, author) = send(&app, Method::GET, "/api/authors/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author["name"], "J.R.R. Tolkien");
    let hobbit = author["books"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["title"] == "The Hobbit")
        .expect("The Hobbit is listed")
        .clone();
    assert_eq!(hobbit["isbn"], "9780547928227");
    assert_eq!(hobbit["published_date"], "1937-09-21");
    assert!(hobbit.get("author").is_none());

    let id = hobbit["id"].as_i64().unwrap();
    let (status, book) = send(&app, Method::GET, &format!("/api/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["author"]["name"], "J.R.R. Tolkien");
    assert_eq!(book["author"]["country"], "UK");
}

#[tokio::test]
async fn test_create_then_retrieve_author() {
    let (app, _) = empty_app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/authors",
        Some(json!({"name": "Octavia E. Butler", "birth_date": "1947-06-22", "country": "USA"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().expect("assigned id");

    let (status, fetched) = send(&app, Method::GET, &format!("/api/authors/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched,
        json!({
            "id": id,
            "name": "Octavia E. Butler",
            "birth_date": "1947-06-22",
            "country": "USA",
            "books": []
        })
    );
}

#[tokio::test]
async fn test_delete_author_without_books_touches_nothing_else() {
    let app = loaded_app().await;
    let (_, created) = send(&app, Method::POST, "/api/authors", Some(json!({"name": "Nobody"}))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/authors/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/api/authors/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, authors) = send(&app, Method::GET, "/api/authors", None).await;
    assert_eq!(authors.as_array().unwrap().len(), 2);
    let (_, books) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(books.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_author_cascades_to_books() {
    let app = loaded_app().await;
    let (_, author) = send(&app, Method::GET, "/api/authors/1", None).await;
    let book_ids: Vec<i64> = author["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(book_ids.len(), 2);

    let (status, _) = send(&app, Method::DELETE, "/api/authors/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for id in book_ids {
        let (status, body) = send(&app, Method::GET, &format!("/api/books/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NoSuchRecord");
    }
    let (_, books) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(titles(&books), vec!["A Wizard of Earthsea"]);
}

#[tokio::test]
async fn test_duplicate_isbn_is_rejected() {
    let app = loaded_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({
            "title": "The Hobbit (reprint)",
            "author_id": 1,
            "published_date": "2012-09-18",
            "isbn": "9780547928227"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let (_, books) = send(&app, Method::GET, "/api/books", None).await;
    assert_eq!(books.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_author_reference() {
    let app = loaded_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({
            "title": "Ghost Book",
            "author_id": 999,
            "published_date": "2001-01-01",
            "isbn": "1234567890"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadReference");

    let (_, books) = send(&app, Method::GET, "/api/books?search=Ghost", None).await;
    assert!(books.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_books_by_author_name() {
    let app = loaded_app().await;

    let (status, books) = send(&app, Method::GET, "/api/books?search=tolkien", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&books), vec!["The Fellowship of the Ring", "The Hobbit"]);
    assert!(books
        .as_array()
        .unwrap()
        .iter()
        .all(|b| b["author"]["name"] == "J.R.R. Tolkien"));
}

#[tokio::test]
async fn test_search_books_by_isbn_and_ordering() {
    let app = loaded_app().await;

    let (_, books) = send(&app, Method::GET, "/api/books?search=9780547773742", None).await;
    assert_eq!(titles(&books), vec!["A Wizard of Earthsea"]);

    let (_, books) = send(&app, Method::GET, "/api/books?ordering=-published_date", None).await;
    assert_eq!(
        titles(&books),
        vec!["A Wizard of Earthsea", "The Fellowship of the Ring", "The Hobbit"]
    );

    let (_, books) = send(&app, Method::GET, "/api/books?search=", None).await;
    assert_eq!(books.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_author_listing_search_and_ordering() {
    let app = loaded_app().await;

    let (_, authors) = send(&app, Method::GET, "/api/authors?search=usa", None).await;
    let names: Vec<&str> = authors.as_array().unwrap().iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Ursula K. Le Guin"]);

    let (_, authors) = send(&app, Method::GET, "/api/authors?ordering=-birth_date", None).await;
    let names: Vec<&str> = authors.as_array().unwrap().iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Ursula K. Le Guin", "J.R.R. Tolkien"]);
    assert_eq!(authors[1]["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_ordering_field() {
    let app = loaded_app().await;

    let (status, body) = send(&app, Method::GET, "/api/authors?ordering=title", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert!(body["fields"]["ordering"].is_array());
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = loaded_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books",
        Some(json!({"title": "No date", "author_id": 1, "isbn": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = send(&app, Method::POST, "/api/authors", Some(json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["name"].is_array());
}

#[tokio::test]
async fn test_put_and_patch_author() {
    let app = loaded_app().await;

    let (status, author) = send(
        &app,
        Method::PATCH,
        "/api/authors/2",
        Some(json!({"birth_date": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author["birth_date"], Value::Null);
    assert_eq!(author["country"], "USA");

    let (status, author) = send(
        &app,
        Method::PUT,
        "/api/authors/2",
        Some(json!({"name": "Ursula Kroeber Le Guin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(author["name"], "Ursula Kroeber Le Guin");
    assert_eq!(author["country"], "");
    assert_eq!(author["books"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::PATCH, "/api/authors/99", Some(json!({"name": "X"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_book_moves_it_to_another_author() {
    let app = loaded_app().await;
    let (_, books) = send(&app, Method::GET, "/api/books?search=Earthsea", None).await;
    let id = books[0]["id"].as_i64().unwrap();

    let (status, book) = send(
        &app,
        Method::PATCH,
        &format!("/api/books/{}", id),
        Some(json!({"author_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["author"]["name"], "J.R.R. Tolkien");
    assert_eq!(book["isbn"], "9780547773742");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/books/{}", id),
        Some(json!({"author_id": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_missing_book() {
    let (app, _) = empty_app();
    let (status, body) = send(&app, Method::DELETE, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 3);
}

#[tokio::test]
async fn test_html_pages() {
    let app = loaded_app().await;

    let (status, html) = send_raw(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("href=\"/authors\""));

    let (status, html) = send_raw(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<td>The Hobbit</td><td>J.R.R. Tolkien</td>"));

    let (status, html) = send_raw(&app, Method::GET, "/authors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Ursula K. Le Guin"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = empty_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unparsable_id_is_not_found() {
    let app = loaded_app().await;

    for (method, uri) in [
        (Method::GET, "/api/authors/abc"),
        (Method::DELETE, "/api/authors/abc"),
        (Method::GET, "/api/books/99999999999"),
        (Method::PATCH, "/api/books/-"),
    ] {
        let body = (method == Method::PATCH).then(|| json!({"title": "X"}));
        let (status, body) = send(&app, method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["error"], "NoSuchRecord");
        assert_eq!(body["code"], 3);
    }
}

#[tokio::test]
async fn test_patch_null_on_required_field() {
    let app = loaded_app().await;

    let (status, body) = send(&app, Method::PATCH, "/api/authors/1", Some(json!({"name": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (_, books) = send(&app, Method::GET, "/api/books?search=Hobbit", None).await;
    let id = books[0]["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/books/{}", id),
        Some(json!({"isbn": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, author) = send(&app, Method::GET, "/api/authors/1", None).await;
    assert_eq!(author["name"], "J.R.R. Tolkien");
}

#[tokio::test]
async fn test_fixture_with_largest_author_id_is_rejected() {
    let (app, state) = empty_app();
    let fixture = Fixture::from_json(&format!(
        r#"{{"authors": [{{"id": {}, "name": "Last Author", "birth_date": null, "country": ""}}], "books": []}}"#,
        i32::MAX
    ))
    .expect("fixture parses");

    let err = state.services.fixtures.load(&fixture).await.unwrap_err();
    assert!(matches!(err, catalog_server::AppError::Validation { .. }));

    let (_, authors) = send(&app, Method::GET, "/api/authors", None).await;
    assert!(authors.as_array().unwrap().is_empty());
}
