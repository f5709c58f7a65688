//! API integration tests
//!
//! Drive the full router in-process on the in-memory catalog store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use locallibrary_server::{
    config::AppConfig, create_router, repository::MemoryCatalogStore, AppState,
};

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

fn app() -> Router {
    let state = AppState::new(AppConfig::default(), Arc::new(MemoryCatalogStore::new()));
    create_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = tokio_test::assert_ok!(app.clone().oneshot(request).await);
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        location,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_form(app: &Router, uri: &str, form: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

/// Submit a form that must succeed, returning the redirect target
async fn create(app: &Router, uri: &str, form: &str) -> String {
    let response = post_form(app, uri, form).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{} rejected: {}", uri, response.body);
    response.location.expect("redirect without location")
}

fn id_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let response = get(&app, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");

    let response = get(&app, "/ready").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let request = Request::builder().uri("/catalog").body(Body::empty()).unwrap();
    let response = tokio_test::assert_ok!(app().oneshot(request).await);
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let response = get(&app(), "/").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog"));
}

#[tokio::test]
async fn test_author_lifecycle() {
    let app = app();

    let path = create(
        &app,
        "/catalog/author/create",
        "first_name=+Jane+&family_name=Austen&date_of_birth=1775-12-16&date_of_death=1817-07-18",
    )
    .await;
    assert!(path.starts_with("/catalog/author/"));

    let response = get(&app, &path).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Author Detail");
    assert_eq!(response.body["author"]["name"], "Austen, Jane");
    assert_eq!(response.body["author"]["lifespan"], "1775 - 1817");
    assert_eq!(response.body["author"]["date_of_birth_formatted"], "Dec 16, 1775");

    let update = format!("{}/update", path);
    let response = get(&app, &update).await;
    assert_eq!(response.body["author"]["family_name"], "Austen");

    let updated = create(&app, &update, "first_name=Jane&family_name=Austen&date_of_death=").await;
    assert_eq!(updated, path);
    let response = get(&app, &path).await;
    assert_eq!(response.body["author"]["lifespan"], " - ");

    let response = post_form(&app, &format!("{}/delete", path), "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/authors"));
    assert_eq!(get(&app, &path).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_author_is_returned_with_errors() {
    let app = app();

    let response = post_form(
        &app,
        "/catalog/author/create",
        "first_name=&family_name=%3Cb%3EAusten%3C%2Fb%3E&date_of_birth=not-a-date",
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["title"], "Create Author");
    let errors = response.body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "first_name");
    assert_eq!(errors[0]["message"], "First name must be specified.");
    assert_eq!(errors[1]["message"], "Invalid date of birth");
    assert_eq!(response.body["author"]["family_name"], "&lt;b&gt;Austen&lt;&#x2F;b&gt;");

    let response = get(&app, "/catalog/authors").await;
    assert!(response.body["author_list"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_genre_names_are_unique_regardless_of_case() {
    let app = app();

    let first = create(&app, "/catalog/genre/create", "name=Fantasy").await;
    let second = create(&app, "/catalog/genre/create", "name=fantasy+").await;
    assert_eq!(first, second);

    let response = get(&app, "/catalog/genres").await;
    let genres = response.body["genre_list"].as_array().unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0]["name"], "Fantasy");

    let response = post_form(&app, "/catalog/genre/create", "name=SF").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"][0]["message"],
        "Genre name must contain at least 3 characters"
    );
}

#[tokio::test]
async fn test_genre_rename_onto_taken_name_is_rejected() {
    let app = app();

    create(&app, "/catalog/genre/create", "name=Fantasy").await;
    let poetry = create(&app, "/catalog/genre/create", "name=Poetry").await;

    let response = post_form(&app, &format!("{}/update", poetry), "name=fantasy").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"][0]["message"], "Genre with this name already exists");
    assert_eq!(get(&app, &poetry).await.body["genre"]["name"], "Poetry");
}

#[tokio::test]
async fn test_book_with_genres_and_guarded_deletes() {
    let app = app();

    let author = create(&app, "/catalog/author/create", "first_name=Ursula&family_name=Le+Guin").await;
    let fantasy = create(&app, "/catalog/genre/create", "name=Fantasy").await;
    let science = create(&app, "/catalog/genre/create", "name=Science+Fiction").await;

    let form = format!(
        "title=A+Wizard+of+Earthsea&author={}&summary=Ged&isbn=9780547773742&genre={}&genre={}",
        id_of(&author),
        id_of(&fantasy),
        id_of(&science)
    );
    let book = create(&app, "/catalog/book/create", &form).await;

    let response = get(&app, &book).await;
    assert_eq!(response.body["title"], "A Wizard of Earthsea");
    assert_eq!(response.body["author"]["name"], "Le Guin, Ursula");
    assert_eq!(response.body["genres"].as_array().unwrap().len(), 2);

    let copy = create(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={}&imprint=Parnassus%2C+1968&status=Available", id_of(&book)),
    )
    .await;

    // Every referenced record refuses to go
    for (path, dependents) in [
        (&author, "author_books"),
        (&fantasy, "genre_books"),
        (&book, "book_instances"),
    ] {
        let response = post_form(&app, &format!("{}/delete", path), "").await;
        assert_eq!(response.status, StatusCode::CONFLICT, "{} was deleted", path);
        assert_eq!(response.body[dependents].as_array().unwrap().len(), 1);
        assert_eq!(get(&app, path).await.status, StatusCode::OK);
    }

    let summary = get(&app, "/catalog").await.body;
    assert_eq!(summary["title"], "Local Library Home");
    assert_eq!(summary["book_count"], 1);
    assert_eq!(summary["book_instance_count"], 1);
    assert_eq!(summary["book_instance_available_count"], 1);
    assert_eq!(summary["author_count"], 1);
    assert_eq!(summary["genre_count"], 2);

    // Unwind from the copies up
    let response = post_form(&app, &format!("{}/delete", copy), "").await;
    assert_eq!(response.location.as_deref(), Some("/catalog/bookinstances"));
    let response = post_form(&app, &format!("{}/delete", book), "").await;
    assert_eq!(response.location.as_deref(), Some("/catalog/books"));
    let response = post_form(&app, &format!("{}/delete", fantasy), "").await;
    assert_eq!(response.location.as_deref(), Some("/catalog/genres"));
    let response = post_form(&app, &format!("{}/delete", author), "").await;
    assert_eq!(response.location.as_deref(), Some("/catalog/authors"));

    let summary = get(&app, "/catalog").await.body;
    assert_eq!(summary["book_count"], 0);
    assert_eq!(summary["author_count"], 0);
    assert_eq!(summary["genre_count"], 1);
}

#[tokio::test]
async fn test_book_update_without_genres_clears_them() {
    let app = app();

    let author = create(&app, "/catalog/author/create", "first_name=Ursula&family_name=Le+Guin").await;
    let genre = create(&app, "/catalog/genre/create", "name=Fantasy").await;
    let form = format!(
        "title=Tehanu&author={}&summary=Tenar&isbn=9780689315954&genre={}",
        id_of(&author),
        id_of(&genre)
    );
    let book = create(&app, "/catalog/book/create", &form).await;

    let response = get(&app, &format!("{}/update", book)).await;
    assert_eq!(response.body["selected_genres"], serde_json::json!([id_of(&genre).parse::<i32>().unwrap()]));
    assert_eq!(response.body["genres"].as_array().unwrap().len(), 1);

    let form = format!("title=Tehanu&author={}&summary=Tenar&isbn=9780689315954", id_of(&author));
    assert_eq!(create(&app, &format!("{}/update", book), &form).await, book);

    let response = get(&app, &book).await;
    assert!(response.body["genres"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_book_list_is_ordered_by_title() {
    let app = app();

    let author = create(&app, "/catalog/author/create", "first_name=Frank&family_name=Herbert").await;
    for title in ["Dune+Messiah", "Children+of+Dune", "Dune"] {
        let form = format!("title={}&author={}&summary=Arrakis&isbn=0441172717", title, id_of(&author));
        create(&app, "/catalog/book/create", &form).await;
    }

    let response = get(&app, "/catalog/books").await;
    let titles: Vec<&str> = response.body["book_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["book"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Children of Dune", "Dune", "Dune Messiah"]);
}

#[tokio::test]
async fn test_book_rejects_unknown_references() {
    let app = app();

    let response = post_form(
        &app,
        "/catalog/book/create",
        "title=Orphan&author=77&summary=Nobody&isbn=1&genre=abc",
    )
    .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let messages: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["Author not found", "Invalid genre"]);
    assert_eq!(get(&app, "/catalog").await.body["book_count"], 0);
}

#[tokio::test]
async fn test_missing_and_malformed_targets() {
    let app = app();

    let response = get(&app, "/catalog/book/41").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], 5);

    let response = get(&app, "/catalog/genre/41/update").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = get(&app, "/catalog/author/not-a-number").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], 18);

    // Delete views and deletes of missing records fall back to the list
    let response = get(&app, "/catalog/author/41/delete").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/authors"));
    let response = post_form(&app, "/catalog/bookinstance/41/delete", "").await;
    assert_eq!(response.location.as_deref(), Some("/catalog/bookinstances"));
}

#[tokio::test]
async fn test_book_instance_form_defaults() {
    let app = app();

    let response = get(&app, "/catalog/bookinstance/create").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["statuses"],
        serde_json::json!(["Available", "Maintenance", "Loaned", "Reserved"])
    );

    let response = post_form(&app, "/catalog/bookinstance/create", "book=&imprint=&status=Lost").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["book", "imprint", "status"]);
}
