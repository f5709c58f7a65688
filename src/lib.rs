//! Local Library catalog server
//!
//! Tracks authors, genres, books and the physical copies of books, and keeps
//! them consistent: a record still referenced by another one cannot be
//! deleted, and genre names are unique regardless of case. Pages are served
//! as JSON payloads; form submissions answer with redirects.

use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::Repository;
use services::Services;

/// Hardening headers added to every response that does not set its own
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("x-dns-prefetch-control", "off"),
    ("x-xss-protection", "0"),
    ("cross-origin-opener-policy", "same-origin"),
];

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(Services::new(repository)),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog = Router::new()
        .route("/", get(api::catalog::index))
        // Authors
        .route("/authors", get(api::authors::list_authors))
        .route(
            "/author/create",
            get(api::authors::create_author_form).post(api::authors::create_author),
        )
        .route("/author/:id", get(api::authors::get_author))
        .route(
            "/author/:id/update",
            get(api::authors::update_author_form).post(api::authors::update_author),
        )
        .route(
            "/author/:id/delete",
            get(api::authors::delete_author_form).post(api::authors::delete_author),
        )
        // Genres
        .route("/genres", get(api::genres::list_genres))
        .route(
            "/genre/create",
            get(api::genres::create_genre_form).post(api::genres::create_genre),
        )
        .route("/genre/:id", get(api::genres::get_genre))
        .route(
            "/genre/:id/update",
            get(api::genres::update_genre_form).post(api::genres::update_genre),
        )
        .route(
            "/genre/:id/delete",
            get(api::genres::delete_genre_form).post(api::genres::delete_genre),
        )
        // Books
        .route("/books", get(api::books::list_books))
        .route(
            "/book/create",
            get(api::books::create_book_form).post(api::books::create_book),
        )
        .route("/book/:id", get(api::books::get_book))
        .route(
            "/book/:id/update",
            get(api::books::update_book_form).post(api::books::update_book),
        )
        .route(
            "/book/:id/delete",
            get(api::books::delete_book_form).post(api::books::delete_book),
        )
        // Copies
        .route("/bookinstances", get(api::book_instances::list_book_instances))
        .route(
            "/bookinstance/create",
            get(api::book_instances::create_book_instance_form)
                .post(api::book_instances::create_book_instance),
        )
        .route("/bookinstance/:id", get(api::book_instances::get_book_instance))
        .route(
            "/bookinstance/:id/update",
            get(api::book_instances::update_book_instance_form)
                .post(api::book_instances::update_book_instance),
        )
        .route(
            "/bookinstance/:id/delete",
            get(api::book_instances::delete_book_instance_form)
                .post(api::book_instances::delete_book_instance),
        );

    let app = Router::new()
        .route("/", get(|| async { Redirect::to("/catalog") }))
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .nest("/catalog", catalog)
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    let mut app = app.merge(openapi);
    for &(name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    app.layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
