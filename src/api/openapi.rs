//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, book_instances, books, catalog, genres, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "0.1.0",
        description = "Library catalog: authors, genres, books and their copies. \
            Pages are JSON payloads; form submissions are urlencoded and answer with redirects."
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        catalog::index,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author_form,
        authors::create_author,
        authors::update_author_form,
        authors::update_author,
        authors::delete_author_form,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre_form,
        genres::create_genre,
        genres::update_genre_form,
        genres::update_genre,
        genres::delete_genre_form,
        genres::delete_genre,
        // Books
        books::list_books,
        books::get_book,
        books::create_book_form,
        books::create_book,
        books::update_book_form,
        books::update_book,
        books::delete_book_form,
        books::delete_book,
        // Book instances
        book_instances::list_book_instances,
        book_instances::get_book_instance,
        book_instances::create_book_instance_form,
        book_instances::create_book_instance,
        book_instances::update_book_instance_form,
        book_instances::update_book_instance,
        book_instances::delete_book_instance_form,
        book_instances::delete_book_instance,
    ),
    components(
        schemas(
            // Records
            crate::models::Author,
            crate::models::AuthorView,
            crate::models::AuthorForm,
            crate::models::AuthorDraft,
            crate::models::Genre,
            crate::models::GenreView,
            crate::models::GenreForm,
            crate::models::GenreDraft,
            crate::models::Book,
            crate::models::BookView,
            crate::models::BookForm,
            crate::models::BookDraft,
            crate::models::BookInstance,
            crate::models::BookInstanceView,
            crate::models::BookInstanceForm,
            crate::models::BookInstanceDraft,
            crate::models::CopyStatus,
            // Pages
            crate::views::IndexPage,
            crate::views::AuthorListPage,
            crate::views::AuthorDetailPage,
            crate::views::AuthorFormPage,
            crate::views::AuthorDeletePage,
            crate::views::GenreListPage,
            crate::views::GenreDetailPage,
            crate::views::GenreFormPage,
            crate::views::GenreDeletePage,
            crate::views::BookWithAuthor,
            crate::views::BookListPage,
            crate::views::BookDetailPage,
            crate::views::BookFormPage,
            crate::views::BookDeletePage,
            crate::views::BookInstanceWithBook,
            crate::views::BookInstanceListPage,
            crate::views::BookInstanceDetailPage,
            crate::views::BookInstanceFormPage,
            crate::views::BookInstanceDeletePage,
            crate::validation::FieldError,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog summary"),
        (name = "authors", description = "Authors"),
        (name = "genres", description = "Genres, unique by name regardless of case"),
        (name = "books", description = "Books"),
        (name = "bookinstances", description = "Physical copies of books")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
