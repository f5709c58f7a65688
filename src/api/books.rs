//! Book pages

use axum::{
    extract::State,
    response::Response,
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::{AppResult, ErrorResponse},
    models::BookForm,
    services::{DeleteOutcome, FormOutcome},
    views::{BookDeletePage, BookDetailPage, BookFormPage, BookListPage},
    AppState,
};

use super::{confirmation, CatalogId};

/// List books with their authors, by title
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    responses(
        (status = 200, description = "Book list", body = BookListPage)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<BookListPage>> {
    let page = state.services.books.list().await?;
    Ok(Json(page))
}

/// Book with its author, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetailPage),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<BookDetailPage>> {
    let page = state.services.books.detail(id).await?;
    Ok(Json(page))
}

/// Empty book form with the authors and genres to choose from
#[utoipa::path(
    get,
    path = "/catalog/book/create",
    tag = "books",
    responses(
        (status = 200, description = "Book form", body = BookFormPage)
    )
)]
pub async fn create_book_form(State(state): State<AppState>) -> AppResult<Json<BookFormPage>> {
    let page = state.services.books.create_form().await?;
    Ok(Json(page))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/book/create",
    tag = "books",
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Book created, redirect to its page"),
        (status = 422, description = "Invalid form", body = BookFormPage)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Form(form): Form<BookForm>,
) -> AppResult<FormOutcome<BookFormPage>> {
    state.services.books.create(&form).await
}

/// Book form filled with the stored values
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book form", body = BookFormPage),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<BookFormPage>> {
    let page = state.services.books.update_form(id).await?;
    Ok(Json(page))
}

/// Update a book, replacing its genre set
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body(content = BookForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Book updated, redirect to its page"),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 422, description = "Invalid form", body = BookFormPage)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
    Form(form): Form<BookForm>,
) -> AppResult<FormOutcome<BookFormPage>> {
    state.services.books.update(id, &form).await
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book and its copies", body = BookDeletePage),
        (status = 303, description = "Book does not exist, redirect to the list")
    )
)]
pub async fn delete_book_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Response> {
    let page = state.services.books.delete_form(id).await?;
    Ok(confirmation(page, "/catalog/books"))
}

/// Delete a book that has no copies
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Book deleted, redirect to the list"),
        (status = 409, description = "Copies of the book still exist", body = BookDeletePage)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<DeleteOutcome<BookDeletePage>> {
    state.services.books.delete(id).await
}
