//! Author pages

use axum::{
    extract::State,
    response::Response,
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::{AppResult, ErrorResponse},
    models::AuthorForm,
    services::{DeleteOutcome, FormOutcome},
    views::{AuthorDeletePage, AuthorDetailPage, AuthorFormPage, AuthorListPage},
    AppState,
};

use super::{confirmation, CatalogId};

/// List authors, by family name
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "authors",
    responses(
        (status = 200, description = "Author list", body = AuthorListPage)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<AuthorListPage>> {
    let page = state.services.authors.list().await?;
    Ok(Json(page))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetailPage),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<AuthorDetailPage>> {
    let page = state.services.authors.detail(id).await?;
    Ok(Json(page))
}

/// Empty author form
#[utoipa::path(
    get,
    path = "/catalog/author/create",
    tag = "authors",
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage)
    )
)]
pub async fn create_author_form(State(state): State<AppState>) -> Json<AuthorFormPage> {
    Json(state.services.authors.create_form())
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create",
    tag = "authors",
    request_body(content = AuthorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Author created, redirect to its page"),
        (status = 422, description = "Invalid form", body = AuthorFormPage)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Form(form): Form<AuthorForm>,
) -> AppResult<FormOutcome<AuthorFormPage>> {
    state.services.authors.create(&form).await
}

/// Author form filled with the stored values
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author form", body = AuthorFormPage),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn update_author_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<AuthorFormPage>> {
    let page = state.services.authors.update_form(id).await?;
    Ok(Json(page))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    request_body(content = AuthorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Author updated, redirect to its page"),
        (status = 404, description = "Author not found", body = ErrorResponse),
        (status = 422, description = "Invalid form", body = AuthorFormPage)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
    Form(form): Form<AuthorForm>,
) -> AppResult<FormOutcome<AuthorFormPage>> {
    state.services.authors.update(id, &form).await
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author and the books referencing it", body = AuthorDeletePage),
        (status = 303, description = "Author does not exist, redirect to the list")
    )
)]
pub async fn delete_author_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Response> {
    let page = state.services.authors.delete_form(id).await?;
    Ok(confirmation(page, "/catalog/authors"))
}

/// Delete an author that no book references
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Author deleted, redirect to the list"),
        (status = 409, description = "Books still reference the author", body = AuthorDeletePage)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<DeleteOutcome<AuthorDeletePage>> {
    state.services.authors.delete(id).await
}
