//! BookInstance (copy) pages

use axum::{
    extract::State,
    response::Response,
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::{AppResult, ErrorResponse},
    models::BookInstanceForm,
    services::{DeleteOutcome, FormOutcome},
    views::{
        BookInstanceDeletePage, BookInstanceDetailPage, BookInstanceFormPage, BookInstanceListPage,
    },
    AppState,
};

use super::{confirmation, CatalogId};

/// List copies with their books
#[utoipa::path(
    get,
    path = "/catalog/bookinstances",
    tag = "bookinstances",
    responses(
        (status = 200, description = "BookInstance list", body = BookInstanceListPage)
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
) -> AppResult<Json<BookInstanceListPage>> {
    let page = state.services.book_instances.list().await?;
    Ok(Json(page))
}

/// Copy with its book
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "bookinstances",
    params(("id" = i32, Path, description = "BookInstance ID")),
    responses(
        (status = 200, description = "BookInstance details", body = BookInstanceDetailPage),
        (status = 404, description = "BookInstance not found", body = ErrorResponse)
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<BookInstanceDetailPage>> {
    let page = state.services.book_instances.detail(id).await?;
    Ok(Json(page))
}

/// Empty copy form with the books and statuses to choose from
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/create",
    tag = "bookinstances",
    responses(
        (status = 200, description = "BookInstance form", body = BookInstanceFormPage)
    )
)]
pub async fn create_book_instance_form(
    State(state): State<AppState>,
) -> AppResult<Json<BookInstanceFormPage>> {
    let page = state.services.book_instances.create_form().await?;
    Ok(Json(page))
}

/// Create a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/create",
    tag = "bookinstances",
    request_body(content = BookInstanceForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "BookInstance created, redirect to its page"),
        (status = 422, description = "Invalid form", body = BookInstanceFormPage)
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<FormOutcome<BookInstanceFormPage>> {
    state.services.book_instances.create(&form).await
}

/// Copy form filled with the stored values
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/update",
    tag = "bookinstances",
    params(("id" = i32, Path, description = "BookInstance ID")),
    responses(
        (status = 200, description = "BookInstance form", body = BookInstanceFormPage),
        (status = 404, description = "BookInstance not found", body = ErrorResponse)
    )
)]
pub async fn update_book_instance_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<BookInstanceFormPage>> {
    let page = state.services.book_instances.update_form(id).await?;
    Ok(Json(page))
}

/// Update a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/update",
    tag = "bookinstances",
    params(("id" = i32, Path, description = "BookInstance ID")),
    request_body(content = BookInstanceForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "BookInstance updated, redirect to its page"),
        (status = 404, description = "BookInstance not found", body = ErrorResponse),
        (status = 422, description = "Invalid form", body = BookInstanceFormPage)
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<FormOutcome<BookInstanceFormPage>> {
    state.services.book_instances.update(id, &form).await
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "bookinstances",
    params(("id" = i32, Path, description = "BookInstance ID")),
    responses(
        (status = 200, description = "Copy and its book", body = BookInstanceDeletePage),
        (status = 303, description = "BookInstance does not exist, redirect to the list")
    )
)]
pub async fn delete_book_instance_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Response> {
    let page = state.services.book_instances.delete_form(id).await?;
    Ok(confirmation(page, "/catalog/bookinstances"))
}

/// Delete a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "bookinstances",
    params(("id" = i32, Path, description = "BookInstance ID")),
    responses(
        (status = 303, description = "BookInstance deleted (or already gone), redirect to the list")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<DeleteOutcome<BookInstanceDeletePage>> {
    state.services.book_instances.delete(id).await
}
