//! Genre pages

use axum::{
    extract::State,
    response::Response,
    Json,
};
use axum_extra::extract::Form;

use crate::{
    error::{AppResult, ErrorResponse},
    models::GenreForm,
    services::{DeleteOutcome, FormOutcome},
    views::{GenreDeletePage, GenreDetailPage, GenreFormPage, GenreListPage},
    AppState,
};

use super::{confirmation, CatalogId};

/// List genres, by name
#[utoipa::path(
    get,
    path = "/catalog/genres",
    tag = "genres",
    responses(
        (status = 200, description = "Genre list", body = GenreListPage)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<GenreListPage>> {
    let page = state.services.genres.list().await?;
    Ok(Json(page))
}

/// Genre with the books filed under it
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = GenreDetailPage),
        (status = 404, description = "Genre not found", body = ErrorResponse)
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<GenreDetailPage>> {
    let page = state.services.genres.detail(id).await?;
    Ok(Json(page))
}

/// Empty genre form
#[utoipa::path(
    get,
    path = "/catalog/genre/create",
    tag = "genres",
    responses(
        (status = 200, description = "Genre form", body = GenreFormPage)
    )
)]
pub async fn create_genre_form(State(state): State<AppState>) -> Json<GenreFormPage> {
    Json(state.services.genres.create_form())
}

/// Create a genre, or redirect to the one already using the name
#[utoipa::path(
    post,
    path = "/catalog/genre/create",
    tag = "genres",
    request_body(content = GenreForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Genre created or already present, redirect to its page"),
        (status = 422, description = "Invalid form", body = GenreFormPage)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    Form(form): Form<GenreForm>,
) -> AppResult<FormOutcome<GenreFormPage>> {
    state.services.genres.create(&form).await
}

/// Genre form filled with the stored values
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre form", body = GenreFormPage),
        (status = 404, description = "Genre not found", body = ErrorResponse)
    )
)]
pub async fn update_genre_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Json<GenreFormPage>> {
    let page = state.services.genres.update_form(id).await?;
    Ok(Json(page))
}

/// Rename a genre
#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    request_body(content = GenreForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Genre updated, redirect to its page"),
        (status = 404, description = "Genre not found", body = ErrorResponse),
        (status = 422, description = "Invalid form", body = GenreFormPage)
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
    Form(form): Form<GenreForm>,
) -> AppResult<FormOutcome<GenreFormPage>> {
    state.services.genres.update(id, &form).await
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre and the books filed under it", body = GenreDeletePage),
        (status = 303, description = "Genre does not exist, redirect to the list")
    )
)]
pub async fn delete_genre_form(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<Response> {
    let page = state.services.genres.delete_form(id).await?;
    Ok(confirmation(page, "/catalog/genres"))
}

/// Delete a genre that no book is filed under
#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 303, description = "Genre deleted, redirect to the list"),
        (status = 409, description = "Books are still filed under the genre", body = GenreDeletePage)
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    CatalogId(id): CatalogId,
) -> AppResult<DeleteOutcome<GenreDeletePage>> {
    state.services.genres.delete(id).await
}
