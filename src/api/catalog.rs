//! Catalog home page

use axum::{extract::State, Json};

use crate::{error::AppResult, views::IndexPage, AppState};

/// Catalog summary: record counts per kind
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = IndexPage),
        (status = 500, description = "Storage failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn index(State(state): State<AppState>) -> AppResult<Json<IndexPage>> {
    let page = state.services.catalog.summary().await?;
    Ok(Json(page))
}
