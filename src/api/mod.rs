//! HTTP handlers for the catalog pages

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::{
    error::AppError,
    services::{DeleteOutcome, FormOutcome},
};

/// Record identity taken from the path; anything but an integer is a 400
pub struct CatalogId(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CatalogId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state).await?;
        Ok(CatalogId(id))
    }
}

/// Saved forms redirect to the record; rejected ones come back as 422
/// with the form view.
impl<P: Serialize> IntoResponse for FormOutcome<P> {
    fn into_response(self) -> Response {
        match self {
            FormOutcome::Saved(path) => Redirect::to(&path).into_response(),
            FormOutcome::Invalid(page) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response()
            }
        }
    }
}

/// Completed deletes redirect to the list; blocked ones answer 409 with the
/// dependents.
impl<P: Serialize> IntoResponse for DeleteOutcome<P> {
    fn into_response(self) -> Response {
        match self {
            DeleteOutcome::Deleted(path) => Redirect::to(&path).into_response(),
            DeleteOutcome::Blocked(page) => (StatusCode::CONFLICT, Json(page)).into_response(),
        }
    }
}

/// Delete confirmation view, or back to the list when the target is gone
pub(crate) fn confirmation<P: Serialize>(page: Option<P>, list_path: &str) -> Response {
    match page {
        Some(page) => Json(page).into_response(),
        None => Redirect::to(list_path).into_response(),
    }
}
