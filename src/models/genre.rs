//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

use super::catalog_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        catalog_path("genre", self.id)
    }
}

/// Case-folded form of a genre name, used for duplicate detection.
/// Compatibility-normalized first so that e.g. full-width letters match.
pub fn fold_name(name: &str) -> String {
    name.trim().nfkc().collect::<String>().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreView {
    pub id: i32,
    pub name: String,
    pub url: String,
}

impl From<&Genre> for GenreView {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
            url: genre.url(),
        }
    }
}

/// Genre form as submitted
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GenreForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GenreDraft {
    pub name: String,
}

impl From<&Genre> for GenreDraft {
    fn from(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
        }
    }
}
