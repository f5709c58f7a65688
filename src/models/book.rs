//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::catalog_path;

/// Stored book record. `genre_ids` is aggregated from the book/genre link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
}

impl Book {
    pub fn from_new(id: i32, book: &NewBook) -> Self {
        Self {
            id,
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre_ids: book.genre_ids.clone(),
        }
    }

    pub fn url(&self) -> String {
        catalog_path("book", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookView {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
    pub url: String,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre_ids: book.genre_ids.clone(),
            url: book.url(),
        }
    }
}

/// Book form as submitted. `genre` may be repeated, sent once, or omitted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<String>,
}

/// Sanitized book values. `author_id` is absent when the submitted author
/// was empty or not an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookDraft {
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
}

impl BookDraft {
    /// Persistable book, once every reference is known
    pub fn to_new(&self) -> Option<NewBook> {
        Some(NewBook {
            title: self.title.clone(),
            author_id: self.author_id?,
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre_ids: self.genre_ids.clone(),
        })
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author_id: Some(book.author_id),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre_ids: book.genre_ids.clone(),
        }
    }
}

/// Book insert/replace payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_without_author_is_not_persistable() {
        let draft = BookDraft {
            title: "Dune".to_string(),
            ..Default::default()
        };
        assert!(draft.to_new().is_none());

        let draft = BookDraft {
            author_id: Some(4),
            genre_ids: vec![1, 2],
            ..draft
        };
        let new = draft.to_new().unwrap();
        assert_eq!(new.author_id, 4);
        assert_eq!(new.genre_ids, vec![1, 2]);
    }

    #[test]
    fn test_url() {
        let book = Book::from_new(
            9,
            &NewBook {
                title: "Dune".to_string(),
                author_id: 1,
                summary: "Spice".to_string(),
                isbn: "9780441013593".to_string(),
                genre_ids: vec![],
            },
        );
        assert_eq!(book.url(), "/catalog/book/9");
    }
}
