//! Data models for the Local Library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use chrono::NaiveDate;

// Re-export commonly used types
pub use author::{Author, AuthorDraft, AuthorForm, AuthorView};
pub use book::{Book, BookDraft, BookForm, BookView, NewBook};
pub use book_instance::{
    BookInstance, BookInstanceDraft, BookInstanceForm, BookInstanceView, CopyStatus,
    NewBookInstance,
};
pub use genre::{Genre, GenreDraft, GenreForm, GenreView};

/// Canonical detail-page path of an entity
pub fn catalog_path(kind: &str, id: i32) -> String {
    format!("/catalog/{}/{}", kind, id)
}

/// Medium date format used on every page ("Oct 16, 2026"); empty when absent
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_path() {
        assert_eq!(catalog_path("genre", 7), "/catalog/genre/7");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(1920, 1, 2);
        assert_eq!(format_date(date), "Jan 2, 1920");
        assert_eq!(format_date(None), "");
    }
}
