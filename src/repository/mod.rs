//! Repository layer: the catalog store interface and its backends

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        Author, AuthorDraft, Book, BookInstance, CopyStatus, Genre, GenreDraft, NewBook,
        NewBookInstance,
    },
};

pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Shared handle on the configured store
pub type Repository = Arc<dyn CatalogStore>;

/// Result of a delete that is refused while dependents exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedDelete {
    Deleted,
    /// Nothing to delete
    Missing,
    /// At least one record still references the target
    Referenced,
}

/// Result of renaming a genre, refused when another genre already holds the
/// name (case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreRename {
    Renamed(Genre),
    Missing,
    NameTaken,
}

/// Persistence operations used by the catalog services.
///
/// List operations return records in their display order:
/// authors by family name then first name, genres by name, books by title,
/// copies by identity (ties broken by identity).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Cheap round trip used by the readiness check
    async fn ping(&self) -> AppResult<()>;

    // =========================================================================
    // AUTHORS
    // =========================================================================

    async fn find_author(&self, id: i32) -> AppResult<Option<Author>>;
    async fn list_authors(&self) -> AppResult<Vec<Author>>;
    async fn count_authors(&self) -> AppResult<i64>;
    async fn insert_author(&self, draft: &AuthorDraft) -> AppResult<Author>;
    /// Replace the stored fields, keeping the identity. `None` if absent.
    async fn replace_author(&self, id: i32, draft: &AuthorDraft) -> AppResult<Option<Author>>;
    /// Delete unless a book still references the author
    async fn delete_author_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete>;

    // =========================================================================
    // GENRES
    // =========================================================================

    async fn find_genre(&self, id: i32) -> AppResult<Option<Genre>>;
    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>>;
    /// Case-insensitive lookup by name
    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>>;
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    async fn count_genres(&self) -> AppResult<i64>;
    /// Insert unless a genre with the same name (case-insensitively) exists,
    /// in which case `None` is returned and nothing is written.
    async fn insert_genre(&self, draft: &GenreDraft) -> AppResult<Option<Genre>>;
    /// Rename in place unless the name belongs to a different genre
    async fn replace_genre(&self, id: i32, draft: &GenreDraft) -> AppResult<GenreRename>;
    /// Delete unless a book is still filed under the genre
    async fn delete_genre_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete>;

    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>>;
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn books_by_author(&self, author_id: i32) -> AppResult<Vec<Book>>;
    async fn books_by_genre(&self, genre_id: i32) -> AppResult<Vec<Book>>;
    async fn count_books(&self) -> AppResult<i64>;
    /// Insert the book and its genre links atomically
    async fn insert_book(&self, book: &NewBook) -> AppResult<Book>;
    /// Replace the book and its whole genre set atomically
    async fn replace_book(&self, id: i32, book: &NewBook) -> AppResult<Option<Book>>;
    /// Delete unless a copy of the book still exists
    async fn delete_book_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete>;

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    async fn find_book_instance(&self, id: i32) -> AppResult<Option<BookInstance>>;
    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>>;
    async fn book_instances_by_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    /// Count copies, all of them or only those with `status`
    async fn count_book_instances(&self, status: Option<CopyStatus>) -> AppResult<i64>;
    async fn insert_book_instance(&self, copy: &NewBookInstance) -> AppResult<BookInstance>;
    async fn replace_book_instance(
        &self,
        id: i32,
        copy: &NewBookInstance,
    ) -> AppResult<Option<BookInstance>>;
    /// Returns false when there was nothing to delete
    async fn delete_book_instance(&self, id: i32) -> AppResult<bool>;
}
