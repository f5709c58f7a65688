//! In-process catalog store.
//!
//! Every table lives behind one `RwLock`, so each operation (including the
//! guarded deletes and the duplicate-aware genre insert) is atomic with
//! respect to every other.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CatalogStore, GenreRename, GuardedDelete};
use crate::{
    error::AppResult,
    models::{
        genre::fold_name, Author, AuthorDraft, Book, BookInstance, CopyStatus, Genre, GenreDraft,
        NewBook, NewBookInstance,
    },
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    authors: BTreeMap<i32, Author>,
    genres: BTreeMap<i32, Genre>,
    books: BTreeMap<i32, Book>,
    book_instances: BTreeMap<i32, BookInstance>,
}

impl Tables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn genre_named(&self, name: &str) -> Option<&Genre> {
        let folded = fold_name(name);
        self.genres.values().find(|g| fold_name(&g.name) == folded)
    }
}

#[derive(Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_title(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    books
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    async fn find_author(&self, id: i32) -> AppResult<Option<Author>> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let mut authors: Vec<Author> = self.tables.read().await.authors.values().cloned().collect();
        authors.sort_by(|a, b| {
            a.family_name
                .cmp(&b.family_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(authors)
    }

    async fn count_authors(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }

    async fn insert_author(&self, draft: &AuthorDraft) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let author = Author::from_draft(tables.allocate_id(), draft);
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn replace_author(&self, id: i32, draft: &AuthorDraft) -> AppResult<Option<Author>> {
        let mut tables = self.tables.write().await;
        Ok(tables.authors.get_mut(&id).map(|stored| {
            *stored = Author::from_draft(id, draft);
            stored.clone()
        }))
    }

    async fn delete_author_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Ok(GuardedDelete::Missing);
        }
        if tables.books.values().any(|b| b.author_id == id) {
            return Ok(GuardedDelete::Referenced);
        }
        tables.authors.remove(&id);
        Ok(GuardedDelete::Deleted)
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    async fn find_genre(&self, id: i32) -> AppResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = ids
            .iter()
            .filter_map(|id| tables.genres.get(id).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        genres.dedup_by_key(|g| g.id);
        Ok(genres)
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        Ok(self.tables.read().await.genre_named(name).cloned())
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let mut genres: Vec<Genre> = self.tables.read().await.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn count_genres(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.genres.len() as i64)
    }

    async fn insert_genre(&self, draft: &GenreDraft) -> AppResult<Option<Genre>> {
        let mut tables = self.tables.write().await;
        if tables.genre_named(&draft.name).is_some() {
            return Ok(None);
        }
        let genre = Genre {
            id: tables.allocate_id(),
            name: draft.name.clone(),
        };
        tables.genres.insert(genre.id, genre.clone());
        Ok(Some(genre))
    }

    async fn replace_genre(&self, id: i32, draft: &GenreDraft) -> AppResult<GenreRename> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Ok(GenreRename::Missing);
        }
        if tables.genre_named(&draft.name).is_some_and(|other| other.id != id) {
            return Ok(GenreRename::NameTaken);
        }
        let stored = match tables.genres.get_mut(&id) {
            Some(stored) => stored,
            None => return Ok(GenreRename::Missing),
        };
        stored.name = draft.name.clone();
        Ok(GenreRename::Renamed(stored.clone()))
    }

    async fn delete_genre_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Ok(GuardedDelete::Missing);
        }
        if tables.books.values().any(|b| b.genre_ids.contains(&id)) {
            return Ok(GuardedDelete::Referenced);
        }
        tables.genres.remove(&id);
        Ok(GuardedDelete::Deleted)
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books = self.tables.read().await.books.values().cloned().collect();
        Ok(sorted_by_title(books))
    }

    async fn books_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let books = tables
            .books
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect();
        Ok(sorted_by_title(books))
    }

    async fn books_by_genre(&self, genre_id: i32) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let books = tables
            .books
            .values()
            .filter(|b| b.genre_ids.contains(&genre_id))
            .cloned()
            .collect();
        Ok(sorted_by_title(books))
    }

    async fn count_books(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let book = Book::from_new(tables.allocate_id(), book);
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn replace_book(&self, id: i32, book: &NewBook) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.get_mut(&id).map(|stored| {
            *stored = Book::from_new(id, book);
            stored.clone()
        }))
    }

    async fn delete_book_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Ok(GuardedDelete::Missing);
        }
        if tables.book_instances.values().any(|c| c.book_id == id) {
            return Ok(GuardedDelete::Referenced);
        }
        tables.books.remove(&id);
        Ok(GuardedDelete::Deleted)
    }

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    async fn find_book_instance(&self, id: i32) -> AppResult<Option<BookInstance>> {
        Ok(self.tables.read().await.book_instances.get(&id).cloned())
    }

    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>> {
        Ok(self.tables.read().await.book_instances.values().cloned().collect())
    }

    async fn book_instances_by_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .book_instances
            .values()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn count_book_instances(&self, status: Option<CopyStatus>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .book_instances
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .count();
        Ok(count as i64)
    }

    async fn insert_book_instance(&self, copy: &NewBookInstance) -> AppResult<BookInstance> {
        let mut tables = self.tables.write().await;
        let copy = BookInstance::from_new(tables.allocate_id(), copy);
        tables.book_instances.insert(copy.id, copy.clone());
        Ok(copy)
    }

    async fn replace_book_instance(
        &self,
        id: i32,
        copy: &NewBookInstance,
    ) -> AppResult<Option<BookInstance>> {
        let mut tables = self.tables.write().await;
        Ok(tables.book_instances.get_mut(&id).map(|stored| {
            *stored = BookInstance::from_new(id, copy);
            stored.clone()
        }))
    }

    async fn delete_book_instance(&self, id: i32) -> AppResult<bool> {
        Ok(self.tables.write().await.book_instances.remove(&id).is_some())
    }
}
