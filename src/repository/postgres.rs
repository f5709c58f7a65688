//! PostgreSQL catalog store

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use unicode_normalization::UnicodeNormalization;

use super::{CatalogStore, GenreRename, GuardedDelete};
use crate::{
    error::AppResult,
    models::{
        Author, AuthorDraft, Book, BookInstance, CopyStatus, Genre, GenreDraft, NewBook,
        NewBookInstance,
    },
};

/// Books with their genre identities aggregated from `book_genres`
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, b.summary, b.isbn,
           COALESCE(
               array_agg(bg.genre_id ORDER BY bg.genre_id) FILTER (WHERE bg.genre_id IS NOT NULL),
               '{}'
           ) AS genre_ids
    FROM books b
    LEFT JOIN book_genres bg ON bg.book_id = b.id
"#;

/// Postgres error code raised when a delete would orphan a referencing row
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Postgres error code raised by `genres_name_ci_idx` on a duplicate name
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: Pool<Postgres>,
}

impl PgCatalogStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Run a conditional delete statement (bound to `id`) and classify its outcome.
    /// A foreign-key violation means a dependent appeared after the condition
    /// was evaluated.
    async fn guarded_delete(&self, statement: &str, table: &str, id: i32) -> AppResult<GuardedDelete> {
        let result = sqlx::query(statement).bind(id).execute(&self.pool).await;
        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(GuardedDelete::Deleted),
            Ok(_) => {
                let exists: bool = sqlx::query_scalar(&format!(
                    "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
                    table
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
                Ok(if exists {
                    GuardedDelete::Referenced
                } else {
                    GuardedDelete::Missing
                })
            }
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                Ok(GuardedDelete::Referenced)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn books_where(&self, condition: &str, id: i32) -> AppResult<Vec<Book>> {
        let query = format!(
            "{} WHERE {} GROUP BY b.id ORDER BY b.title, b.id",
            BOOK_SELECT, condition
        );
        let rows = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    async fn find_author(&self, id: i32) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY family_name, first_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_authors(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_author(&self, draft: &AuthorDraft) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, family_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&draft.first_name)
        .bind(&draft.family_name)
        .bind(draft.date_of_birth)
        .bind(draft.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn replace_author(&self, id: i32, draft: &AuthorDraft) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $1, family_name = $2, date_of_birth = $3, date_of_death = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&draft.first_name)
        .bind(&draft.family_name)
        .bind(draft.date_of_birth)
        .bind(draft.date_of_death)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_author_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        self.guarded_delete(
            r#"
            DELETE FROM authors
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM books WHERE author_id = $1)
            "#,
            "authors",
            id,
        )
        .await
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    async fn find_genre(&self, id: i32) -> AppResult<Option<Genre>> {
        let row = sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>(
            "SELECT * FROM genres WHERE id = ANY($1) ORDER BY name, id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_genre_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let row = sqlx::query_as::<_, Genre>(
            "SELECT * FROM genres WHERE lower(name) = lower($1) LIMIT 1",
        )
        .bind(name.trim().nfkc().collect::<String>())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_genres(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_genre(&self, draft: &GenreDraft) -> AppResult<Option<Genre>> {
        // genres_name_ci_idx turns a case-insensitive duplicate into a no-op
        let row = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES ($1) ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(&draft.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn replace_genre(&self, id: i32, draft: &GenreDraft) -> AppResult<GenreRename> {
        let result = sqlx::query_as::<_, Genre>("UPDATE genres SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&draft.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        match result {
            Ok(Some(genre)) => Ok(GenreRename::Renamed(genre)),
            Ok(None) => Ok(GenreRename::Missing),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Ok(GenreRename::NameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_genre_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        self.guarded_delete(
            r#"
            DELETE FROM genres
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM book_genres WHERE genre_id = $1)
            "#,
            "genres",
            id,
        )
        .await
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn find_book(&self, id: i32) -> AppResult<Option<Book>> {
        let query = format!("{} WHERE b.id = $1 GROUP BY b.id", BOOK_SELECT);
        let row = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let query = format!("{} GROUP BY b.id ORDER BY b.title, b.id", BOOK_SELECT);
        let rows = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn books_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        self.books_where("b.author_id = $1", author_id).await
    }

    async fn books_by_genre(&self, genre_id: i32) -> AppResult<Vec<Book>> {
        self.books_where(
            "b.id IN (SELECT book_id FROM book_genres WHERE genre_id = $1)",
            genre_id,
        )
        .await
    }

    async fn count_books(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author_id, summary, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(id)
            .bind(&book.genre_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Book::from_new(id, book))
    }

    async fn replace_book(&self, id: i32, book: &NewBook) -> AppResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books SET title = $1, author_id = $2, summary = $3, isbn = $4
            WHERE id = $5
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(id)
            .bind(&book.genre_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Book::from_new(id, book)))
    }

    async fn delete_book_if_unreferenced(&self, id: i32) -> AppResult<GuardedDelete> {
        self.guarded_delete(
            r#"
            DELETE FROM books
            WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM book_instances WHERE book_id = $1)
            "#,
            "books",
            id,
        )
        .await
    }

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    async fn find_book_instance(&self, id: i32) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_book_instances(&self) -> AppResult<Vec<BookInstance>> {
        let rows = sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn book_instances_by_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let rows = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book_id = $1 ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_book_instances(&self, status: Option<CopyStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_book_instance(&self, copy: &NewBookInstance) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (book_id, imprint, status, due_back)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(copy.book_id)
        .bind(&copy.imprint)
        .bind(copy.status.as_str())
        .bind(copy.due_back)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn replace_book_instance(
        &self,
        id: i32,
        copy: &NewBookInstance,
    ) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, status = $3, due_back = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(copy.book_id)
        .bind(&copy.imprint)
        .bind(copy.status.as_str())
        .bind(copy.due_back)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_book_instance(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
