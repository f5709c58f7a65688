//! Book workflows

use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorView, BookDraft, BookForm, BookInstanceView, Genre, GenreView},
    repository::{GuardedDelete, Repository},
    validation::{self, FieldError, Validated},
    views::{
        join_authors, selected_genres, BookDeletePage, BookDetailPage, BookFormPage, BookListPage,
    },
};

use super::{DeleteOutcome, FormOutcome};

const LIST_PATH: &str = "/catalog/books";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every book with its author, by title
    pub async fn list(&self) -> AppResult<BookListPage> {
        let (books, authors) =
            tokio::try_join!(self.repository.list_books(), self.repository.list_authors())?;
        Ok(BookListPage {
            title: "Book List".to_string(),
            book_list: join_authors(&books, &authors),
        })
    }

    /// Book with its copies, then its author and genres
    pub async fn detail(&self, id: i32) -> AppResult<BookDetailPage> {
        let (book, copies) = tokio::try_join!(
            self.repository.find_book(id),
            self.repository.book_instances_by_book(id),
        )?;
        let book = book.ok_or_else(|| AppError::not_found("Book", id))?;

        let (author, genres) = tokio::try_join!(
            self.repository.find_author(book.author_id),
            self.repository.find_genres(&book.genre_ids),
        )?;
        if author.is_none() {
            tracing::warn!("Book {} references missing author {}", book.id, book.author_id);
        }

        Ok(BookDetailPage {
            title: book.title.clone(),
            author: author.as_ref().map(AuthorView::from),
            genres: genres.iter().map(GenreView::from).collect(),
            book_instances: copies.iter().map(BookInstanceView::from).collect(),
            book: (&book).into(),
        })
    }

    pub async fn create_form(&self) -> AppResult<BookFormPage> {
        let (authors, genres) = self.form_choices().await?;
        Ok(form_page("Create Book", &authors, &genres, None, Vec::new()))
    }

    pub async fn create(&self, form: &BookForm) -> AppResult<FormOutcome<BookFormPage>> {
        let (authors, genres) = self.form_choices().await?;
        let validated = check_references(validation::book(form), &authors, &genres);

        let new_book = match validated.draft.to_new() {
            Some(new_book) if validated.is_valid() => new_book,
            _ => {
                return Ok(FormOutcome::Invalid(form_page(
                    "Create Book",
                    &authors,
                    &genres,
                    Some(validated.draft),
                    validated.errors,
                )))
            }
        };

        let book = self.repository.insert_book(&new_book).await?;
        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(FormOutcome::Saved(book.url()))
    }

    pub async fn update_form(&self, id: i32) -> AppResult<BookFormPage> {
        let (book, (authors, genres)) =
            tokio::try_join!(self.repository.find_book(id), self.form_choices())?;
        let book = book.ok_or_else(|| AppError::not_found("Book", id))?;
        Ok(form_page("Update Book", &authors, &genres, Some((&book).into()), Vec::new()))
    }

    /// Replace the book, including its whole genre set. Submitting no genre
    /// clears the book's genres.
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<FormOutcome<BookFormPage>> {
        let (authors, genres) = self.form_choices().await?;
        let validated = check_references(validation::book(form), &authors, &genres);

        let new_book = match validated.draft.to_new() {
            Some(new_book) if validated.is_valid() => new_book,
            _ => {
                return Ok(FormOutcome::Invalid(form_page(
                    "Update Book",
                    &authors,
                    &genres,
                    Some(validated.draft),
                    validated.errors,
                )))
            }
        };

        let book = self
            .repository
            .replace_book(id, &new_book)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))?;
        tracing::info!("Updated book {} ({} genre(s))", book.id, book.genre_ids.len());
        Ok(FormOutcome::Saved(book.url()))
    }

    pub async fn delete_form(&self, id: i32) -> AppResult<Option<BookDeletePage>> {
        let (book, copies) = tokio::try_join!(
            self.repository.find_book(id),
            self.repository.book_instances_by_book(id),
        )?;
        Ok(book.map(|book| BookDeletePage::new(&book, &copies)))
    }

    /// Delete the book unless a copy of it still exists
    pub async fn delete(&self, id: i32) -> AppResult<DeleteOutcome<BookDeletePage>> {
        let (book, copies) = tokio::try_join!(
            self.repository.find_book(id),
            self.repository.book_instances_by_book(id),
        )?;
        let Some(book) = book else {
            return Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()));
        };
        if !copies.is_empty() {
            tracing::warn!("Refusing to delete book {}: {} copies remain", id, copies.len());
            return Ok(DeleteOutcome::Blocked(BookDeletePage::new(&book, &copies)));
        }

        match self.repository.delete_book_if_unreferenced(id).await? {
            GuardedDelete::Deleted => tracing::info!("Deleted book {}", id),
            GuardedDelete::Missing => {}
            GuardedDelete::Referenced => {
                tracing::warn!("Book {} gained a copy before it could be deleted", id);
                let copies = self.repository.book_instances_by_book(id).await?;
                return Ok(DeleteOutcome::Blocked(BookDeletePage::new(&book, &copies)));
            }
        }
        Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()))
    }

    /// Authors and genres offered by the form
    async fn form_choices(&self) -> AppResult<(Vec<Author>, Vec<Genre>)> {
        tokio::try_join!(self.repository.list_authors(), self.repository.list_genres())
    }
}

/// Reject references to records that do not exist
fn check_references(
    mut validated: Validated<BookDraft>,
    authors: &[Author],
    genres: &[Genre],
) -> Validated<BookDraft> {
    if let Some(author_id) = validated.draft.author_id {
        if !authors.iter().any(|a| a.id == author_id) {
            validated.reject("author", "Author not found");
        }
    }
    let known: HashSet<i32> = genres.iter().map(|g| g.id).collect();
    if validated.draft.genre_ids.iter().any(|id| !known.contains(id)) {
        validated.reject("genre", "Genre not found");
    }
    validated.order_errors(validation::BOOK_FIELDS);
    validated
}

fn form_page(
    title: &str,
    authors: &[Author],
    genres: &[Genre],
    book: Option<BookDraft>,
    errors: Vec<FieldError>,
) -> BookFormPage {
    let wanted = book.as_ref().map(|b| b.genre_ids.as_slice()).unwrap_or(&[]);
    BookFormPage {
        title: title.to_string(),
        authors: authors.iter().map(AuthorView::from).collect(),
        genres: genres.iter().map(GenreView::from).collect(),
        selected_genres: selected_genres(genres, wanted),
        book,
        errors,
    }
}
