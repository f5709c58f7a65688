//! Page payloads handed to the rendering layer

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::{
        Author, AuthorDraft, AuthorView, Book, BookDraft, BookInstance, BookInstanceDraft,
        BookInstanceView, BookView, CopyStatus, Genre, GenreDraft, GenreView,
    },
    validation::FieldError,
};

/// Catalog summary shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IndexPage {
    pub title: String,
    pub book_count: i64,
    pub book_instance_count: i64,
    pub book_instance_available_count: i64,
    pub author_count: i64,
    pub genre_count: i64,
}

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorListPage {
    pub title: String,
    pub author_list: Vec<AuthorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorDetailPage {
    pub title: String,
    pub author: AuthorView,
    pub author_books: Vec<BookView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorFormPage {
    pub title: String,
    pub author: Option<AuthorDraft>,
    pub errors: Vec<FieldError>,
}

/// Delete confirmation; `author_books` non-empty means the delete is refused
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorDeletePage {
    pub title: String,
    pub author: AuthorView,
    pub author_books: Vec<BookView>,
}

impl AuthorDeletePage {
    pub fn new(author: &Author, books: &[Book]) -> Self {
        Self {
            title: "Delete Author".to_string(),
            author: author.into(),
            author_books: books.iter().map(BookView::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreListPage {
    pub title: String,
    pub genre_list: Vec<GenreView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreDetailPage {
    pub title: String,
    pub genre: GenreView,
    pub genre_books: Vec<BookView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreFormPage {
    pub title: String,
    pub genre: Option<GenreDraft>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreDeletePage {
    pub title: String,
    pub genre: GenreView,
    pub genre_books: Vec<BookView>,
}

impl GenreDeletePage {
    pub fn new(genre: &Genre, books: &[Book]) -> Self {
        Self {
            title: "Delete Genre".to_string(),
            genre: genre.into(),
            genre_books: books.iter().map(BookView::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// A book with its author resolved. The author is absent only for a
/// dangling reference left by data written outside this server.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookWithAuthor {
    pub book: BookView,
    pub author: Option<AuthorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookListPage {
    pub title: String,
    pub book_list: Vec<BookWithAuthor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookDetailPage {
    pub title: String,
    pub book: BookView,
    pub author: Option<AuthorView>,
    pub genres: Vec<GenreView>,
    pub book_instances: Vec<BookInstanceView>,
}

/// Book create/update form. `genres` is the full genre list as stored;
/// `selected_genres` holds the identities to show as ticked.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookFormPage {
    pub title: String,
    pub authors: Vec<AuthorView>,
    pub genres: Vec<GenreView>,
    pub selected_genres: Vec<i32>,
    pub book: Option<BookDraft>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookDeletePage {
    pub title: String,
    pub book: BookView,
    pub book_instances: Vec<BookInstanceView>,
}

impl BookDeletePage {
    pub fn new(book: &Book, copies: &[BookInstance]) -> Self {
        Self {
            title: "Delete Book".to_string(),
            book: book.into(),
            book_instances: copies.iter().map(BookInstanceView::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// BookInstance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceWithBook {
    pub bookinstance: BookInstanceView,
    pub book: Option<BookView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceListPage {
    pub title: String,
    pub bookinstance_list: Vec<BookInstanceWithBook>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceDetailPage {
    pub title: String,
    pub bookinstance: BookInstanceView,
    pub book: Option<BookView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceFormPage {
    pub title: String,
    pub book_list: Vec<BookView>,
    pub selected_book: Option<i32>,
    pub statuses: Vec<CopyStatus>,
    pub bookinstance: Option<BookInstanceDraft>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceDeletePage {
    pub title: String,
    pub bookinstance: BookInstanceView,
    pub book: Option<BookView>,
}

// ---------------------------------------------------------------------------
// Composition helpers
// ---------------------------------------------------------------------------

/// Attach each book's author, keeping the order of `books`
pub fn join_authors(books: &[Book], authors: &[Author]) -> Vec<BookWithAuthor> {
    let by_id: HashMap<i32, &Author> = authors.iter().map(|a| (a.id, a)).collect();
    books
        .iter()
        .map(|book| BookWithAuthor {
            book: book.into(),
            author: by_id.get(&book.author_id).map(|a| AuthorView::from(*a)),
        })
        .collect()
}

/// Attach each copy's book, keeping the order of `copies`
pub fn join_books(copies: &[BookInstance], books: &[Book]) -> Vec<BookInstanceWithBook> {
    let by_id: HashMap<i32, &Book> = books.iter().map(|b| (b.id, b)).collect();
    copies
        .iter()
        .map(|copy| BookInstanceWithBook {
            bookinstance: copy.into(),
            book: by_id.get(&copy.book_id).map(|b| BookView::from(*b)),
        })
        .collect()
}

/// Identities among `genres` that are part of `wanted`, in ascending order
pub fn selected_genres(genres: &[Genre], wanted: &[i32]) -> Vec<i32> {
    let wanted: BTreeSet<i32> = wanted.iter().copied().collect();
    genres
        .iter()
        .map(|g| g.id)
        .filter(|id| wanted.contains(id))
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i32, title: &str, author_id: i32) -> Book {
        Book {
            id,
            title: title.to_string(),
            author_id,
            summary: String::new(),
            isbn: String::new(),
            genre_ids: vec![],
        }
    }

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_join_authors_keeps_book_order() {
        let authors = vec![Author {
            id: 1,
            first_name: "Frank".to_string(),
            family_name: "Herbert".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }];
        let books = vec![book(5, "Children of Dune", 1), book(4, "Dune", 2)];
        let joined = join_authors(&books, &authors);
        assert_eq!(joined[0].book.id, 5);
        assert_eq!(joined[0].author.as_ref().unwrap().name, "Herbert, Frank");
        assert!(joined[1].author.is_none());
    }

    #[test]
    fn test_selected_genres_leaves_list_untouched() {
        let genres = vec![genre(3, "Fantasy"), genre(1, "Poetry"), genre(2, "Science Fiction")];
        assert_eq!(selected_genres(&genres, &[2, 3, 9]), vec![2, 3]);
        assert!(selected_genres(&genres, &[]).is_empty());
        assert_eq!(genres.len(), 3);
    }
}
