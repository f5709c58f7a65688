//! Catalog workflows: validation, duplicate resolution, guarded deletes and
//! view composition on top of the store

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;

use crate::repository::Repository;

/// Result of a create/update submission
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<P> {
    /// Persisted; carries the canonical path of the saved (or existing) record
    Saved(String),
    /// Rejected; carries the form view to show again
    Invalid(P),
}

/// Result of a delete submission
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome<P> {
    /// Gone (or was never there); carries the list path to go back to
    Deleted(String),
    /// Still referenced; carries the confirmation view listing the dependents
    Blocked(P),
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub books: books::BooksService,
    pub book_instances: book_instances::BookInstancesService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            genres: genres::GenresService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            book_instances: book_instances::BookInstancesService::new(repository.clone()),
            repository,
        }
    }

    /// Round trip to the store, for the readiness check
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
