//! Author workflows

use crate::{
    error::{AppError, AppResult},
    models::{AuthorDraft, AuthorForm, AuthorView, BookView},
    repository::{GuardedDelete, Repository},
    validation,
    views::{AuthorDeletePage, AuthorDetailPage, AuthorFormPage, AuthorListPage},
};

use super::{DeleteOutcome, FormOutcome};

const LIST_PATH: &str = "/catalog/authors";

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<AuthorListPage> {
        let authors = self.repository.list_authors().await?;
        Ok(AuthorListPage {
            title: "Author List".to_string(),
            author_list: authors.iter().map(AuthorView::from).collect(),
        })
    }

    /// Author with the books written by them
    pub async fn detail(&self, id: i32) -> AppResult<AuthorDetailPage> {
        let (author, books) = tokio::try_join!(
            self.repository.find_author(id),
            self.repository.books_by_author(id),
        )?;
        let author = author.ok_or_else(|| AppError::not_found("Author", id))?;

        Ok(AuthorDetailPage {
            title: "Author Detail".to_string(),
            author: (&author).into(),
            author_books: books.iter().map(BookView::from).collect(),
        })
    }

    pub fn create_form(&self) -> AuthorFormPage {
        form_page("Create Author", None, Vec::new())
    }

    pub async fn create(&self, form: &AuthorForm) -> AppResult<FormOutcome<AuthorFormPage>> {
        let validated = validation::author(form);
        if !validated.is_valid() {
            return Ok(FormOutcome::Invalid(form_page(
                "Create Author",
                Some(validated.draft),
                validated.errors,
            )));
        }

        let author = self.repository.insert_author(&validated.draft).await?;
        tracing::info!("Created author {} ({})", author.id, author.name());
        Ok(FormOutcome::Saved(author.url()))
    }

    pub async fn update_form(&self, id: i32) -> AppResult<AuthorFormPage> {
        let author = self
            .repository
            .find_author(id)
            .await?
            .ok_or_else(|| AppError::not_found("Author", id))?;
        Ok(form_page("Update Author", Some((&author).into()), Vec::new()))
    }

    /// Replace the author's fields, keeping its identity
    pub async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<FormOutcome<AuthorFormPage>> {
        let validated = validation::author(form);
        if !validated.is_valid() {
            return Ok(FormOutcome::Invalid(form_page(
                "Update Author",
                Some(validated.draft),
                validated.errors,
            )));
        }

        let author = self
            .repository
            .replace_author(id, &validated.draft)
            .await?
            .ok_or_else(|| AppError::not_found("Author", id))?;
        tracing::info!("Updated author {}", author.id);
        Ok(FormOutcome::Saved(author.url()))
    }

    /// Confirmation view; `None` when there is nothing left to delete
    pub async fn delete_form(&self, id: i32) -> AppResult<Option<AuthorDeletePage>> {
        let (author, books) = tokio::try_join!(
            self.repository.find_author(id),
            self.repository.books_by_author(id),
        )?;
        Ok(author.map(|author| AuthorDeletePage::new(&author, &books)))
    }

    /// Delete the author unless a book still references them
    pub async fn delete(&self, id: i32) -> AppResult<DeleteOutcome<AuthorDeletePage>> {
        let (author, books) = tokio::try_join!(
            self.repository.find_author(id),
            self.repository.books_by_author(id),
        )?;
        let Some(author) = author else {
            return Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()));
        };
        if !books.is_empty() {
            tracing::warn!("Refusing to delete author {}: {} book(s) reference it", id, books.len());
            return Ok(DeleteOutcome::Blocked(AuthorDeletePage::new(&author, &books)));
        }

        match self.repository.delete_author_if_unreferenced(id).await? {
            GuardedDelete::Deleted => tracing::info!("Deleted author {}", id),
            GuardedDelete::Missing => {}
            GuardedDelete::Referenced => {
                tracing::warn!("Author {} gained a book before it could be deleted", id);
                let books = self.repository.books_by_author(id).await?;
                return Ok(DeleteOutcome::Blocked(AuthorDeletePage::new(&author, &books)));
            }
        }
        Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()))
    }
}

fn form_page(title: &str, author: Option<AuthorDraft>, errors: Vec<validation::FieldError>) -> AuthorFormPage {
    AuthorFormPage {
        title: title.to_string(),
        author,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        models::NewBook,
        repository::{CatalogStore, MemoryCatalogStore, MockCatalogStore},
    };

    fn form(first: &str, family: &str) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            family_name: family.to_string(),
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MemoryCatalogStore>, AuthorsService) {
        let store = Arc::new(MemoryCatalogStore::new());
        (store.clone(), AuthorsService::new(store))
    }

    #[tokio::test]
    async fn test_create_persists_sanitized_author() {
        let (store, service) = setup();
        let mut submitted = form("  Jane ", "Austen");
        submitted.date_of_birth = "1775-12-16".to_string();

        let outcome = service.create(&submitted).await.unwrap();
        let authors = store.list_authors().await.unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(outcome, FormOutcome::Saved(authors[0].url()));
        assert_eq!(authors[0].first_name, "Jane");
        assert_eq!(authors[0].lifespan(), "1775 - ");
    }

    #[tokio::test]
    async fn test_create_rejects_without_persisting() {
        let (store, service) = setup();
        let outcome = service.create(&form("", "Austen")).await.unwrap();

        let FormOutcome::Invalid(page) = outcome else {
            panic!("expected a rejected form");
        };
        assert_eq!(page.errors.len(), 1);
        assert_eq!(page.errors[0].field, "first_name");
        assert_eq!(page.author.unwrap().family_name, "Austen");
        assert_eq!(store.count_authors().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let (store, service) = setup();
        service.create(&form("Jane", "Austin")).await.unwrap();
        let id = store.list_authors().await.unwrap()[0].id;

        let outcome = service.update(id, &form("Jane", "Austen")).await.unwrap();
        assert_eq!(outcome, FormOutcome::Saved(format!("/catalog/author/{}", id)));
        let author = store.find_author(id).await.unwrap().unwrap();
        assert_eq!(author.family_name, "Austen");
        assert_eq!(store.count_authors().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let (_, service) = setup();
        let result = service.update(42, &form("Jane", "Austen")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(service.update_form(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_blocked_while_books_reference_author() {
        let (store, service) = setup();
        service.create(&form("Jane", "Austen")).await.unwrap();
        let id = store.list_authors().await.unwrap()[0].id;
        let book = store
            .insert_book(&NewBook {
                title: "Emma".to_string(),
                author_id: id,
                summary: "Matchmaking".to_string(),
                isbn: "9780141439587".to_string(),
                genre_ids: vec![],
            })
            .await
            .unwrap();

        let DeleteOutcome::Blocked(page) = service.delete(id).await.unwrap() else {
            panic!("expected the delete to be blocked");
        };
        assert_eq!(page.author_books.len(), 1);
        assert_eq!(page.author_books[0].title, "Emma");
        assert!(store.find_author(id).await.unwrap().is_some());

        store.delete_book_if_unreferenced(book.id).await.unwrap();
        assert_eq!(
            service.delete(id).await.unwrap(),
            DeleteOutcome::Deleted("/catalog/authors".to_string())
        );
        assert!(store.find_author(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_author_is_satisfied() {
        let (_, service) = setup();
        assert!(service.delete_form(9).await.unwrap().is_none());
        assert_eq!(
            service.delete(9).await.unwrap(),
            DeleteOutcome::Deleted("/catalog/authors".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_rechecks_when_a_book_appears() {
        let author = crate::models::Author {
            id: 1,
            first_name: "Jane".to_string(),
            family_name: "Austen".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        let late_book = crate::models::Book {
            id: 8,
            title: "Persuasion".to_string(),
            author_id: 1,
            summary: "Second chances".to_string(),
            isbn: "9780141439686".to_string(),
            genre_ids: vec![],
        };

        let mut store = MockCatalogStore::new();
        let found = author.clone();
        store.expect_find_author().returning(move |_| Ok(Some(found.clone())));
        let mut seq = mockall::Sequence::new();
        store
            .expect_books_by_author()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        store
            .expect_books_by_author()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(vec![late_book.clone()]));
        store
            .expect_delete_author_if_unreferenced()
            .returning(|_| Ok(GuardedDelete::Referenced));

        let service = AuthorsService::new(Arc::new(store));
        let DeleteOutcome::Blocked(page) = service.delete(1).await.unwrap() else {
            panic!("expected the delete to be blocked");
        };
        assert_eq!(page.author_books[0].title, "Persuasion");
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_detail() {
        let mut store = MockCatalogStore::new();
        store.expect_find_author().returning(|_| Ok(None));
        store
            .expect_books_by_author()
            .returning(|_| Err(AppError::Storage("disk full".to_string())));

        let service = AuthorsService::new(Arc::new(store));
        assert!(matches!(service.detail(1).await, Err(AppError::Storage(_))));
    }
}
