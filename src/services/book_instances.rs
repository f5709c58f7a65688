//! BookInstance (copy) workflows

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInstanceDraft, BookInstanceForm, BookView, CopyStatus},
    repository::Repository,
    validation::{self, FieldError},
    views::{
        join_books, BookInstanceDeletePage, BookInstanceDetailPage, BookInstanceFormPage,
        BookInstanceListPage,
    },
};

use super::{DeleteOutcome, FormOutcome};

const LIST_PATH: &str = "/catalog/bookinstances";

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
}

impl BookInstancesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<BookInstanceListPage> {
        let (copies, books) = tokio::try_join!(
            self.repository.list_book_instances(),
            self.repository.list_books(),
        )?;
        Ok(BookInstanceListPage {
            title: "Book Instance List".to_string(),
            bookinstance_list: join_books(&copies, &books),
        })
    }

    pub async fn detail(&self, id: i32) -> AppResult<BookInstanceDetailPage> {
        let copy = self
            .repository
            .find_book_instance(id)
            .await?
            .ok_or_else(|| AppError::not_found("BookInstance", id))?;
        let book = self.repository.find_book(copy.book_id).await?;

        Ok(BookInstanceDetailPage {
            title: "Book:".to_string(),
            bookinstance: (&copy).into(),
            book: book.as_ref().map(BookView::from),
        })
    }

    pub async fn create_form(&self) -> AppResult<BookInstanceFormPage> {
        let books = self.repository.list_books().await?;
        Ok(form_page("Create BookInstance", &books, None, Vec::new()))
    }

    pub async fn create(&self, form: &BookInstanceForm) -> AppResult<FormOutcome<BookInstanceFormPage>> {
        let books = self.repository.list_books().await?;
        let mut validated = validation::book_instance(form);
        check_book(&mut validated, &books);

        let new_copy = match validated.draft.to_new() {
            Some(new_copy) if validated.is_valid() => new_copy,
            _ => {
                return Ok(FormOutcome::Invalid(form_page(
                    "Create BookInstance",
                    &books,
                    Some(validated.draft),
                    validated.errors,
                )))
            }
        };

        let copy = self.repository.insert_book_instance(&new_copy).await?;
        tracing::info!("Created copy {} of book {} ({})", copy.id, copy.book_id, copy.status);
        Ok(FormOutcome::Saved(copy.url()))
    }

    pub async fn update_form(&self, id: i32) -> AppResult<BookInstanceFormPage> {
        let (copy, books) = tokio::try_join!(
            self.repository.find_book_instance(id),
            self.repository.list_books(),
        )?;
        let copy = copy.ok_or_else(|| AppError::not_found("BookInstance", id))?;
        Ok(form_page("Update BookInstance", &books, Some((&copy).into()), Vec::new()))
    }

    pub async fn update(
        &self,
        id: i32,
        form: &BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstanceFormPage>> {
        let books = self.repository.list_books().await?;
        let mut validated = validation::book_instance(form);
        check_book(&mut validated, &books);

        let new_copy = match validated.draft.to_new() {
            Some(new_copy) if validated.is_valid() => new_copy,
            _ => {
                return Ok(FormOutcome::Invalid(form_page(
                    "Update BookInstance",
                    &books,
                    Some(validated.draft),
                    validated.errors,
                )))
            }
        };

        let copy = self
            .repository
            .replace_book_instance(id, &new_copy)
            .await?
            .ok_or_else(|| AppError::not_found("BookInstance", id))?;
        tracing::info!("Updated copy {} ({})", copy.id, copy.status);
        Ok(FormOutcome::Saved(copy.url()))
    }

    pub async fn delete_form(&self, id: i32) -> AppResult<Option<BookInstanceDeletePage>> {
        let Some(copy) = self.repository.find_book_instance(id).await? else {
            return Ok(None);
        };
        let book = self.repository.find_book(copy.book_id).await?;
        Ok(Some(BookInstanceDeletePage {
            title: "Delete BookInstance".to_string(),
            bookinstance: (&copy).into(),
            book: book.as_ref().map(BookView::from),
        }))
    }

    /// Copies are never referenced, so deletion is unconditional
    pub async fn delete(&self, id: i32) -> AppResult<DeleteOutcome<BookInstanceDeletePage>> {
        if self.repository.delete_book_instance(id).await? {
            tracing::info!("Deleted copy {}", id);
        }
        Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()))
    }
}

fn check_book(validated: &mut validation::Validated<BookInstanceDraft>, books: &[Book]) {
    if let Some(book_id) = validated.draft.book_id {
        if !books.iter().any(|b| b.id == book_id) {
            validated.reject("book", "Book not found");
        }
    }
    validated.order_errors(validation::BOOK_INSTANCE_FIELDS);
}

fn form_page(
    title: &str,
    books: &[Book],
    copy: Option<BookInstanceDraft>,
    errors: Vec<FieldError>,
) -> BookInstanceFormPage {
    BookInstanceFormPage {
        title: title.to_string(),
        book_list: books.iter().map(BookView::from).collect(),
        selected_book: copy.as_ref().and_then(|c| c.book_id),
        statuses: CopyStatus::ALL.to_vec(),
        bookinstance: copy,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::{
        models::{AuthorDraft, NewBook},
        repository::{CatalogStore, MemoryCatalogStore},
    };

    async fn setup() -> (Arc<MemoryCatalogStore>, BookInstancesService, i32) {
        let store = Arc::new(MemoryCatalogStore::new());
        let author = store
            .insert_author(&AuthorDraft {
                first_name: "Mary".to_string(),
                family_name: "Shelley".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let book = store
            .insert_book(&NewBook {
                title: "Frankenstein".to_string(),
                author_id: author.id,
                summary: "A creature".to_string(),
                isbn: "9780141439471".to_string(),
                genre_ids: vec![],
            })
            .await
            .unwrap();
        (store.clone(), BookInstancesService::new(store), book.id)
    }

    fn form(book: &str, status: &str, due_back: &str) -> BookInstanceForm {
        BookInstanceForm {
            book: book.to_string(),
            imprint: "Lackington, 1818".to_string(),
            status: status.to_string(),
            due_back: due_back.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_maintenance() {
        let (store, service, book_id) = setup().await;
        let outcome = service.create(&form(&book_id.to_string(), "", "")).await.unwrap();

        let copies = store.list_book_instances().await.unwrap();
        assert_eq!(outcome, FormOutcome::Saved(copies[0].url()));
        assert_eq!(copies[0].status, CopyStatus::Maintenance);
        assert_eq!(copies[0].due_back, None);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_book_and_status() {
        let (store, service, book_id) = setup().await;
        let FormOutcome::Invalid(page) = service
            .create(&form(&(book_id + 50).to_string(), "Lost", "2026-13-40"))
            .await
            .unwrap()
        else {
            panic!("expected a rejected form");
        };

        let fields: Vec<&str> = page.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["book", "status", "due_back"]);
        assert_eq!(page.selected_book, Some(book_id + 50));
        assert_eq!(page.statuses.len(), 4);
        assert_eq!(store.count_book_instances(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_and_detail() {
        let (_, service, book_id) = setup().await;
        service.create(&form(&book_id.to_string(), "", "")).await.unwrap();
        let id = service.list().await.unwrap().bookinstance_list[0].bookinstance.id;

        service
            .update(id, &form(&book_id.to_string(), "Loaned", "2026-10-30"))
            .await
            .unwrap();
        let page = service.detail(id).await.unwrap();
        assert_eq!(page.bookinstance.status, CopyStatus::Loaned);
        assert_eq!(page.bookinstance.due_back, NaiveDate::from_ymd_opt(2026, 10, 30));
        assert_eq!(page.bookinstance.due_back_formatted, "Oct 30, 2026");
        assert_eq!(page.book.unwrap().title, "Frankenstein");
    }

    #[tokio::test]
    async fn test_delete_is_unconditional_and_idempotent() {
        let (store, service, book_id) = setup().await;
        service.create(&form(&book_id.to_string(), "Available", "")).await.unwrap();
        let id = store.list_book_instances().await.unwrap()[0].id;

        for _ in 0..2 {
            assert_eq!(
                service.delete(id).await.unwrap(),
                DeleteOutcome::Deleted("/catalog/bookinstances".to_string())
            );
        }
        assert!(service.delete_form(id).await.unwrap().is_none());
        assert!(matches!(service.detail(id).await, Err(AppError::NotFound(_))));
    }
}
