//! Catalog summary for the home page

use crate::{error::AppResult, models::CopyStatus, repository::Repository, views::IndexPage};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record counts per kind, fetched concurrently
    pub async fn summary(&self) -> AppResult<IndexPage> {
        let repo = &self.repository;
        let (book_count, book_instance_count, book_instance_available_count, author_count, genre_count) =
            tokio::try_join!(
                repo.count_books(),
                repo.count_book_instances(None),
                repo.count_book_instances(Some(CopyStatus::Available)),
                repo.count_authors(),
                repo.count_genres(),
            )?;

        tracing::debug!(
            "Catalog summary: {} books, {} copies ({} available), {} authors, {} genres",
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count
        );

        Ok(IndexPage {
            title: "Local Library Home".to_string(),
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        models::{AuthorDraft, GenreDraft, NewBook, NewBookInstance},
        repository::{CatalogStore, MemoryCatalogStore, MockCatalogStore},
    };

    #[tokio::test]
    async fn test_summary_counts() {
        let store = Arc::new(MemoryCatalogStore::new());
        let author = store
            .insert_author(&AuthorDraft {
                first_name: "Ursula".to_string(),
                family_name: "Le Guin".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .insert_genre(&GenreDraft {
                name: "Fantasy".to_string(),
            })
            .await
            .unwrap();
        let book = store
            .insert_book(&NewBook {
                title: "A Wizard of Earthsea".to_string(),
                author_id: author.id,
                summary: "Ged".to_string(),
                isbn: "9780547773742".to_string(),
                genre_ids: vec![],
            })
            .await
            .unwrap();
        for status in [CopyStatus::Available, CopyStatus::Loaned, CopyStatus::Available] {
            store
                .insert_book_instance(&NewBookInstance {
                    book_id: book.id,
                    imprint: "Parnassus, 1968".to_string(),
                    status,
                    due_back: None,
                })
                .await
                .unwrap();
        }

        let page = CatalogService::new(store).summary().await.unwrap();
        assert_eq!(page.title, "Local Library Home");
        assert_eq!(page.book_count, 1);
        assert_eq!(page.book_instance_count, 3);
        assert_eq!(page.book_instance_available_count, 2);
        assert_eq!(page.author_count, 1);
        assert_eq!(page.genre_count, 1);
    }

    #[tokio::test]
    async fn test_summary_fails_when_one_count_fails() {
        let mut store = MockCatalogStore::new();
        store.expect_count_books().returning(|| Ok(4));
        store.expect_count_book_instances().returning(|_| Ok(2));
        store
            .expect_count_authors()
            .returning(|| Err(AppError::Storage("connection reset".to_string())));
        store.expect_count_genres().returning(|| Ok(1));

        let result = CatalogService::new(Arc::new(store)).summary().await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
