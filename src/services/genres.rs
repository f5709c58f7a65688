//! Genre workflows, including case-insensitive duplicate resolution

use crate::{
    error::{AppError, AppResult},
    models::{BookView, GenreDraft, GenreForm, GenreView},
    repository::{GenreRename, GuardedDelete, Repository},
    validation::{self, FieldError},
    views::{GenreDeletePage, GenreDetailPage, GenreFormPage, GenreListPage},
};

use super::{DeleteOutcome, FormOutcome};

const LIST_PATH: &str = "/catalog/genres";

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<GenreListPage> {
        let genres = self.repository.list_genres().await?;
        Ok(GenreListPage {
            title: "Genre List".to_string(),
            genre_list: genres.iter().map(GenreView::from).collect(),
        })
    }

    pub async fn detail(&self, id: i32) -> AppResult<GenreDetailPage> {
        let (genre, books) = tokio::try_join!(
            self.repository.find_genre(id),
            self.repository.books_by_genre(id),
        )?;
        let genre = genre.ok_or_else(|| AppError::not_found("Genre", id))?;

        Ok(GenreDetailPage {
            title: "Genre Detail".to_string(),
            genre: (&genre).into(),
            genre_books: books.iter().map(BookView::from).collect(),
        })
    }

    pub fn create_form(&self) -> GenreFormPage {
        form_page("Create Genre", None, Vec::new())
    }

    /// Create a genre, or point at the existing one when the name is
    /// already taken (compared case-insensitively).
    pub async fn create(&self, form: &GenreForm) -> AppResult<FormOutcome<GenreFormPage>> {
        let validated = validation::genre(form);
        if !validated.is_valid() {
            return Ok(FormOutcome::Invalid(form_page(
                "Create Genre",
                Some(validated.draft),
                validated.errors,
            )));
        }
        let draft = validated.draft;

        if let Some(existing) = self.repository.find_genre_by_name(&draft.name).await? {
            tracing::debug!("Genre '{}' already exists as {}", draft.name, existing.id);
            return Ok(FormOutcome::Saved(existing.url()));
        }

        if let Some(genre) = self.repository.insert_genre(&draft).await? {
            tracing::info!("Created genre {} ({})", genre.id, genre.name);
            return Ok(FormOutcome::Saved(genre.url()));
        }

        // Another request created the same name in between
        tracing::warn!("Lost the race creating genre '{}'", draft.name);
        let winner = self
            .repository
            .find_genre_by_name(&draft.name)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Genre '{}' conflicted but cannot be found", draft.name))
            })?;
        Ok(FormOutcome::Saved(winner.url()))
    }

    pub async fn update_form(&self, id: i32) -> AppResult<GenreFormPage> {
        let genre = self
            .repository
            .find_genre(id)
            .await?
            .ok_or_else(|| AppError::not_found("Genre", id))?;
        Ok(form_page("Update Genre", Some((&genre).into()), Vec::new()))
    }

    /// Rename a genre. Renaming onto another genre's name is refused; the
    /// store decides atomically, so concurrent renames cannot both win.
    pub async fn update(&self, id: i32, form: &GenreForm) -> AppResult<FormOutcome<GenreFormPage>> {
        let mut validated = validation::genre(form);
        if !validated.is_valid() {
            return Ok(FormOutcome::Invalid(form_page(
                "Update Genre",
                Some(validated.draft),
                validated.errors,
            )));
        }

        match self.repository.replace_genre(id, &validated.draft).await? {
            GenreRename::Renamed(genre) => {
                tracing::info!("Updated genre {} ({})", genre.id, genre.name);
                Ok(FormOutcome::Saved(genre.url()))
            }
            GenreRename::Missing => Err(AppError::not_found("Genre", id)),
            GenreRename::NameTaken => {
                tracing::warn!("Refusing to rename genre {} to '{}': name taken", id, validated.draft.name);
                validated.reject("name", "Genre with this name already exists");
                Ok(FormOutcome::Invalid(form_page(
                    "Update Genre",
                    Some(validated.draft),
                    validated.errors,
                )))
            }
        }
    }

    pub async fn delete_form(&self, id: i32) -> AppResult<Option<GenreDeletePage>> {
        let (genre, books) = tokio::try_join!(
            self.repository.find_genre(id),
            self.repository.books_by_genre(id),
        )?;
        Ok(genre.map(|genre| GenreDeletePage::new(&genre, &books)))
    }

    /// Delete the genre unless a book is still filed under it
    pub async fn delete(&self, id: i32) -> AppResult<DeleteOutcome<GenreDeletePage>> {
        let (genre, books) = tokio::try_join!(
            self.repository.find_genre(id),
            self.repository.books_by_genre(id),
        )?;
        let Some(genre) = genre else {
            return Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()));
        };
        if !books.is_empty() {
            tracing::warn!("Refusing to delete genre {}: {} book(s) filed under it", id, books.len());
            return Ok(DeleteOutcome::Blocked(GenreDeletePage::new(&genre, &books)));
        }

        match self.repository.delete_genre_if_unreferenced(id).await? {
            GuardedDelete::Deleted => tracing::info!("Deleted genre {}", id),
            GuardedDelete::Missing => {}
            GuardedDelete::Referenced => {
                tracing::warn!("Genre {} gained a book before it could be deleted", id);
                let books = self.repository.books_by_genre(id).await?;
                return Ok(DeleteOutcome::Blocked(GenreDeletePage::new(&genre, &books)));
            }
        }
        Ok(DeleteOutcome::Deleted(LIST_PATH.to_string()))
    }
}

fn form_page(title: &str, genre: Option<GenreDraft>, errors: Vec<FieldError>) -> GenreFormPage {
    GenreFormPage {
        title: title.to_string(),
        genre,
        errors,
    }
}
