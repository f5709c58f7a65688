//! Form sanitization and validation.
//!
//! Every pipeline follows the same steps: trim the submitted strings, run the
//! length rules (declared with `validator` on the trimmed values), escape the
//! markup-significant characters, then parse dates, identities and statuses.
//! A draft is always returned, together with the ordered list of field errors,
//! so a rejected form can be shown again with the user's values.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    AuthorDraft, AuthorForm, BookDraft, BookForm, BookInstanceDraft, BookInstanceForm,
    CopyStatus, GenreDraft, GenreForm,
};

/// Maximum length of author names and genre names
pub const MAX_NAME_LEN: usize = 100;

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Sanitized draft plus the errors found while building it
#[derive(Debug, Clone)]
pub struct Validated<D> {
    pub draft: D,
    pub errors: Vec<FieldError>,
}

impl<D> Validated<D> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn reject(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Reorder the errors by the position of their field in `fields`,
    /// keeping the order of errors on the same field
    pub fn order_errors(&mut self, fields: &[&str]) {
        let position = |field: &str| fields.iter().position(|f| *f == field).unwrap_or(fields.len());
        self.errors.sort_by_key(|e| position(&e.field));
    }
}

/// Book form fields in display order
pub const BOOK_FIELDS: &[&str] = &["title", "author", "summary", "isbn", "genre"];

/// BookInstance form fields in display order
pub const BOOK_INSTANCE_FIELDS: &[&str] = &["book", "imprint", "status", "due_back"];

/// Replace markup-significant characters with HTML entities
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim then escape
pub fn sanitize(value: &str) -> String {
    escape(value.trim())
}

/// Optional ISO-8601 date. Empty input is "not provided". Timestamps keep
/// their calendar date; reduced precision (`1920`, `1920-03`) means the
/// first day of the period.
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.date_naive()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(dt.date()));
        }
    }
    let is_year = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
    match value.split_once('-') {
        Some((year, month))
            if is_year(year) && month.len() == 2 && month.bytes().all(|b| b.is_ascii_digit()) =>
        {
            NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ())
        }
        None if is_year(value) => NaiveDate::parse_from_str(&format!("{}-01-01", value), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ()),
        _ => Err(()),
    }
}

/// Sanitized identity of a referenced record
pub fn parse_reference(value: &str) -> Option<i32> {
    sanitize(value).parse::<i32>().ok().filter(|id| *id > 0)
}

fn too_long(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_NAME_LEN {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::Borrowed(message));
        return Err(error);
    }
    Ok(())
}

fn first_name_length(value: &str) -> Result<(), ValidationError> {
    too_long(value, "First name must not exceed 100 characters.")
}

fn family_name_length(value: &str) -> Result<(), ValidationError> {
    too_long(value, "Family name must not exceed 100 characters.")
}

fn genre_name_length(value: &str) -> Result<(), ValidationError> {
    too_long(value, "Genre name must not exceed 100 characters")
}

/// Flatten `validator` errors into `FieldError`s, in the order of `fields`
fn collect_errors(result: Result<(), ValidationErrors>, fields: &[&str]) -> Vec<FieldError> {
    let Err(errors) = result else {
        return Vec::new();
    };
    let by_field = errors.field_errors();
    let mut out = Vec::new();
    for field in fields {
        if let Some(field_errors) = by_field.get(*field) {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| Cow::Owned(format!("Invalid {}", field)));
                out.push(FieldError::new(field, &message));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct AuthorFields {
    #[validate(
        length(min = 1, message = "First name must be specified."),
        custom(function = "first_name_length")
    )]
    first_name: String,
    #[validate(
        length(min = 1, message = "Family name must be specified."),
        custom(function = "family_name_length")
    )]
    family_name: String,
}

pub fn author(form: &AuthorForm) -> Validated<AuthorDraft> {
    let fields = AuthorFields {
        first_name: form.first_name.trim().to_string(),
        family_name: form.family_name.trim().to_string(),
    };
    let errors = collect_errors(fields.validate(), &["first_name", "family_name"]);

    let mut validated = Validated {
        draft: AuthorDraft {
            first_name: escape(&fields.first_name),
            family_name: escape(&fields.family_name),
            date_of_birth: None,
            date_of_death: None,
        },
        errors,
    };

    match parse_optional_date(&form.date_of_birth) {
        Ok(date) => validated.draft.date_of_birth = date,
        Err(()) => validated.reject("date_of_birth", "Invalid date of birth"),
    }
    match parse_optional_date(&form.date_of_death) {
        Ok(date) => validated.draft.date_of_death = date,
        Err(()) => validated.reject("date_of_death", "Invalid date of death"),
    }
    validated
}

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct GenreFields {
    #[validate(
        length(min = 3, message = "Genre name must contain at least 3 characters"),
        custom(function = "genre_name_length")
    )]
    name: String,
}

pub fn genre(form: &GenreForm) -> Validated<GenreDraft> {
    // Stored compatibility-normalized, so case-insensitive matching agrees
    // between the stores
    let fields = GenreFields {
        name: form.name.trim().nfkc().collect(),
    };
    let errors = collect_errors(fields.validate(), &["name"]);
    Validated {
        draft: GenreDraft {
            name: escape(&fields.name),
        },
        errors,
    }
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct BookFields {
    #[validate(length(min = 1, message = "Title must not be empty."))]
    title: String,
    #[validate(length(min = 1, message = "Author must not be empty."))]
    author: String,
    #[validate(length(min = 1, message = "Summary must not be empty."))]
    summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    isbn: String,
}

pub fn book(form: &BookForm) -> Validated<BookDraft> {
    let fields = BookFields {
        title: form.title.trim().to_string(),
        author: form.author.trim().to_string(),
        summary: form.summary.trim().to_string(),
        isbn: form.isbn.trim().to_string(),
    };
    let errors = collect_errors(fields.validate(), &["title", "author", "summary", "isbn"]);
    let author_given = !fields.author.is_empty();

    let mut validated = Validated {
        draft: BookDraft {
            title: escape(&fields.title),
            author_id: parse_reference(&fields.author),
            summary: escape(&fields.summary),
            isbn: escape(&fields.isbn),
            genre_ids: Vec::new(),
        },
        errors,
    };
    if author_given && validated.draft.author_id.is_none() {
        validated.reject("author", "Author not found");
    }

    let mut invalid_genre = false;
    for raw in &form.genre {
        match parse_reference(raw) {
            Some(id) if !validated.draft.genre_ids.contains(&id) => {
                validated.draft.genre_ids.push(id)
            }
            Some(_) => {}
            None => invalid_genre = true,
        }
    }
    if invalid_genre {
        validated.reject("genre", "Invalid genre");
    }
    validated.order_errors(BOOK_FIELDS);
    validated
}

// ---------------------------------------------------------------------------
// BookInstance
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct BookInstanceFields {
    #[validate(length(min = 1, message = "Book must be specified"))]
    book: String,
    #[validate(length(min = 1, message = "Imprint must be specified"))]
    imprint: String,
}

pub fn book_instance(form: &BookInstanceForm) -> Validated<BookInstanceDraft> {
    let fields = BookInstanceFields {
        book: form.book.trim().to_string(),
        imprint: form.imprint.trim().to_string(),
    };
    let errors = collect_errors(fields.validate(), &["book", "imprint"]);
    let book_given = !fields.book.is_empty();

    let mut validated = Validated {
        draft: BookInstanceDraft {
            book_id: parse_reference(&fields.book),
            imprint: escape(&fields.imprint),
            status: CopyStatus::default(),
            due_back: None,
        },
        errors,
    };
    if book_given && validated.draft.book_id.is_none() {
        validated.reject("book", "Book not found");
    }

    let status = sanitize(&form.status);
    if !status.is_empty() {
        match status.parse::<CopyStatus>() {
            Ok(status) => validated.draft.status = status,
            Err(_) => validated.reject("status", "Invalid status"),
        }
    }

    match parse_optional_date(&form.due_back) {
        Ok(date) => validated.draft.due_back = date,
        Err(()) => validated.reject("due_back", "Invalid date"),
    }
    validated.order_errors(BOOK_INSTANCE_FIELDS);
    validated
}
