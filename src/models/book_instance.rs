//! BookInstance (physical copy) model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

use super::{catalog_path, format_date};

/// Copy availability status, stored as its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CopyStatus {
    Available,
    Maintenance,
    Loaned,
    Reserved,
}

impl CopyStatus {
    pub const ALL: [CopyStatus; 4] = [
        CopyStatus::Available,
        CopyStatus::Maintenance,
        CopyStatus::Loaned,
        CopyStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "Available",
            CopyStatus::Maintenance => "Maintenance",
            CopyStatus::Loaned => "Loaned",
            CopyStatus::Reserved => "Reserved",
        }
    }
}

impl Default for CopyStatus {
    fn default() -> Self {
        CopyStatus::Maintenance
    }
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown copy status '{0}'")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for CopyStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CopyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for CopyStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stored copy record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: i32,
    pub book_id: i32,
    pub imprint: String,
    #[sqlx(try_from = "String")]
    pub status: CopyStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn from_new(id: i32, copy: &NewBookInstance) -> Self {
        Self {
            id,
            book_id: copy.book_id,
            imprint: copy.imprint.clone(),
            status: copy.status,
            due_back: copy.due_back,
        }
    }

    pub fn url(&self) -> String {
        catalog_path("bookinstance", self.id)
    }

    pub fn due_back_formatted(&self) -> String {
        format_date(self.due_back)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceView {
    pub id: i32,
    pub book_id: i32,
    pub imprint: String,
    pub status: CopyStatus,
    pub due_back: Option<NaiveDate>,
    pub due_back_formatted: String,
    pub url: String,
}

impl From<&BookInstance> for BookInstanceView {
    fn from(copy: &BookInstance) -> Self {
        Self {
            id: copy.id,
            book_id: copy.book_id,
            imprint: copy.imprint.clone(),
            status: copy.status,
            due_back: copy.due_back,
            due_back_formatted: copy.due_back_formatted(),
            url: copy.url(),
        }
    }
}

/// Copy form as submitted
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookInstanceForm {
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub imprint: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_back: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookInstanceDraft {
    pub book_id: Option<i32>,
    pub imprint: String,
    pub status: CopyStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstanceDraft {
    pub fn to_new(&self) -> Option<NewBookInstance> {
        Some(NewBookInstance {
            book_id: self.book_id?,
            imprint: self.imprint.clone(),
            status: self.status,
            due_back: self.due_back,
        })
    }
}

impl From<&BookInstance> for BookInstanceDraft {
    fn from(copy: &BookInstance) -> Self {
        Self {
            book_id: Some(copy.book_id),
            imprint: copy.imprint.clone(),
            status: copy.status,
            due_back: copy.due_back,
        }
    }
}

/// Copy insert/replace payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookInstance {
    pub book_id: i32,
    pub imprint: String,
    pub status: CopyStatus,
    pub due_back: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!("Loaned".parse::<CopyStatus>().unwrap(), CopyStatus::Loaned);
        assert!("loaned".parse::<CopyStatus>().is_err());
        assert_eq!(CopyStatus::default(), CopyStatus::Maintenance);
        assert_eq!(CopyStatus::Reserved.to_string(), "Reserved");
    }

    #[test]
    fn test_view() {
        let copy = BookInstance {
            id: 5,
            book_id: 2,
            imprint: "Gollancz, 2011".to_string(),
            status: CopyStatus::Loaned,
            due_back: NaiveDate::from_ymd_opt(2026, 10, 16),
        };
        let view = BookInstanceView::from(&copy);
        assert_eq!(view.url, "/catalog/bookinstance/5");
        assert_eq!(view.due_back_formatted, "Oct 16, 2026");
    }
}
