//! Book domain model.
//!
//! # Responsibility
//! - Define the tracked reading item and its lifecycle status.
//! - Offer invariant checks that callers can run before mutating the store.
//!
//! # Invariants
//! - `current_page <= total_pages` whenever `current_page` is set.
//! - `completed_date` is set only when `status == ReadingStatus::Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a tracked book.
pub type BookId = Uuid;

/// Reading lifecycle of one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    /// On the shelf, not opened yet.
    NotStarted,
    /// Currently being read.
    InProgress,
    /// Finished.
    Completed,
}

impl ReadingStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [ReadingStatus; 3] = [Self::NotStarted, Self::InProgress, Self::Completed];

    /// Stable wire label (`NOT_STARTED|IN_PROGRESS|COMPLETED`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses a wire label, accepting lowercase input from UI callers.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NOT_STARTED" => Some(Self::NotStarted),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl Display for ReadingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invariant violations reported by [`Book::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    NilId,
    BlankTitle,
    CurrentPageOutOfRange { current_page: u32, total_pages: u32 },
    CompletedDateWithoutCompletion { status: ReadingStatus },
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "book id must not be nil"),
            Self::BlankTitle => write!(f, "book title must not be blank"),
            Self::CurrentPageOutOfRange {
                current_page,
                total_pages,
            } => write!(
                f,
                "current_page ({current_page}) must be <= total_pages ({total_pages})"
            ),
            Self::CompletedDateWithoutCompletion { status } => write!(
                f,
                "completed_date is only allowed for COMPLETED books, status is {status}"
            ),
        }
    }
}

impl Error for BookValidationError {}

/// A tracked reading item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    pub status: ReadingStatus,
}

impl Book {
    /// Creates a not-started book with a generated id.
    pub fn new(title: impl Into<String>, author: impl Into<String>, total_pages: u32) -> Self {
        Self::with_id(Uuid::new_v4(), title, author, total_pages)
    }

    /// Creates a not-started book with a caller-provided id.
    ///
    /// Used when identity already exists in the backend. No validation is
    /// performed here; see [`Book::validate`].
    pub fn with_id(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        total_pages: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            cover_url: None,
            total_pages,
            current_page: None,
            start_date: None,
            completed_date: None,
            status: ReadingStatus::NotStarted,
        }
    }

    /// Checks the book invariants.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        if self.id.is_nil() {
            return Err(BookValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(BookValidationError::BlankTitle);
        }
        if let Some(current_page) = self.current_page {
            if current_page > self.total_pages {
                return Err(BookValidationError::CurrentPageOutOfRange {
                    current_page,
                    total_pages: self.total_pages,
                });
            }
        }
        if self.completed_date.is_some() && self.status != ReadingStatus::Completed {
            return Err(BookValidationError::CompletedDateWithoutCompletion {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Pages read so far, treating an unset page as zero.
    pub fn pages_read(&self) -> u32 {
        self.current_page.unwrap_or(0)
    }

    /// Reading progress in `[0.0, 1.0]`; books with zero pages report `0.0`.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (f64::from(self.pages_read()) / f64::from(self.total_pages)).min(1.0)
    }
}
