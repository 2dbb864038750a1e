//! Highlight domain model.
//!
//! # Responsibility
//! - Define a user-captured excerpt owned by exactly one book.
//!
//! # Invariants
//! - `book_id` references an existing book (checked by callers, not the store).
//! - `page` lies within `1..=total_pages` of the owning book.

use crate::model::book::{Book, BookId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a highlight.
pub type HighlightId = Uuid;

/// Violations reported by [`Highlight::validate_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightValidationError {
    BlankText,
    BookMismatch { expected: BookId, actual: BookId },
    PageOutOfRange { page: u32, total_pages: u32 },
}

impl Display for HighlightValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankText => write!(f, "highlight text must not be blank"),
            Self::BookMismatch { expected, actual } => {
                write!(f, "highlight belongs to book {actual}, not {expected}")
            }
            Self::PageOutOfRange { page, total_pages } => {
                write!(f, "highlight page {page} is outside 1..={total_pages}")
            }
        }
    }
}

impl Error for HighlightValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub book_id: BookId,
    pub text: String,
    pub page: u32,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Creates a non-favorite highlight with a generated id.
    pub fn new(book_id: BookId, text: impl Into<String>, page: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            text: text.into(),
            page,
            is_favorite: false,
            created_at,
        }
    }

    /// Checks ownership and page range against the owning book.
    pub fn validate_for(&self, book: &Book) -> Result<(), HighlightValidationError> {
        if self.text.trim().is_empty() {
            return Err(HighlightValidationError::BlankText);
        }
        if self.book_id != book.id {
            return Err(HighlightValidationError::BookMismatch {
                expected: book.id,
                actual: self.book_id,
            });
        }
        if self.page == 0 || self.page > book.total_pages {
            return Err(HighlightValidationError::PageOutOfRange {
                page: self.page,
                total_pages: book.total_pages,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Highlight, HighlightValidationError};
    use crate::model::book::Book;
    use chrono::Utc;

    #[test]
    fn validate_for_rejects_page_zero_and_past_end() {
        let book = Book::new("Dune", "Frank Herbert", 10);
        let zero = Highlight::new(book.id, "fear is the mind-killer", 0, Utc::now());
        let past = Highlight::new(book.id, "fear is the mind-killer", 11, Utc::now());
        assert!(matches!(
            zero.validate_for(&book),
            Err(HighlightValidationError::PageOutOfRange { page: 0, .. })
        ));
        assert!(matches!(
            past.validate_for(&book),
            Err(HighlightValidationError::PageOutOfRange { page: 11, .. })
        ));
    }

    #[test]
    fn validate_for_rejects_foreign_book() {
        let book = Book::new("Dune", "Frank Herbert", 10);
        let other = Book::new("Emma", "Jane Austen", 10);
        let highlight = Highlight::new(other.id, "text", 1, Utc::now());
        assert!(matches!(
            highlight.validate_for(&book),
            Err(HighlightValidationError::BookMismatch { .. })
        ));
    }
}
