//! Reading-status transition rules.
//!
//! # Responsibility
//! - Centralize which status changes are legal for a book.
//!
//! # Invariants
//! - `can_change_status` is pure, total and deterministic.
//! - Rules are evaluated in a fixed order; the first match decides.

use crate::model::book::{Book, ReadingStatus};
use std::fmt::{Display, Formatter};

/// Why a status change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusChangeRejection {
    AlreadyInStatus,
    CompletedToNotStarted,
    NotStartedOnlyFromInProgress,
    OnlyBookInProgress,
}

impl StatusChangeRejection {
    /// User-facing message shown by the caller's notifier.
    pub fn message(self) -> &'static str {
        match self {
            Self::AlreadyInStatus => "Book is already in this status",
            Self::CompletedToNotStarted => "Cannot change a completed book back to not started",
            Self::NotStartedOnlyFromInProgress => {
                "Can only move a book back to not started while it is in progress"
            }
            Self::OnlyBookInProgress => {
                "Cannot change status of the only book in progress except to completed"
            }
        }
    }
}

impl Display for StatusChangeRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`can_change_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChangeDecision {
    rejection: Option<StatusChangeRejection>,
}

impl StatusChangeDecision {
    pub const ALLOWED: Self = Self { rejection: None };

    pub fn rejected(rejection: StatusChangeRejection) -> Self {
        Self {
            rejection: Some(rejection),
        }
    }

    pub fn allowed(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn rejection(&self) -> Option<StatusChangeRejection> {
        self.rejection
    }

    pub fn reason(&self) -> Option<&'static str> {
        self.rejection.map(StatusChangeRejection::message)
    }
}

/// Decides whether `book` may move to `new_status`.
///
/// `is_only_book` marks the book as the sole one in progress; that book may
/// only be completed.
pub fn can_change_status(
    book: &Book,
    new_status: ReadingStatus,
    is_only_book: bool,
) -> StatusChangeDecision {
    use ReadingStatus::{Completed, InProgress, NotStarted};

    let current = book.status;
    let rejection = if new_status == current {
        Some(StatusChangeRejection::AlreadyInStatus)
    } else if current == Completed && new_status == NotStarted {
        Some(StatusChangeRejection::CompletedToNotStarted)
    } else if new_status == NotStarted && current != InProgress {
        Some(StatusChangeRejection::NotStartedOnlyFromInProgress)
    } else if is_only_book && current == InProgress && !matches!(new_status, InProgress | Completed)
    {
        Some(StatusChangeRejection::OnlyBookInProgress)
    } else {
        None
    };

    rejection.map_or(StatusChangeDecision::ALLOWED, StatusChangeDecision::rejected)
}

#[cfg(test)]
mod tests {
    use super::{can_change_status, StatusChangeRejection};
    use crate::model::book::{Book, ReadingStatus};

    fn book_in(status: ReadingStatus) -> Book {
        let mut book = Book::new("Dune", "Frank Herbert", 412);
        book.status = status;
        book
    }

    #[test]
    fn completed_book_cannot_return_to_not_started() {
        let decision =
            can_change_status(&book_in(ReadingStatus::Completed), ReadingStatus::NotStarted, false);
        assert!(!decision.allowed());
        assert_eq!(
            decision.reason(),
            Some("Cannot change a completed book back to not started")
        );
    }

    #[test]
    fn only_in_progress_book_may_only_be_completed() {
        let book = book_in(ReadingStatus::InProgress);

        let abandon = can_change_status(&book, ReadingStatus::NotStarted, true);
        assert_eq!(
            abandon.reason(),
            Some("Cannot change status of the only book in progress except to completed")
        );

        let finish = can_change_status(&book, ReadingStatus::Completed, true);
        assert!(finish.allowed());
        assert_eq!(finish.reason(), None);
    }

    #[test]
    fn in_progress_book_may_go_back_when_not_alone() {
        let book = book_in(ReadingStatus::InProgress);
        assert!(can_change_status(&book, ReadingStatus::NotStarted, false).allowed());
    }

    #[test]
    fn same_status_is_rejected_first() {
        let decision =
            can_change_status(&book_in(ReadingStatus::Completed), ReadingStatus::Completed, true);
        assert_eq!(decision.rejection(), Some(StatusChangeRejection::AlreadyInStatus));
    }

    #[test]
    fn decision_table_is_deterministic_over_full_state_space() {
        for current in ReadingStatus::ALL {
            for target in ReadingStatus::ALL {
                for is_only_book in [false, true] {
                    let book = book_in(current);
                    let first = can_change_status(&book, target, is_only_book);
                    let second = can_change_status(&book, target, is_only_book);
                    assert_eq!(first, second);

                    let expected_allowed = matches!(
                        (current, target),
                        (ReadingStatus::NotStarted, ReadingStatus::InProgress)
                            | (ReadingStatus::NotStarted, ReadingStatus::Completed)
                            | (ReadingStatus::InProgress, ReadingStatus::Completed)
                            | (ReadingStatus::Completed, ReadingStatus::InProgress)
                    ) || (current == ReadingStatus::InProgress
                        && target == ReadingStatus::NotStarted
                        && !is_only_book);
                    assert_eq!(
                        first.allowed(),
                        expected_allowed,
                        "{current} -> {target} (only={is_only_book})"
                    );
                }
            }
        }
    }
}
