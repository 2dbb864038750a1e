//! Library use-case service.
//!
//! # Responsibility
//! - Apply caller-side business rules on top of the raw reading-state store.
//! - Run status changes through the transition rules and notify rejections.
//! - Refresh local state from the authoritative backend.
//!
//! # Invariants
//! - Completing a book sets `current_page = total_pages` and `completed_date`.
//! - `completed_date` is cleared whenever a book leaves `Completed`.
//! - Store writes happen only after every check has passed.

use crate::model::book::{Book, BookId, BookValidationError, ReadingStatus};
use crate::model::highlight::{Highlight, HighlightId, HighlightValidationError};
use crate::ports::{BookBackend, NoticeLevel, Notifier, PortError};
use crate::service::status_transition::{can_change_status, StatusChangeRejection};
use crate::store::storage::SnapshotStorage;
use crate::store::{ReadingState, ReadingStore};
use chrono::{DateTime, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const FAVORITE_ADDED_MESSAGE: &str = "Added to favorites";
pub const FAVORITE_REMOVED_MESSAGE: &str = "Removed from favorites";

pub type LibraryResult<T> = Result<T, LibraryServiceError>;

#[derive(Debug)]
pub enum LibraryServiceError {
    BookNotFound(BookId),
    DuplicateBook(BookId),
    InvalidBook(BookValidationError),
    InvalidHighlight(HighlightValidationError),
    StatusChangeRejected(StatusChangeRejection),
    Backend(PortError),
}

impl Display for LibraryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::DuplicateBook(id) => write!(f, "book already tracked: {id}"),
            Self::InvalidBook(err) => write!(f, "{err}"),
            Self::InvalidHighlight(err) => write!(f, "{err}"),
            Self::StatusChangeRejected(rejection) => write!(f, "{rejection}"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LibraryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBook(err) => Some(err),
            Self::InvalidHighlight(err) => Some(err),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookValidationError> for LibraryServiceError {
    fn from(value: BookValidationError) -> Self {
        Self::InvalidBook(value)
    }
}

impl From<HighlightValidationError> for LibraryServiceError {
    fn from(value: HighlightValidationError) -> Self {
        Self::InvalidHighlight(value)
    }
}

impl From<PortError> for LibraryServiceError {
    fn from(value: PortError) -> Self {
        Self::Backend(value)
    }
}

/// Use-case facade over one reading-state store.
pub struct LibraryService<S: SnapshotStorage, N: Notifier> {
    store: ReadingStore<S>,
    notifier: N,
}

impl<S: SnapshotStorage, N: Notifier> LibraryService<S, N> {
    pub fn new(store: ReadingStore<S>, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn state(&mut self) -> Arc<ReadingState> {
        self.store.state()
    }

    pub fn store_mut(&mut self) -> &mut ReadingStore<S> {
        &mut self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Validates and appends a book, refusing duplicate ids.
    pub fn add_book(&mut self, book: Book) -> LibraryResult<Arc<ReadingState>> {
        book.validate()?;
        if self.store.state().book(book.id).is_some() {
            return Err(LibraryServiceError::DuplicateBook(book.id));
        }
        Ok(self.store.add_book(book))
    }

    /// Validates a highlight against its owning book before appending it.
    pub fn add_highlight(&mut self, highlight: Highlight) -> LibraryResult<Arc<ReadingState>> {
        let state = self.store.state();
        let book = state
            .book(highlight.book_id)
            .ok_or(LibraryServiceError::BookNotFound(highlight.book_id))?;
        highlight.validate_for(book)?;
        Ok(self.store.add_highlight(highlight))
    }

    /// Flips the favorite flag and confirms the new state to the user.
    ///
    /// Unknown ids are a silent no-op.
    pub fn toggle_favorite_highlight(&mut self, id: HighlightId) -> Arc<ReadingState> {
        let state = self.store.toggle_favorite_highlight(id);
        match state.highlight(id).map(|highlight| highlight.is_favorite) {
            Some(true) => self.notifier.notify(NoticeLevel::Info, FAVORITE_ADDED_MESSAGE),
            Some(false) => self.notifier.notify(NoticeLevel::Info, FAVORITE_REMOVED_MESSAGE),
            None => {}
        }
        state
    }

    /// Records the page reached, starting a not-started book on first progress.
    pub fn record_progress(
        &mut self,
        book_id: BookId,
        current_page: u32,
        now: DateTime<Utc>,
    ) -> LibraryResult<Arc<ReadingState>> {
        let book = self.require_book(book_id)?;
        if current_page > book.total_pages {
            return Err(BookValidationError::CurrentPageOutOfRange {
                current_page,
                total_pages: book.total_pages,
            }
            .into());
        }

        let state = self.store.update_reading_progress(book_id, current_page);
        if book.status == ReadingStatus::NotStarted && current_page > 0 {
            return self.change_status(book_id, ReadingStatus::InProgress, now);
        }
        Ok(state)
    }

    /// Moves a book to `new_status` if the transition rules allow it.
    ///
    /// Rejections are reported to the notifier and returned as
    /// `StatusChangeRejected`; the store is left untouched.
    pub fn change_status(
        &mut self,
        book_id: BookId,
        new_status: ReadingStatus,
        now: DateTime<Utc>,
    ) -> LibraryResult<Arc<ReadingState>> {
        let state = self.store.state();
        let book = state
            .book(book_id)
            .ok_or(LibraryServiceError::BookNotFound(book_id))?;
        let is_only_book = book.status == ReadingStatus::InProgress
            && state.books_with_status(ReadingStatus::InProgress).count() == 1;

        let decision = can_change_status(book, new_status, is_only_book);
        if let Some(rejection) = decision.rejection() {
            self.notifier.notify(NoticeLevel::Warning, rejection.message());
            info!(
                "event=status_change module=library status=rejected book_id={} from={} to={} reason={:?}",
                book_id, book.status, new_status, rejection
            );
            return Err(LibraryServiceError::StatusChangeRejected(rejection));
        }

        let updated = with_status(book.clone(), new_status, now);
        info!(
            "event=status_change module=library status=ok book_id={} from={} to={}",
            book_id, book.status, new_status
        );
        Ok(self.store.update_book(updated))
    }

    pub fn remove_book(&mut self, book_id: BookId) -> Arc<ReadingState> {
        self.store.remove_book(book_id)
    }

    pub fn remove_highlight(&mut self, id: HighlightId) -> Arc<ReadingState> {
        self.store.remove_highlight(id)
    }

    /// Replaces local state with the backend's lists for `user_id`.
    pub fn refresh_from_backend(
        &mut self,
        backend: &dyn BookBackend,
        user_id: &str,
    ) -> LibraryResult<Arc<ReadingState>> {
        let books = backend.list_books(user_id)?;
        let highlights = backend.list_highlights(user_id)?;
        info!(
            "event=library_refresh module=library status=ok books={} highlights={}",
            books.len(),
            highlights.len()
        );
        Ok(self.store.replace_all(books, highlights))
    }

    fn require_book(&mut self, book_id: BookId) -> LibraryResult<Book> {
        self.store
            .state()
            .book(book_id)
            .cloned()
            .ok_or(LibraryServiceError::BookNotFound(book_id))
    }
}

/// Applies the side effects that accompany an allowed status change.
pub fn with_status(mut book: Book, new_status: ReadingStatus, now: DateTime<Utc>) -> Book {
    match new_status {
        ReadingStatus::NotStarted => {
            book.current_page = None;
            book.start_date = None;
            book.completed_date = None;
        }
        ReadingStatus::InProgress => {
            book.start_date.get_or_insert(now);
            book.completed_date = None;
        }
        ReadingStatus::Completed => {
            book.start_date.get_or_insert(now);
            book.current_page = Some(book.total_pages);
            book.completed_date = Some(now);
        }
    }
    book.status = new_status;
    book
}

#[cfg(test)]
mod tests {
    use super::with_status;
    use crate::model::book::{Book, ReadingStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn completing_fills_last_page_and_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let book = with_status(Book::new("Dune", "Frank Herbert", 412), ReadingStatus::Completed, now);
        assert_eq!(book.current_page, Some(412));
        assert_eq!(book.completed_date, Some(now));
        assert_eq!(book.start_date, Some(now));
        assert!(book.validate().is_ok());
    }

    #[test]
    fn reopening_clears_completed_date_but_keeps_start() {
        let started = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let finished = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let book = with_status(Book::new("Dune", "Frank Herbert", 412), ReadingStatus::InProgress, started);
        let book = with_status(book, ReadingStatus::Completed, finished);
        let book = with_status(book, ReadingStatus::InProgress, finished);
        assert_eq!(book.start_date, Some(started));
        assert_eq!(book.completed_date, None);
        assert!(book.validate().is_ok());
    }
}
