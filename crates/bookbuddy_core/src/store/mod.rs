//! Reading-state store: books and highlights held for the client session.
//!
//! # Responsibility
//! - Own the current `ReadingState` snapshot and its storage backend.
//! - Apply synchronous, total mutations and persist after each change.
//! - Hydrate lazily from the persisted snapshot on first use.
//!
//! # Invariants
//! - Insertion order of books and highlights is preserved.
//! - Mutations never fail; unmatched ids are silent no-ops.
//! - A published `Arc<ReadingState>` is never mutated afterwards.
//! - The store does not clamp pages, check referential integrity or change
//!   status on its own; see `service::library_service` for those rules.

pub mod snapshot;
pub mod storage;

use crate::model::book::{Book, BookId, ReadingStatus};
use crate::model::highlight::{Highlight, HighlightId};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use snapshot::{decode_snapshot, encode_snapshot, DEFAULT_SNAPSHOT_KEY, SNAPSHOT_VERSION};
use std::sync::Arc;
use storage::SnapshotStorage;

/// Immutable contents of the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingState {
    pub books: Vec<Book>,
    pub highlights: Vec<Highlight>,
}

impl ReadingState {
    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn highlight(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|highlight| highlight.id == id)
    }

    pub fn books_with_status(&self, status: ReadingStatus) -> impl Iterator<Item = &Book> {
        self.books.iter().filter(move |book| book.status == status)
    }

    pub fn highlights_for_book(&self, book_id: BookId) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .iter()
            .filter(move |highlight| highlight.book_id == book_id)
    }

    pub fn favorite_highlights(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.iter().filter(|highlight| highlight.is_favorite)
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.highlights.is_empty()
    }
}

/// Result of the one-time hydration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Nothing was persisted under the key; store stays empty.
    Missing,
    /// A valid snapshot replaced the in-memory state.
    Restored { books: usize, highlights: usize },
    /// The persisted payload was unusable; store fell back to empty.
    Reset { reason: String },
    /// Hydration already ran for this store.
    AlreadyHydrated,
}

/// Owned, injectable container for the reading state.
pub struct ReadingStore<S: SnapshotStorage> {
    storage: S,
    key: String,
    state: Arc<ReadingState>,
    hydrated: bool,
}

impl<S: SnapshotStorage> ReadingStore<S> {
    /// Creates an empty, not-yet-hydrated store under the default key.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_SNAPSHOT_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            state: Arc::new(ReadingState::default()),
            hydrated: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Releases the storage backend, e.g. to reopen a store over it.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Loads the persisted snapshot once.
    ///
    /// Invalid or unreadable payloads reset the store to empty and are only
    /// reported through the returned outcome and a `warn` log event.
    pub fn hydrate(&mut self) -> HydrationOutcome {
        if self.hydrated {
            return HydrationOutcome::AlreadyHydrated;
        }
        self.hydrated = true;

        let raw = match self.storage.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(
                    "event=store_hydrate module=store status=missing key={}",
                    self.key
                );
                return HydrationOutcome::Missing;
            }
            Err(err) => return self.reset_after_hydration_failure(err.to_string()),
        };

        match decode_snapshot(&raw) {
            Ok(state) => {
                let books = state.books.len();
                let highlights = state.highlights.len();
                self.state = Arc::new(state);
                info!(
                    "event=store_hydrate module=store status=ok key={} books={} highlights={}",
                    self.key, books, highlights
                );
                HydrationOutcome::Restored { books, highlights }
            }
            Err(err) => self.reset_after_hydration_failure(err.to_string()),
        }
    }

    /// Current snapshot, hydrating first if needed.
    pub fn state(&mut self) -> Arc<ReadingState> {
        self.hydrate();
        Arc::clone(&self.state)
    }

    /// Appends a book. Callers supply a unique id.
    pub fn add_book(&mut self, book: Book) -> Arc<ReadingState> {
        debug!("event=store_add_book module=store book_id={}", book.id);
        self.apply(|state| state.books.push(book))
    }

    /// Appends a highlight without checking that its book exists.
    pub fn add_highlight(&mut self, highlight: Highlight) -> Arc<ReadingState> {
        debug!(
            "event=store_add_highlight module=store highlight_id={} book_id={}",
            highlight.id, highlight.book_id
        );
        self.apply(|state| state.highlights.push(highlight))
    }

    /// Flips `is_favorite` on the matching highlight.
    pub fn toggle_favorite_highlight(&mut self, id: HighlightId) -> Arc<ReadingState> {
        self.apply(|state| {
            if let Some(highlight) = state.highlights.iter_mut().find(|h| h.id == id) {
                highlight.is_favorite = !highlight.is_favorite;
            }
        })
    }

    /// Sets `current_page` on the matching book; no clamping, no status change.
    pub fn update_reading_progress(&mut self, book_id: BookId, current_page: u32) -> Arc<ReadingState> {
        self.apply(|state| {
            if let Some(book) = state.books.iter_mut().find(|b| b.id == book_id) {
                book.current_page = Some(current_page);
            }
        })
    }

    /// Replaces the book with the same id.
    pub fn update_book(&mut self, book: Book) -> Arc<ReadingState> {
        self.apply(|state| {
            if let Some(slot) = state.books.iter_mut().find(|b| b.id == book.id) {
                *slot = book;
            }
        })
    }

    /// Removes one book. Its highlights are left for the backend to cascade.
    pub fn remove_book(&mut self, book_id: BookId) -> Arc<ReadingState> {
        self.apply(|state| state.books.retain(|book| book.id != book_id))
    }

    pub fn remove_highlight(&mut self, id: HighlightId) -> Arc<ReadingState> {
        self.apply(|state| state.highlights.retain(|highlight| highlight.id != id))
    }

    /// Replaces both collections, e.g. after a backend refresh.
    pub fn replace_all(&mut self, books: Vec<Book>, highlights: Vec<Highlight>) -> Arc<ReadingState> {
        self.apply(|state| {
            state.books = books;
            state.highlights = highlights;
        })
    }

    /// Clears the in-memory state and drops the persisted snapshot.
    pub fn reset(&mut self) -> Arc<ReadingState> {
        self.hydrated = true;
        self.state = Arc::new(ReadingState::default());
        if let Err(err) = self.storage.remove(&self.key) {
            error!(
                "event=store_reset module=store status=error key={} error={}",
                self.key, err
            );
        }
        Arc::clone(&self.state)
    }

    fn apply(&mut self, mutate: impl FnOnce(&mut ReadingState)) -> Arc<ReadingState> {
        self.hydrate();
        let mut next = ReadingState::clone(&self.state);
        mutate(&mut next);
        if next == *self.state {
            return Arc::clone(&self.state);
        }
        self.persist(&next);
        self.state = Arc::new(next);
        Arc::clone(&self.state)
    }

    fn persist(&mut self, state: &ReadingState) {
        let payload = match encode_snapshot(state) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error key={} error_code=encode_failed error={}",
                    self.key, err
                );
                return;
            }
        };
        if let Err(err) = self.storage.save(&self.key, SNAPSHOT_VERSION, &payload) {
            error!(
                "event=store_persist module=store status=error key={} error_code=save_failed error={}",
                self.key, err
            );
        }
    }

    fn reset_after_hydration_failure(&mut self, reason: String) -> HydrationOutcome {
        warn!(
            "event=store_hydrate module=store status=reset key={} reason={}",
            self.key, reason
        );
        self.state = Arc::new(ReadingState::default());
        HydrationOutcome::Reset { reason }
    }
}
