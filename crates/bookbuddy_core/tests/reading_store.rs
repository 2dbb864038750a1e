use bookbuddy_core::{Book, Highlight, MemorySnapshotStorage, ReadingStatus, ReadingStore};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

fn store() -> ReadingStore<MemorySnapshotStorage> {
    ReadingStore::new(MemorySnapshotStorage::new())
}

#[test]
fn add_book_preserves_insertion_order() {
    let mut store = store();
    let first = Book::new("Dune", "Frank Herbert", 412);
    let second = Book::new("Emma", "Jane Austen", 474);

    store.add_book(first.clone());
    let state = store.add_book(second.clone());

    let ids: Vec<_> = state.books.iter().map(|book| book.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn add_book_does_not_deduplicate_ids() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);

    store.add_book(book.clone());
    let state = store.add_book(book);

    assert_eq!(state.books.len(), 2);
}

#[test]
fn add_highlight_accepts_unknown_book() {
    let mut store = store();
    let orphan = Highlight::new(Uuid::new_v4(), "orphan", 3, Utc::now());

    let state = store.add_highlight(orphan.clone());

    assert_eq!(state.highlights, vec![orphan]);
}

#[test]
fn update_reading_progress_does_not_clamp_or_change_status() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);
    store.add_book(book.clone());

    for page in [0, 200, 412, 9_999] {
        let state = store.update_reading_progress(book.id, page);
        let stored = state.book(book.id).unwrap();
        assert_eq!(stored.current_page, Some(page));
        assert_eq!(stored.status, ReadingStatus::NotStarted);
    }
}

#[test]
fn toggle_favorite_twice_restores_original_value() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);
    let highlight = Highlight::new(book.id, "The spice must flow", 10, Utc::now());
    store.add_book(book);
    store.add_highlight(highlight.clone());

    let once = store.toggle_favorite_highlight(highlight.id);
    assert!(once.highlight(highlight.id).unwrap().is_favorite);

    let twice = store.toggle_favorite_highlight(highlight.id);
    assert!(!twice.highlight(highlight.id).unwrap().is_favorite);
}

#[test]
fn unmatched_ids_are_silent_no_ops() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);
    let before = store.add_book(book);

    let after_toggle = store.toggle_favorite_highlight(Uuid::new_v4());
    let after_progress = store.update_reading_progress(Uuid::new_v4(), 5);
    let after_remove = store.remove_highlight(Uuid::new_v4());

    assert_eq!(*after_toggle, *before);
    assert_eq!(*after_progress, *before);
    assert_eq!(*after_remove, *before);
}

#[test]
fn remove_book_leaves_highlights_for_backend_cascade() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);
    let created_at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
    store.add_book(book.clone());
    store.add_highlight(Highlight::new(book.id, "quote", 1, created_at));

    let state = store.remove_book(book.id);

    assert!(state.books.is_empty());
    assert_eq!(state.highlights_for_book(book.id).count(), 1);
}

#[test]
fn mutations_persist_after_every_change() {
    let mut store = store();
    let book = Book::new("Dune", "Frank Herbert", 412);
    store.add_book(book.clone());
    store.update_reading_progress(book.id, 42);

    let storage = store.into_storage();
    let raw = storage.raw("book-storage").expect("snapshot persisted");
    let value: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(value["version"], 0);
    assert_eq!(value["state"]["books"][0]["currentPage"], 42);
    assert_eq!(value["state"]["books"][0]["status"], "NOT_STARTED");
}

#[test]
fn reset_clears_state_and_storage() {
    let mut store = store();
    store.add_book(Book::new("Dune", "Frank Herbert", 412));

    let state = store.reset();
    assert!(state.is_empty());
    assert!(store.into_storage().raw("book-storage").is_none());
}
