use bookbuddy_core::store::snapshot::DEFAULT_SNAPSHOT_KEY;
use bookbuddy_core::{
    Book, Highlight, HydrationOutcome, MemorySnapshotStorage, ReadingState, ReadingStore,
    SnapshotStorage, SqliteSnapshotStorage,
};
use chrono::{TimeZone, Utc};

fn store_with_payload(payload: &str) -> ReadingStore<MemorySnapshotStorage> {
    ReadingStore::new(MemorySnapshotStorage::new().with_entry(DEFAULT_SNAPSHOT_KEY, payload))
}

#[test]
fn non_array_books_fall_back_to_empty_state() {
    let mut store = store_with_payload(r#"{"books": "not-an-array", "highlights": []}"#);

    let outcome = store.hydrate();

    assert!(matches!(outcome, HydrationOutcome::Reset { .. }));
    assert_eq!(*store.state(), ReadingState::default());
}

#[test]
fn malformed_json_falls_back_to_empty_state() {
    let mut store = store_with_payload("{not json");
    assert!(matches!(store.hydrate(), HydrationOutcome::Reset { .. }));
    assert!(store.state().is_empty());
}

#[test]
fn unknown_version_falls_back_to_empty_state() {
    let mut store =
        store_with_payload(r#"{"state": {"books": [], "highlights": []}, "version": 3}"#);
    let outcome = store.hydrate();
    match outcome {
        HydrationOutcome::Reset { reason } => assert!(reason.contains("version 3")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn versionless_snapshot_defaults_missing_highlights() {
    let book = Book::new("Dune", "Frank Herbert", 412);
    let payload = serde_json::json!({ "state": { "books": [book] } }).to_string();
    let mut store = store_with_payload(&payload);

    assert_eq!(
        store.hydrate(),
        HydrationOutcome::Restored {
            books: 1,
            highlights: 0
        }
    );
    assert_eq!(store.state().books, vec![book]);
}

#[test]
fn invalid_record_inside_array_resets() {
    let payload = r#"{"state": {"books": [{"title": "missing fields"}], "highlights": []}, "version": 0}"#;
    let mut store = store_with_payload(payload);
    assert!(matches!(store.hydrate(), HydrationOutcome::Reset { .. }));
}

#[test]
fn first_mutation_hydrates_before_applying() {
    let existing = Book::new("Dune", "Frank Herbert", 412);
    let payload = serde_json::json!({
        "state": { "books": [existing], "highlights": [] },
        "version": 0
    })
    .to_string();
    let mut store = store_with_payload(&payload);
    assert!(!store.is_hydrated());

    let state = store.add_book(Book::new("Emma", "Jane Austen", 474));

    assert!(store.is_hydrated());
    assert_eq!(state.books.len(), 2);
    assert_eq!(state.books[0], existing);
}

#[test]
fn sqlite_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookbuddy.db");
    let book = Book::new("Dune", "Frank Herbert", 412);
    let created_at = Utc.with_ymd_and_hms(2026, 4, 2, 18, 30, 0).unwrap();
    let highlight = Highlight::new(book.id, "Fear is the mind-killer", 27, created_at);

    {
        let mut store = ReadingStore::new(SqliteSnapshotStorage::open(&path).unwrap());
        store.add_book(book.clone());
        store.add_highlight(highlight.clone());
        store.toggle_favorite_highlight(highlight.id);
    }

    let storage = SqliteSnapshotStorage::open(&path).unwrap();
    assert_eq!(storage.stored_version(DEFAULT_SNAPSHOT_KEY).unwrap(), Some(0));

    let mut reopened = ReadingStore::new(storage);
    assert_eq!(
        reopened.hydrate(),
        HydrationOutcome::Restored {
            books: 1,
            highlights: 1
        }
    );
    let state = reopened.state();
    assert_eq!(state.books, vec![book]);
    assert!(state.highlights[0].is_favorite);
    assert_eq!(state.highlights[0].created_at, created_at);
}

#[test]
fn stores_with_different_keys_are_isolated() {
    let mut storage = MemorySnapshotStorage::new();
    storage
        .save("other-user", 0, r#"{"state": {"books": [], "highlights": []}, "version": 0}"#)
        .unwrap();

    let mut store = ReadingStore::with_key(storage, "this-user");
    assert_eq!(store.hydrate(), HydrationOutcome::Missing);
    store.add_book(Book::new("Dune", "Frank Herbert", 412));

    let storage = store.into_storage();
    assert!(storage.raw("this-user").is_some());
    assert!(storage
        .raw("other-user")
        .is_some_and(|raw| raw.contains("\"books\":[]")));
}
