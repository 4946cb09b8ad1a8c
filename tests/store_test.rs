//! Record store tests over on-disk slots

use std::sync::Arc;

use quote_sync::store::slots::{LAST_CATEGORY_KEY, QUOTES_KEY};
use quote_sync::store::{parse_import, FileSlots, MemorySlots, Slots};
use quote_sync::{default_seed, CategoryFilter, Record, RecordStore};

fn open(dir: &std::path::Path) -> (Arc<FileSlots>, RecordStore) {
    let slots = Arc::new(FileSlots::open(dir).unwrap());
    let store = RecordStore::load(slots.clone(), Arc::new(MemorySlots::new()));
    (slots, store)
}

#[test]
fn test_fresh_directory_starts_from_seed() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = open(dir.path());

    assert_eq!(store.records(), default_seed().as_slice());
    assert_eq!(
        store.categories(),
        ["Inspiration", "Life", "Philosophy", "Technology", "Wisdom"]
    );
}

#[test]
fn test_add_to_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let (slots, _) = open(dir.path());
    slots.set(QUOTES_KEY, "[]").unwrap();

    let (slots, mut store) = open(dir.path());
    assert!(store.is_empty());
    assert!(store.add(Record::new("hello", "life")));

    assert_eq!(store.categories(), ["life"]);
    assert_eq!(store.len(), 1);
    let persisted: Vec<Record> =
        serde_json::from_str(&slots.get(QUOTES_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted, store.records());
}

#[test]
fn test_save_then_load_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mut store) = open(dir.path());
    store.add(Record::new("with extra", "Misc").with_field("author", "Anon"));
    store.merge_remote(vec![Record::remote("from server", "Server-1")]);
    store.save();

    let (slots, reloaded) = open(dir.path());
    assert_eq!(reloaded.records(), store.records());
    assert_eq!(reloaded.categories(), store.categories());

    // Persisted image is unchanged by a load and save
    let before = slots.get(QUOTES_KEY).unwrap().unwrap();
    reloaded.save();
    let after = slots.get(QUOTES_KEY).unwrap().unwrap();
    assert_eq!(after, before);

    let (_, again) = open(dir.path());
    again.save();
    assert_eq!(slots.get(QUOTES_KEY).unwrap().unwrap(), before);
}

#[test]
fn test_blank_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (slots, mut store) = open(dir.path());
    let before = store.len();

    assert!(!store.add(Record::new("   ", "life")));
    assert!(!store.add(Record::new("text", "")));
    assert_eq!(store.len(), before);
    assert_eq!(slots.get(QUOTES_KEY).unwrap(), None);
}

#[test]
fn test_import_keeps_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mut store) = open(dir.path());
    let before = store.len();

    let json = r#"[{"text":"ok","category":"c"}, {"text":123,"category":"c"}, "garbage"]"#;
    assert_eq!(store.import(parse_import(json).unwrap()), 1);
    assert_eq!(store.len(), before + 1);

    // Same document again: appended again
    assert_eq!(store.import(parse_import(json).unwrap()), 1);
    assert_eq!(store.len(), before + 2);
    assert_eq!(store.filter_by_category(&CategoryFilter::parse("c")).len(), 2);
}

#[test]
fn test_merge_never_adds_known_text() {
    let dir = tempfile::tempdir().unwrap();
    let (_, mut store) = open(dir.path());
    let seed_text = default_seed()[0].text.clone();

    let added = store.merge_remote(vec![
        Record::remote(seed_text.clone(), "Server-1"),
        Record::remote("new", "Server-1"),
    ]);
    assert_eq!(added, 1);
    assert_eq!(store.records().iter().filter(|r| r.text == seed_text).count(), 1);
}

#[test]
fn test_filter_preference_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (slots, store) = open(dir.path());
    store.select_category(&CategoryFilter::parse("Wisdom"));
    assert_eq!(slots.get(LAST_CATEGORY_KEY).unwrap().as_deref(), Some("Wisdom"));

    let (_, reloaded) = open(dir.path());
    assert_eq!(reloaded.restored_filter(), CategoryFilter::Only("Wisdom".to_string()));
}

#[test]
fn test_last_shown_is_session_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = open(dir.path());
    let shown = store.random_record(&CategoryFilter::All).unwrap();
    store.remember_shown(&shown);
    assert_eq!(store.last_shown(), Some(shown));

    let (_, reloaded) = open(dir.path());
    assert_eq!(reloaded.last_shown(), None);
}

#[test]
fn test_corrupt_slot_falls_back_to_seed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("quotes.slot"), "{not json").unwrap();

    let (_, store) = open(dir.path());
    assert_eq!(store.len(), default_seed().len());
}
