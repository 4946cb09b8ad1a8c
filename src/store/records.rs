//! Record Store
//!
//! Owns the ordered, append-only quote collection, its derived category
//! index, and the persisted image of both. Every mutation recomputes the
//! index; `add` and `import` persist before returning, `merge_remote` leaves
//! persistence to the caller.

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::slots::{Slots, LAST_CATEGORY_KEY, LAST_QUOTE_KEY, QUOTES_KEY};
use crate::error::{QuoteError, Result};
use crate::models::{default_seed, Record};

/// The single store instance shared by the controller and the sync engine
pub type SharedStore = Arc<RwLock<RecordStore>>;

/// Filter value that selects every record
pub const ALL_CATEGORIES: &str = "all";

/// Category selection applied when listing or picking records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No filtering
    #[default]
    All,
    /// Records in one category
    Only(String),
}

impl CategoryFilter {
    /// Parse a user-facing filter value; `"all"` selects everything
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == ALL_CATEGORIES || value.is_empty() {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How category filters compare against record categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseMode {
    #[default]
    Sensitive,
    Insensitive,
}

impl CaseMode {
    fn matches(self, wanted: &str, category: &str) -> bool {
        match self {
            CaseMode::Sensitive => wanted == category,
            CaseMode::Insensitive => wanted.to_lowercase() == category.to_lowercase(),
        }
    }
}

pub struct RecordStore {
    records: Vec<Record>,
    categories: Vec<String>,
    durable: Arc<dyn Slots>,
    session: Arc<dyn Slots>,
    case_mode: CaseMode,
}

impl RecordStore {
    /// Hydrate from the durable slots, falling back to the default seed when
    /// nothing usable is persisted. Never fails.
    pub fn load(durable: Arc<dyn Slots>, session: Arc<dyn Slots>) -> Self {
        let records = match Self::read_persisted(durable.as_ref()) {
            Some(records) => {
                info!("Loaded {} quotes from storage", records.len());
                records
            }
            None => default_seed(),
        };

        let mut store = Self {
            records,
            categories: Vec::new(),
            durable,
            session,
            case_mode: CaseMode::default(),
        };
        store.reindex();
        store
    }

    /// Wrap in the shared handle used by the engine and controller
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Set the category filter case policy
    pub fn with_case_mode(mut self, case_mode: CaseMode) -> Self {
        self.case_mode = case_mode;
        self
    }

    fn read_persisted(slots: &dyn Slots) -> Option<Vec<Record>> {
        let raw = match slots.get(QUOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted quotes, using default seed");
                return None;
            }
            Err(e) => {
                error!("Failed to load quotes from storage: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Record>>(&raw) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Persisted quotes are malformed, using default seed: {}", e);
                None
            }
        }
    }

    /// Persist the full collection, overwriting the previous image
    pub fn try_save(&self) -> Result<()> {
        let content = serde_json::to_string(&self.records)?;
        self.durable.set(QUOTES_KEY, &content)
    }

    /// Persist the full collection; failures are logged and the in-memory
    /// collection stays authoritative
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to save quotes to storage: {}", e);
        }
    }

    /// Validate, append and persist a record, returning the stored copy
    pub fn try_add(&mut self, record: Record) -> Result<Record> {
        let record = record.normalized()?;
        self.records.push(record.clone());
        self.reindex();
        self.save();
        debug!("Added quote in category {:?}", record.category);
        Ok(record)
    }

    /// Append a record; `false` (and no mutation) if text or category is blank
    pub fn add(&mut self, record: Record) -> bool {
        match self.try_add(record) {
            Ok(_) => true,
            Err(e) => {
                debug!("Rejected quote: {}", e);
                false
            }
        }
    }

    /// Append every incoming record whose text is not already present,
    /// including texts appended earlier in the same call. Does not persist.
    pub fn merge_remote(&mut self, incoming: impl IntoIterator<Item = Record>) -> usize {
        let mut known: HashSet<String> = self.records.iter().map(|r| r.text.clone()).collect();
        let mut added = 0;

        for record in incoming {
            if known.insert(record.text.clone()) {
                self.records.push(record);
                added += 1;
            }
        }

        if added > 0 {
            self.reindex();
        }
        added
    }

    /// Append every record as-is (no dedup) and persist
    pub fn import(&mut self, records: Vec<Record>) -> usize {
        let count = records.len();
        if count == 0 {
            return 0;
        }
        self.records.extend(records);
        self.reindex();
        self.save();
        count
    }

    fn reindex(&mut self) {
        let distinct: BTreeSet<&str> = self.records.iter().map(|r| r.category.as_str()).collect();
        self.categories = distinct.into_iter().map(str::to_string).collect();
    }

    /// All records in insertion order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct categories, case-sensitive, ascending
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn case_mode(&self) -> CaseMode {
        self.case_mode
    }

    /// Records in the filtered category, or everything for `All`
    pub fn filter_by_category(&self, filter: &CategoryFilter) -> Vec<Record> {
        match filter {
            CategoryFilter::All => self.records.clone(),
            CategoryFilter::Only(wanted) => self
                .records
                .iter()
                .filter(|r| self.case_mode.matches(wanted, &r.category))
                .cloned()
                .collect(),
        }
    }

    /// Pick a random record from the filtered set
    pub fn random_record(&self, filter: &CategoryFilter) -> Option<Record> {
        self.filter_by_category(filter)
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    /// Remember the applied filter for the next session
    pub fn select_category(&self, filter: &CategoryFilter) {
        if let Err(e) = self.durable.set(LAST_CATEGORY_KEY, filter.as_str()) {
            warn!("Failed to save filter preference: {}", e);
        }
    }

    /// The remembered filter, if it still names an existing category
    pub fn restored_filter(&self) -> CategoryFilter {
        let saved = match self.durable.get(LAST_CATEGORY_KEY) {
            Ok(Some(saved)) => CategoryFilter::parse(&saved),
            Ok(None) => return CategoryFilter::All,
            Err(e) => {
                warn!("Failed to load filter preference: {}", e);
                return CategoryFilter::All;
            }
        };

        if let CategoryFilter::Only(category) = &saved {
            if !self.categories.contains(category) {
                return CategoryFilter::All;
            }
        }
        saved
    }

    /// Record the displayed quote in the session slot
    pub fn remember_shown(&self, record: &Record) {
        let result = serde_json::to_string(record)
            .map_err(QuoteError::from)
            .and_then(|json| self.session.set(LAST_QUOTE_KEY, &json));
        if let Err(e) = result {
            warn!("Failed to remember last quote: {}", e);
        }
    }

    /// The quote last displayed in this session
    pub fn last_shown(&self) -> Option<Record> {
        let raw = self.session.get(LAST_QUOTE_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::slots::MemorySlots;

    fn empty_store() -> RecordStore {
        let durable = Arc::new(MemorySlots::new());
        durable.set(QUOTES_KEY, "[]").unwrap();
        RecordStore::load(durable, Arc::new(MemorySlots::new()))
    }

    #[test]
    fn test_missing_state_loads_seed() {
        let store = RecordStore::load(Arc::new(MemorySlots::new()), Arc::new(MemorySlots::new()));
        assert_eq!(store.len(), default_seed().len());
        assert_eq!(
            store.categories(),
            ["Inspiration", "Life", "Philosophy", "Technology", "Wisdom"]
        );
    }

    #[test]
    fn test_corrupt_state_loads_seed() {
        let durable = Arc::new(MemorySlots::new());
        durable.set(QUOTES_KEY, "{not json").unwrap();
        let store = RecordStore::load(durable, Arc::new(MemorySlots::new()));
        assert_eq!(store.records(), default_seed().as_slice());
    }

    #[test]
    fn test_foreign_origin_keeps_persisted_collection() {
        let durable = Arc::new(MemorySlots::new());
        durable
            .set(
                QUOTES_KEY,
                r#"[{"text":"mine","category":"c","origin":"server"},{"text":"other","category":"c","origin":null}]"#,
            )
            .unwrap();
        let store = RecordStore::load(durable, Arc::new(MemorySlots::new()));
        assert_eq!(store.records(), [Record::new("mine", "c"), Record::new("other", "c")]);
    }

    #[test]
    fn test_add_indexes_and_persists() {
        let mut store = empty_store();
        assert!(store.add(Record::new("hello", "life")));
        assert_eq!(store.categories(), ["life"]);
        assert_eq!(store.len(), 1);

        let raw = store.durable.get(QUOTES_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"text":"hello","category":"life"}]"#);
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let mut store = empty_store();
        store.add(Record::new("kept", "B"));

        assert!(!store.add(Record::new("", "x")));
        assert!(!store.add(Record::new("x", "")));
        assert!(!store.add(Record::new("  ", "x")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.categories(), ["B"]);
    }

    #[test]
    fn test_merge_dedups_by_text() {
        let mut store = empty_store();
        store.add(Record::new("t1", "A"));

        let added = store.merge_remote(vec![
            Record::remote("t1", "X"),
            Record::remote("t2", "B"),
            Record::remote("t2", "C"),
        ]);

        assert_eq!(added, 1);
        let texts: Vec<_> = store.records().iter().map(|r| (r.text.as_str(), r.category.as_str())).collect();
        assert_eq!(texts, [("t1", "A"), ("t2", "B")]);
        assert_eq!(store.categories(), ["A", "B"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut store = empty_store();
        let batch = vec![Record::remote("a", "S"), Record::remote("b", "S")];
        assert_eq!(store.merge_remote(batch.clone()), 2);
        assert_eq!(store.merge_remote(batch), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_categories_sorted_case_sensitive() {
        let mut store = empty_store();
        for category in ["beta", "Alpha", "alpha", "Beta", "beta"] {
            store.add(Record::new(format!("q-{category}"), category));
        }
        assert_eq!(store.categories(), ["Alpha", "Beta", "alpha", "beta"]);
    }

    #[test]
    fn test_filter_by_category() {
        let mut store = empty_store();
        store.add(Record::new("one", "Life"));
        store.add(Record::new("two", "life"));
        store.add(Record::new("three", "Work"));

        let only = store.filter_by_category(&CategoryFilter::parse("Life"));
        assert_eq!(only.len(), 1);
        assert_eq!(store.filter_by_category(&CategoryFilter::parse("all")).len(), 3);

        let store = store.with_case_mode(CaseMode::Insensitive);
        assert_eq!(store.filter_by_category(&CategoryFilter::parse("LIFE")).len(), 2);
    }

    #[test]
    fn test_restored_filter_requires_existing_category() {
        let mut store = empty_store();
        store.add(Record::new("one", "Life"));

        store.select_category(&CategoryFilter::parse("Life"));
        assert_eq!(store.restored_filter(), CategoryFilter::Only("Life".into()));

        store.select_category(&CategoryFilter::parse("Gone"));
        assert_eq!(store.restored_filter(), CategoryFilter::All);
    }

    #[test]
    fn test_session_remembers_last_shown() {
        let store = empty_store();
        assert!(store.last_shown().is_none());

        let record = Record::new("shown", "c").with_field("author", "Ada");
        store.remember_shown(&record);
        assert_eq!(store.last_shown(), Some(record));
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let durable = Arc::new(MemorySlots::new().with_quota(Some(64)));
        durable.set(QUOTES_KEY, "[]").unwrap();
        let mut store = RecordStore::load(durable.clone(), Arc::new(MemorySlots::new()));

        assert!(store.add(Record::new("x".repeat(100), "big")));
        assert_eq!(store.len(), 1);
        assert_eq!(durable.get(QUOTES_KEY).unwrap().as_deref(), Some("[]"));
    }
}
