//! Quote book - glue between user actions and the core.
//!
//! Wires add / filter / import / export / manual sync to the store and the
//! sync engine, reporting through the notification sink. Presentation stays
//! with the caller.

use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{Config, SyncConfig};
use crate::error::{QuoteError, Result};
use crate::models::Record;
use crate::notify::{NotificationSink, Severity};
use crate::store::{
    export_to_file, parse_import, CategoryFilter, FileSlots, MemorySlots, RecordStore, SharedStore,
};
use crate::sync::{HttpRemoteClient, PeriodicSync, PullOutcome, RemoteClient, SyncEngine, SyncEvent};

pub struct QuoteBook {
    store: SharedStore,
    engine: Arc<SyncEngine>,
    sink: Arc<dyn NotificationSink>,
}

impl QuoteBook {
    /// Open the on-disk store and HTTP remote described by `config`
    pub fn open<F>(config: &Config, sink: Arc<dyn NotificationSink>, on_event: F) -> Result<Self>
    where
        F: Fn(SyncEvent) + Send + Sync + 'static,
    {
        let durable = FileSlots::open(&config.storage.data_dir)?.with_quota(config.storage.quota_bytes);
        let store = RecordStore::load(Arc::new(durable), Arc::new(MemorySlots::new()))
            .with_case_mode(config.filter.case_mode())
            .into_shared();
        let remote: Arc<dyn RemoteClient> = Arc::new(HttpRemoteClient::new(&config.remote)?);

        let mut engine = SyncEngine::new(store.clone(), remote, sink.clone())
            .with_remote_timeout(config.sync.fetch_timeout());
        engine.on_event(on_event);

        info!("Opened quote store at {}", config.storage.data_dir.display());
        Ok(Self::from_parts(store, Arc::new(engine), sink))
    }

    /// Assemble from already-built parts
    pub fn from_parts(store: SharedStore, engine: Arc<SyncEngine>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, engine, sink }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Add a quote locally, then offer it to the server in the background.
    ///
    /// Blank text or category is reported through the sink and nothing is
    /// stored or pushed.
    pub fn add_quote(&self, text: &str, category: &str) -> Result<JoinHandle<bool>> {
        let added = self.store.write().try_add(Record::new(text, category));
        match added {
            Ok(record) => Ok(self.engine.spawn_push(record)),
            Err(e) => {
                self.sink.display(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Distinct categories, ascending
    pub fn categories(&self) -> Vec<String> {
        self.store.read().categories().to_vec()
    }

    /// Records matching `filter`
    pub fn list(&self, filter: &CategoryFilter) -> Vec<Record> {
        self.store.read().filter_by_category(filter)
    }

    /// The filter restored from the last session
    pub fn current_filter(&self) -> CategoryFilter {
        self.store.read().restored_filter()
    }

    /// Apply and remember a filter value (`"all"` or a category)
    pub fn apply_filter(&self, value: &str) -> CategoryFilter {
        let filter = CategoryFilter::parse(value);
        self.store.read().select_category(&filter);
        filter
    }

    /// Pick a random quote and remember it for this session
    pub fn show_random(&self, filter: &CategoryFilter) -> Option<Record> {
        let store = self.store.read();
        let record = store.random_record(filter)?;
        store.remember_shown(&record);
        Some(record)
    }

    /// The quote shown last in this session
    pub fn show_again(&self) -> Option<Record> {
        self.store.read().last_shown()
    }

    /// Import a JSON document; appends every valid element without dedup
    pub fn import_json(&self, json: &str) -> Result<usize> {
        match parse_import(json) {
            Ok(records) => {
                let count = self.store.write().import(records);
                self.sink.display(
                    &format!("Imported {} quotes successfully!", count),
                    Severity::Success,
                );
                Ok(count)
            }
            Err(e) => {
                error!("Import failed: {}", e);
                self.sink.display(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Import from a file
    pub fn import_file(&self, path: &Path) -> Result<usize> {
        match std::fs::read_to_string(path) {
            Ok(json) => self.import_json(&json),
            Err(e) => {
                let e = QuoteError::from(e);
                self.sink.display(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Export the full collection as pretty JSON
    pub fn export_file(&self, path: &Path) -> Result<()> {
        let result = export_to_file(self.store.read().records(), path);
        if let Err(ref e) = result {
            error!("Export failed: {}", e);
            self.sink.display("Export failed. See log for details.", Severity::Error);
        }
        result
    }

    /// Pull from the server now
    pub async fn sync_now(&self) -> PullOutcome {
        self.engine.pull().await
    }

    /// Start periodic pulls as configured
    pub fn start_periodic(&self, config: &SyncConfig) -> PeriodicSync {
        self.engine.start_periodic(config.interval(), config.initial_delay())
    }
}
