//! Sync Engine
//!
//! Reconciles the local store with the server. Pulls merge server records
//! additively (a record is admitted only if no local record has the same
//! text); pushes offer freshly added local records to the server and never
//! touch the store, whatever the server answers. At most one pull runs at a
//! time.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::remote::RemoteClient;
use crate::models::Record;
use crate::notify::{NotificationSink, Severity};
use crate::store::SharedStore;

pub const MSG_SYNCING: &str = "Syncing with server...";
pub const MSG_CONNECT_FAILED: &str = "Could not connect to server.";
pub const MSG_SYNCED: &str = "Quotes synced with server!";
pub const MSG_UP_TO_DATE: &str = "Quotes are already up-to-date.";
pub const MSG_PUSHED: &str = "Quote saved to server!";
pub const MSG_PUSH_FAILED: &str = "Quote saved locally, but failed to sync to server.";

/// Default bound on a single remote call
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Sync engine events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Pull started
    Started,
    /// Pull merged new records; views should refresh
    Completed { added: usize },
    /// Pull found nothing new
    UpToDate,
    /// Pull could not get data from the server
    Failed { error: String },
    /// Server accepted a pushed record
    Pushed,
    /// Server did not accept a pushed record
    PushFailed,
}

/// What a single pull did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Another pull was in flight
    Skipped,
    /// Fetch failed or returned nothing
    Failed,
    /// Nothing new on the server
    UpToDate,
    /// This many records were appended
    Merged(usize),
}

/// Statistics about sync operations
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Pulls that ran (not skipped)
    pub total_pulls: u64,
    /// Pulls that reached the merge step
    pub successful_pulls: u64,
    /// Pulls that got nothing from the server
    pub failed_pulls: u64,
    /// Pulls dropped because one was already running
    pub skipped_pulls: u64,
    /// Records appended by pulls
    pub records_merged: u64,
    /// Pushes the server accepted
    pub pushes_accepted: u64,
    /// Pushes the server did not accept
    pub pushes_failed: u64,
    /// Last successful pull
    pub last_sync: Option<DateTime<Utc>>,
    /// Last error
    pub last_error: Option<String>,
    /// Average pull duration in ms
    pub avg_pull_duration_ms: f64,
}

/// Holds the single-flight flag; releasing happens on drop so every exit
/// path of a pull (including cancellation) clears it.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Orchestrates pulls, pushes and periodic scheduling
pub struct SyncEngine {
    store: SharedStore,
    remote: Arc<dyn RemoteClient>,
    sink: Arc<dyn NotificationSink>,
    syncing: AtomicBool,
    remote_timeout: Duration,
    stats: RwLock<SyncStats>,
    event_callback: Option<Box<dyn Fn(SyncEvent) + Send + Sync>>,
}

impl SyncEngine {
    /// Create a new engine over a shared store
    pub fn new(
        store: SharedStore,
        remote: Arc<dyn RemoteClient>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            remote,
            sink,
            syncing: AtomicBool::new(false),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            stats: RwLock::new(SyncStats::default()),
            event_callback: None,
        }
    }

    /// Bound every remote call by `timeout`
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Set event callback
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: Fn(SyncEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(Box::new(callback));
    }

    /// Whether a pull is in flight
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Get current stats
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// The store this engine reconciles
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Fetch from the server and merge anything new into the store.
    ///
    /// Returns immediately with `Skipped` if another pull is running.
    pub async fn pull(&self) -> PullOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            debug!("Sync already in progress, skipping");
            self.stats.write().skipped_pulls += 1;
            return PullOutcome::Skipped;
        };

        let start = Instant::now();
        self.emit_event(SyncEvent::Started);
        self.sink.display(MSG_SYNCING, Severity::Info);

        let fetched = match tokio::time::timeout(self.remote_timeout, self.remote.fetch()).await {
            Ok(records) => records,
            Err(_) => {
                warn!("Fetch timed out after {:?}", self.remote_timeout);
                Vec::new()
            }
        };

        if fetched.is_empty() {
            self.record_failure(MSG_CONNECT_FAILED);
            self.sink.display(MSG_CONNECT_FAILED, Severity::Error);
            self.emit_event(SyncEvent::Failed {
                error: MSG_CONNECT_FAILED.to_string(),
            });
            return PullOutcome::Failed;
        }

        let added = {
            let mut store = self.store.write();
            let added = store.merge_remote(fetched);
            if added > 0 {
                store.save();
            }
            added
        };

        self.record_success(added, start.elapsed());

        if added > 0 {
            info!("Sync complete. Added {} new quotes.", added);
            self.sink.display(MSG_SYNCED, Severity::Success);
            self.emit_event(SyncEvent::Completed { added });
            PullOutcome::Merged(added)
        } else {
            debug!("Sync complete, nothing new");
            self.sink.display(MSG_UP_TO_DATE, Severity::Info);
            self.emit_event(SyncEvent::UpToDate);
            PullOutcome::UpToDate
        }
    }

    /// Offer a record to the server. The outcome is informational only; the
    /// local store is never changed here.
    pub async fn push(&self, record: &Record) -> bool {
        let accepted = tokio::time::timeout(self.remote_timeout, self.remote.create(record))
            .await
            .unwrap_or_else(|_| {
                warn!("Push timed out after {:?}", self.remote_timeout);
                false
            });

        {
            let mut stats = self.stats.write();
            if accepted {
                stats.pushes_accepted += 1;
            } else {
                stats.pushes_failed += 1;
            }
        }

        if accepted {
            self.sink.display(MSG_PUSHED, Severity::Success);
            self.emit_event(SyncEvent::Pushed);
        } else {
            self.sink.display(MSG_PUSH_FAILED, Severity::Error);
            self.emit_event(SyncEvent::PushFailed);
        }
        accepted
    }

    /// Fire-and-forget push on a detached task. The handle may be awaited
    /// or dropped.
    pub fn spawn_push(self: &Arc<Self>, record: Record) -> JoinHandle<bool> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.push(&record).await })
    }

    /// Pull every `interval`, starting after `initial_delay`.
    ///
    /// Each tick runs its own pull on a separate task, so a tick that lands
    /// while a pull is in flight is dropped by the single-flight guard.
    pub fn start_periodic(self: &Arc<Self>, interval: Duration, initial_delay: Duration) -> PeriodicSync {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = Arc::clone(self);
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + initial_delay;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Periodic sync every {:?}", period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let engine = Arc::clone(&engine);
                        tokio::spawn(async move {
                            engine.pull().await;
                        });
                    }
                    // Fires on stop() and when the handle is dropped
                    _ = stop_rx.changed() => break,
                }
            }
            debug!("Periodic sync stopped");
        });

        PeriodicSync {
            stop: stop_tx,
            task,
        }
    }

    fn record_success(&self, added: usize, duration: Duration) {
        let mut stats = self.stats.write();
        stats.total_pulls += 1;
        stats.successful_pulls += 1;
        stats.records_merged += added as u64;
        stats.last_sync = Some(Utc::now());

        // Update rolling average
        let n = stats.successful_pulls as f64;
        let duration_ms = duration.as_millis() as f64;
        stats.avg_pull_duration_ms = (stats.avg_pull_duration_ms * (n - 1.0) + duration_ms) / n;
    }

    fn record_failure(&self, error: &str) {
        let mut stats = self.stats.write();
        stats.total_pulls += 1;
        stats.failed_pulls += 1;
        stats.last_error = Some(error.to_string());
    }

    fn emit_event(&self, event: SyncEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

/// Handle to a running periodic sync
pub struct PeriodicSync {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeriodicSync {
    /// Stop scheduling and wait for the scheduler task to exit. Pulls that
    /// already started run to completion.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!("Periodic sync task ended abnormally: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive_and_released() {
        let flag = AtomicBool::new(false);
        {
            let _first = SyncGuard::acquire(&flag).unwrap();
            assert!(SyncGuard::acquire(&flag).is_none());
        }
        assert!(!flag.load(Ordering::Acquire));
        assert!(SyncGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_stats_default() {
        let stats = SyncStats::default();
        assert_eq!(stats.total_pulls, 0);
        assert!(stats.last_sync.is_none());
    }
}
