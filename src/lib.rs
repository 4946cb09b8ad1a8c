//! Quote Sync - local-first quote collection
//!
//! Keeps an append-only quote store on disk and reconciles it with a remote
//! server: pulls merge additively by quote text, pushes are fire-and-forget,
//! and local writes always win.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use app::QuoteBook;
pub use config::Config;
pub use error::{QuoteError, Result};
pub use models::{default_seed, Origin, Record};
pub use notify::{LogSink, Notice, NotificationSink, Severity, StatusBoard};
pub use store::{CaseMode, CategoryFilter, RecordStore, SharedStore};
pub use sync::{PeriodicSync, PullOutcome, RemoteClient, SyncEngine, SyncEvent, SyncStats};
