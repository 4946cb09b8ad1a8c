//! Server Sync Module
//!
//! Keeps the local quote store reconciled with the quote server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  SyncEngine                      │
//! │  ┌──────────┐   pull   ┌──────────────┐         │
//! │  │ Periodic │────────▶ │ RemoteClient │ fetch   │
//! │  │ (tokio)  │          └──────┬───────┘         │
//! │  └──────────┘                 ▼                 │
//! │   guard: one pull   ┌──────────────────┐        │
//! │   at a time         │ RecordStore      │ merge  │
//! │                     │ (dedup by text)  │ + save │
//! │                     └──────────────────┘        │
//! │  push (detached) ──▶ RemoteClient::create       │
//! │  every outcome   ──▶ NotificationSink           │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod remote;

pub use engine::{PeriodicSync, PullOutcome, SyncEngine, SyncEvent, SyncStats};
pub use remote::{HttpRemoteClient, NewPost, Post, RemoteClient};
