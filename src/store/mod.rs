//! Local Quote Storage
//!
//! The persisted, append-only record collection and its file transfer
//! helpers.
//!
//! ## Persisted slots
//!
//! ```text
//! quotes                → JSON array, full collection, rewritten on every mutation
//! lastSelectedCategory  → most recently applied filter ("all" or a category)
//! lastQuote             → session only: last displayed record
//! ```

pub mod records;
pub mod slots;
pub mod transfer;

pub use records::{CaseMode, CategoryFilter, RecordStore, SharedStore, ALL_CATEGORIES};
pub use slots::{FileSlots, MemorySlots, Slots};
pub use transfer::{export_json, export_to_file, parse_import, EXPORT_FILE_NAME};
