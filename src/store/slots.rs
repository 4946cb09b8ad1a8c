//! Key-Value Slots
//!
//! The persisted image of the store lives in named string slots, the same
//! shape a browser's local/session storage offers. `FileSlots` keeps one file
//! per key under the data directory; `MemorySlots` lives only as long as the
//! process and backs the session-scoped slot.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{QuoteError, Result};

/// Slot holding the full record collection
pub const QUOTES_KEY: &str = "quotes";

/// Slot holding the most recently applied category filter
pub const LAST_CATEGORY_KEY: &str = "lastSelectedCategory";

/// Session slot holding the most recently displayed record
pub const LAST_QUOTE_KEY: &str = "lastQuote";

/// A string key-value store
pub trait Slots: Send + Sync {
    /// Read a slot, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(QuoteError::InvalidSlotKey(key.to_string()))
    }
}

fn check_quota(quota: Option<u64>, needed: u64) -> Result<()> {
    match quota {
        Some(quota) if needed > quota => Err(QuoteError::QuotaExceeded { needed, quota }),
        _ => Ok(()),
    }
}

/// Durable slots, one file per key
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileSlots {
    /// Open (and create) a slot directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota: None })
    }

    /// Limit the total size of all slots in bytes
    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.slot"))
    }

    /// Bytes used by every slot except `key`
    fn usage_excluding(&self, key: &str) -> Result<u64> {
        let skip = self.path(key);
        let mut total = 0u64;
        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some("slot") {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
        Ok(total)
    }
}

impl Slots for FileSlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        match std::fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        if self.quota.is_some() {
            let needed = self.usage_excluding(key)? + value.len() as u64;
            check_quota(self.quota, needed)?;
        }

        // Write-then-rename so a crash never leaves a half-written slot
        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process slots
#[derive(Debug, Default)]
pub struct MemorySlots {
    values: RwLock<HashMap<String, String>>,
    quota: Option<u64>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of all slots in bytes
    pub fn with_quota(mut self, quota: Option<u64>) -> Self {
        self.quota = quota;
        self
    }
}

impl Slots for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        let mut values = self.values.write();
        let others: u64 = values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len() as u64)
            .sum();
        check_quota(self.quota, others + value.len() as u64)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slots_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::open(dir.path()).unwrap();

        assert_eq!(slots.get(QUOTES_KEY).unwrap(), None);
        slots.set(QUOTES_KEY, "[]").unwrap();
        assert_eq!(slots.get(QUOTES_KEY).unwrap().as_deref(), Some("[]"));
        slots.set(QUOTES_KEY, "[1]").unwrap();
        assert_eq!(slots.get(QUOTES_KEY).unwrap().as_deref(), Some("[1]"));
        assert!(!dir.path().join("quotes.tmp").exists());
    }

    #[test]
    fn test_file_slots_quota() {
        let dir = tempfile::tempdir().unwrap();
        let slots = FileSlots::open(dir.path()).unwrap().with_quota(Some(8));

        slots.set("a", "12345").unwrap();
        // Replacing a slot only counts its new size
        slots.set("a", "1234567").unwrap();
        let err = slots.set("b", "12").unwrap_err();
        assert!(matches!(err, QuoteError::QuotaExceeded { needed: 9, quota: 8 }));
        assert_eq!(slots.get("b").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let slots = MemorySlots::new();
        assert!(matches!(
            slots.set("../escape", "x"),
            Err(QuoteError::InvalidSlotKey(_))
        ));
        assert!(slots.get("").is_err());
    }

    #[test]
    fn test_memory_slots_quota() {
        let slots = MemorySlots::new().with_quota(Some(4));
        slots.set(LAST_QUOTE_KEY, "abcd").unwrap();
        assert!(slots.set(LAST_CATEGORY_KEY, "e").is_err());
        // Shrinking a slot frees its space
        slots.set(LAST_QUOTE_KEY, "").unwrap();
        slots.set(LAST_CATEGORY_KEY, "e").unwrap();
    }
}
