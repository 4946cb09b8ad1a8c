//! Data Models for Quote Sync
//!
//! A [`Record`] is the unit that is stored locally and reconciled with the
//! server. Fields other than `text` and `category` are carried through the
//! store and the merge untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{QuoteError, Result};

/// Where a record entered the local collection from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Added on this device (form, import, seed)
    #[default]
    Local,
    /// Pulled from the server during a sync
    Remote,
}

impl Origin {
    /// Local is the implied origin and is not written out
    pub fn is_local(&self) -> bool {
        matches!(self, Origin::Local)
    }
}

/// Anything but `"remote"` (null, unknown labels, other types) reads as local
fn lenient_origin<'de, D>(deserializer: D) -> std::result::Result<Origin, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(Value::as_str) {
        Some("remote") => Origin::Remote,
        _ => Origin::Local,
    })
}

/// A single quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Quote text; the identity used when merging server data
    pub text: String,

    /// Category label
    pub category: String,

    /// Local or server origin
    #[serde(
        default,
        deserialize_with = "lenient_origin",
        skip_serializing_if = "Origin::is_local"
    )]
    pub origin: Origin,

    /// Opaque extension fields (e.g. an attribution)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Create a local record
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            origin: Origin::Local,
            extra: Map::new(),
        }
    }

    /// Create a record that came from the server
    pub fn remote(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            origin: Origin::Remote,
            ..Self::new(text, category)
        }
    }

    /// Attach an opaque extension field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether two records are the same for merge purposes.
    ///
    /// Exact comparison of `text`; category and extra fields are ignored.
    pub fn same_identity(&self, other: &Record) -> bool {
        self.text == other.text
    }

    /// Return a copy with `text` and `category` trimmed, or a validation
    /// error if either is empty afterwards.
    pub fn normalized(&self) -> Result<Record> {
        let text = self.text.trim();
        let category = self.category.trim();

        if text.is_empty() || category.is_empty() {
            return Err(QuoteError::Validation(
                "Please fill in both the quote and its category.".to_string(),
            ));
        }

        Ok(Record {
            text: text.to_string(),
            category: category.to_string(),
            origin: self.origin,
            extra: self.extra.clone(),
        })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" - {}", self.text, self.category)
    }
}

/// The collection a fresh install starts with
pub fn default_seed() -> Vec<Record> {
    vec![
        Record::new(
            "The only way to do great work is to love what you do.",
            "Inspiration",
        ),
        Record::new(
            "Innovation distinguishes between a leader and a follower.",
            "Technology",
        ),
        Record::new(
            "Strive not to be a success, but rather to be of value.",
            "Wisdom",
        ),
        Record::new(
            "The mind is everything. What you think you become.",
            "Philosophy",
        ),
        Record::new(
            "Your time is limited, so don't waste it living someone else's life.",
            "Life",
        ),
    ]
}
