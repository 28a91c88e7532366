//! Content records: business data such as bookings or testimonials

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-supplied fields of a content record
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// The whole `data.json` document: record type → records
pub type RecordDocument = BTreeMap<String, Vec<Record>>;

/// A content record
///
/// `id`, `created_at` and `updated_at` belong to the store. Everything else
/// is an open key-value map owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Caller-supplied fields
    #[serde(flatten)]
    pub fields: Fields,

    /// Identifier, unique within its record type
    pub id: String,

    /// Creation timestamp (local clock)
    pub created_at: NaiveDateTime,

    /// Last modification timestamp (local clock)
    pub updated_at: NaiveDateTime,
}

impl Record {
    /// Build a new record, dropping any reserved keys from `fields`
    pub(crate) fn new(id: String, fields: Fields) -> Self {
        let now = super::now();
        Self {
            fields: strip_reserved(fields),
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `patch` into the record and bump `updated_at`
    pub(crate) fn apply(&mut self, patch: Fields) {
        for (key, value) in strip_reserved(patch) {
            self.fields.insert(key, value);
        }
        self.updated_at = super::now();
    }

    /// Look up a caller field
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

fn strip_reserved(mut fields: Fields) -> Fields {
    for key in super::RESERVED_KEYS {
        fields.remove(key);
    }
    fields
}
