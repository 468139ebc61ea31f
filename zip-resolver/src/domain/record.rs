//! Dataset entries and the in-memory index.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ZipCode;

/// One locality from the official zip code directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipRecord {
    pub zip_code: ZipCode,

    /// Locality name (Ortschaftsname).
    pub city: String,

    /// Disambiguates localities sharing one zip code (Zusatzziffer).
    pub extra_digit: u8,

    /// Municipality name (Gemeindename).
    pub commune: String,

    /// Federal statistical office municipality number (BFS-Nr).
    pub commune_id: u32,

    /// Two-letter canton abbreviation.
    pub canton: String,

    /// Swiss grid east coordinate.
    pub east: f64,

    /// Swiss grid north coordinate.
    pub north: f64,
}

/// All known zip codes, keyed by code, plus the time they were fetched.
///
/// Absence of a key means the code is not a valid Swiss zip code; an index
/// only exists once the data has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetIndex {
    records: HashMap<ZipCode, ZipRecord>,
    fetched_at: DateTime<Utc>,
}

impl DatasetIndex {
    /// Create an empty index stamped with `fetched_at`.
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self {
            records: HashMap::new(),
            fetched_at,
        }
    }

    /// Build an index from records in source order.
    ///
    /// When several records share a zip code, the last one wins.
    pub fn from_records(
        records: impl IntoIterator<Item = ZipRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut index = Self::new(fetched_at);
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&mut self, record: ZipRecord) -> Option<ZipRecord> {
        self.records.insert(record.zip_code, record)
    }

    pub fn get(&self, zip: ZipCode) -> Option<&ZipRecord> {
        self.records.get(&zip)
    }

    pub fn contains(&self, zip: ZipCode) -> bool {
        self.records.contains_key(&zip)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Iterate over records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &ZipRecord> {
        self.records.values()
    }
}
