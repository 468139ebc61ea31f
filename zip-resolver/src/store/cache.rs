//! Disk-based cache for the parsed zip code dataset.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::StoreError;
use crate::domain::{DatasetIndex, ZipRecord};

/// File name of the cache artifact inside the cache directory.
pub const CACHE_FILE_NAME: &str = "swiss-zipcodes-list.json";

/// Bumped whenever the on-disk layout changes.
const FORMAT_VERSION: u32 = 1;

/// On-disk representation of a dataset.
#[derive(Debug, Serialize, Deserialize)]
struct CachedDataset {
    version: u32,
    fetched_at: DateTime<Utc>,
    records: Vec<ZipRecord>,
}

/// Time elapsed since `fetched_at`.
///
/// Timestamps in the future count as zero age.
pub fn age_since(fetched_at: DateTime<Utc>) -> Duration {
    (Utc::now() - fetched_at).to_std().unwrap_or(Duration::ZERO)
}

/// Where the cache artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the artifact. Created on first write.
    pub dir: PathBuf,
    /// File name of the artifact inside `dir`.
    pub file_name: String,
}

impl StoreConfig {
    /// Create a config for `dir` with the default file name.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: CACHE_FILE_NAME.to_string(),
        }
    }

    /// Set a custom artifact file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        // Default to the system temp directory
        Self::new(std::env::temp_dir())
    }
}

/// Durable cache of the dataset, one file in a directory.
///
/// Writes are atomic: the artifact is written to a temporary file in the
/// same directory and renamed over the old one, so a reader never sees a
/// partially written dataset. There is no inter-process locking; concurrent
/// writers race and the last rename wins.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
    path: PathBuf,
}

impl DatasetStore {
    /// Create a store from `config`. Nothing is touched on disk.
    pub fn new(config: StoreConfig) -> Self {
        let path = config.dir.join(&config.file_name);
        Self {
            dir: config.dir,
            path,
        }
    }

    /// Whether the cache artifact is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Time since the cached dataset was fetched.
    ///
    /// Returns `None` if the artifact is absent or unreadable.
    pub fn age(&self) -> Option<Duration> {
        self.read().ok().map(|index| age_since(index.fetched_at()))
    }

    /// Load the cached dataset.
    pub fn read(&self) -> Result<DatasetIndex, StoreError> {
        let bytes = fs::read(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })?;

        let cached: CachedDataset =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        if cached.version != FORMAT_VERSION {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                message: format!(
                    "unsupported format version {} (expected {})",
                    cached.version, FORMAT_VERSION
                ),
            });
        }

        let index = DatasetIndex::from_records(cached.records, cached.fetched_at);
        debug!(path = %self.path.display(), records = index.len(), "read dataset cache");
        Ok(index)
    }

    /// Persist a dataset, replacing any existing artifact.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn write(&self, index: &DatasetIndex) -> Result<(), StoreError> {
        let mut records: Vec<ZipRecord> = index.records().cloned().collect();
        records.sort_by_key(|r| r.zip_code);

        let cached = CachedDataset {
            version: FORMAT_VERSION,
            fetched_at: index.fetched_at(),
            records,
        };

        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| self.write_error(format!("failed to create cache directory: {e}")))?;
        }

        let tmp = NamedTempFile::new_in(self.tmp_dir())
            .map_err(|e| self.write_error(format!("failed to create temporary file: {e}")))?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &cached)
                .map_err(|e| self.write_error(format!("failed to serialize dataset: {e}")))?;
            writer
                .flush()
                .map_err(|e| self.write_error(format!("failed to flush dataset: {e}")))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|e| self.write_error(format!("failed to sync dataset: {e}")))?;

        // Dropping a failed `PersistError` removes the temporary file.
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(format!("failed to replace cache file: {}", e.error)))?;

        debug!(path = %self.path.display(), records = index.len(), "wrote dataset cache");
        Ok(())
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the cache artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_dir(&self) -> &Path {
        if self.dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.dir
        }
    }

    fn write_error(&self, message: String) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZipCode;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(code: &str, city: &str, canton: &str) -> ZipRecord {
        ZipRecord {
            zip_code: ZipCode::parse(code).unwrap(),
            city: city.to_string(),
            extra_digit: 0,
            commune: city.to_string(),
            commune_id: 261,
            canton: canton.to_string(),
            east: 2_683_000.0,
            north: 1_247_000.0,
        }
    }

    fn sample_index(fetched_at: DateTime<Utc>) -> DatasetIndex {
        DatasetIndex::from_records(
            vec![
                record("8001", "Zürich", "ZH"),
                record("3011", "Bern", "BE"),
                record("1200", "Genève", "GE"),
            ],
            fetched_at,
        )
    }

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();
        let index = sample_index(fetched_at);

        store.write(&index).unwrap();
        let loaded = store.read().unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.fetched_at(), fetched_at);
    }

    #[test]
    fn roundtrip_keeps_subsecond_timestamp() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        let index = sample_index(Utc::now());

        store.write(&index).unwrap();
        assert_eq!(store.read().unwrap().fetched_at(), index.fetched_at());
    }

    #[test]
    fn missing_cache() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));

        assert!(!store.exists());
        assert!(store.age().is_none());
        assert!(matches!(store.read(), Err(StoreError::Open { .. })));
    }

    #[test]
    fn corrupt_cache_is_detected() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        fs::write(store.path(), b"{\"version\":1,\"fetched_at\":").unwrap();

        assert!(store.exists());
        assert!(store.age().is_none());
        assert!(matches!(store.read(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        fs::write(
            store.path(),
            br#"{"version":99,"fetched_at":"2024-03-15T10:00:00Z","records":[]}"#,
        )
        .unwrap();

        let err = store.read().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.to_string().contains("unsupported format version 99"));
    }

    #[test]
    fn invalid_zip_code_in_cache_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        fs::write(
            store.path(),
            br#"{"version":1,"fetched_at":"2024-03-15T10:00:00Z","records":[{"zipCode":12,"city":"X","extraDigit":0,"commune":"X","communeId":1,"canton":"ZH","east":0.0,"north":0.0}]}"#,
        )
        .unwrap();

        assert!(matches!(store.read(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn age_reflects_embedded_timestamp() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));
        let fetched_at = Utc::now() - chrono::Duration::days(40);
        store.write(&sample_index(fetched_at)).unwrap();

        let age = store.age().unwrap();
        assert!(age >= Duration::from_secs(40 * 24 * 60 * 60));
        assert!(age < Duration::from_secs(41 * 24 * 60 * 60));
    }

    #[test]
    fn future_timestamp_has_zero_age() {
        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(age_since(future), Duration::ZERO);
    }

    #[test]
    fn creates_cache_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("cache");
        let store = DatasetStore::new(StoreConfig::new(&nested));

        store.write(&sample_index(Utc::now())).unwrap();
        assert!(store.exists());
        assert_eq!(store.path(), nested.join(CACHE_FILE_NAME));
    }

    #[test]
    fn overwrite_leaves_no_temporary_files() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(StoreConfig::new(dir.path()));

        store.write(&sample_index(Utc::now())).unwrap();
        store.write(&sample_index(Utc::now())).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unwritable_directory_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let store = DatasetStore::new(StoreConfig::new(&blocker));

        let err = store.write(&sample_index(Utc::now())).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn custom_file_name() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path()).with_file_name("plz.json");
        let store = DatasetStore::new(config);

        store.write(&sample_index(Utc::now())).unwrap();
        assert_eq!(store.path(), dir.path().join("plz.json"));
        assert!(!dir.path().join(CACHE_FILE_NAME).exists());
        assert_eq!(store.read().unwrap().len(), 3);
    }

    #[test]
    fn default_config_uses_standard_file_name() {
        let config = StoreConfig::default();
        assert_eq!(config.file_name, CACHE_FILE_NAME);
        assert_eq!(config.dir, std::env::temp_dir());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn coordinates_survive_roundtrip(
                east in -1.0e7f64..1.0e7,
                north in -1.0e7f64..1.0e7,
            ) {
                let dir = tempdir().unwrap();
                let store = DatasetStore::new(StoreConfig::new(dir.path()));
                let mut zurich = record("8001", "Zürich", "ZH");
                zurich.east = east;
                zurich.north = north;
                let index = DatasetIndex::from_records(vec![zurich], Utc::now());

                store.write(&index).unwrap();
                let loaded = store.read().unwrap();
                let read_back = loaded.get(ZipCode::parse("8001").unwrap()).unwrap();

                prop_assert_eq!(read_back.east.to_bits(), east.to_bits());
                prop_assert_eq!(read_back.north.to_bits(), north.to_bits());
            }
        }
    }
}
