//! HTTP fetcher for the official zip code directory.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::archive::dataset_from_archive;
use super::error::FetchError;
use super::parse::FetchedDataset;

/// Default location of the swisstopo locality directory archive.
pub const DEFAULT_DATA_URL: &str =
    "http://data.geo.admin.ch/ch.swisstopo-vd.ortschaftenverzeichnis_plz/PLZO_CSV_LV03.zip";

/// Default path of the CSV file inside the archive.
pub const DEFAULT_MEMBER: &str = "PLZO_CSV_LV03/PLZO_CSV_LV03.csv";

/// Request timeout used when none (or zero) is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prefix of staging files holding a downloaded archive.
const STAGING_PREFIX: &str = "plzo-";

/// Source of fresh datasets.
///
/// The resolver only depends on this trait, so tests can substitute a
/// fetcher that never touches the network.
pub trait Fetcher {
    /// Produce a freshly parsed dataset stamped with the current time.
    fn fetch(&self) -> impl Future<Output = Result<FetchedDataset, FetchError>> + Send;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// URL of the zip archive
    pub url: String,
    /// Path of the CSV member inside the archive
    pub member: String,
    /// Request timeout in seconds, covering connect and body transfer.
    /// Zero falls back to [`DEFAULT_TIMEOUT_SECS`].
    pub timeout_secs: u64,
    /// Directory for the staging file; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

impl FetcherConfig {
    /// Create a config pointing at the given archive URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the archive member to extract.
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = member.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Stage downloads in `dir` instead of the system temp dir.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATA_URL.to_string(),
            member: DEFAULT_MEMBER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            staging_dir: None,
        }
    }
}

/// Downloads the archive over HTTP and parses it.
///
/// The archive is staged in a temporary file that is removed when the
/// fetch finishes, whether it succeeds or not.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    url: String,
    member: String,
    staging_dir: Option<PathBuf>,
}

/// A zero timeout would fail every request, so it means "use the default".
fn effective_timeout(secs: u64) -> Duration {
    if secs == 0 {
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    } else {
        Duration::from_secs(secs)
    }
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(effective_timeout(config.timeout_secs))
            .build()
            .map_err(|source| FetchError::Connect {
                url: config.url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            url: config.url,
            member: config.member,
            staging_dir: config.staging_dir,
        })
    }

    /// Stream the archive into a staging file.
    async fn download(&self) -> Result<NamedTempFile, FetchError> {
        let connect_error = |source| FetchError::Connect {
            url: self.url.clone(),
            source,
        };

        let mut response = self.http.get(&self.url).send().await.map_err(connect_error)?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(".zip");
        let staged = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut staging = staged.map_err(|e| FetchError::Staging {
                message: e.to_string(),
            })?;

        let mut size = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(connect_error)? {
            size += chunk.len();
            staging.write_all(&chunk).map_err(|e| FetchError::Staging {
                message: e.to_string(),
            })?;
        }
        staging.flush().map_err(|e| FetchError::Staging {
            message: e.to_string(),
        })?;

        debug!(bytes = size, path = %staging.path().display(), "downloaded archive");
        Ok(staging)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<FetchedDataset, FetchError> {
        info!(url = %self.url, "fetching zip code dataset");
        let staging = self.download().await?;

        // Extraction and parsing are blocking; the staging file is dropped
        // (and removed) inside the task.
        let member = self.member.clone();
        let dataset = tokio::task::spawn_blocking(move || {
            let file = staging.reopen().map_err(|e| FetchError::Extract {
                member: member.clone(),
                message: format!("failed to reopen staged archive: {e}"),
            })?;
            dataset_from_archive(file, &member, Utc::now())
        })
        .await
        .map_err(|e| FetchError::Extract {
            member: self.member.clone(),
            message: format!("extraction task failed: {e}"),
        })??;

        info!(
            records = dataset.index.len(),
            skipped = dataset.warnings.len(),
            "fetched zip code dataset"
        );
        Ok(dataset)
    }
}
