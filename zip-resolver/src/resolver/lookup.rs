//! Cache-backed zip code resolver.
//!
//! A resolver starts out unloaded. The first lookup loads the dataset:
//!
//! - no usable cache: fetch, persist, serve; any failure is returned
//! - fresh cache and no forced reload: serve the cache without network I/O
//! - stale cache or forced reload: fetch and persist; if the fetch fails
//!   the stale cache is served instead
//!
//! Once loaded, lookups are answered from memory until a forced reload is
//! requested again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::{OutputFormat, ResolverConfig};
use super::error::ResolveError;
use super::result::{LookupResult, Output};
use crate::domain::{DatasetIndex, ZipCode};
use crate::fetch::{Fetcher, FetcherConfig, HttpFetcher, ParseWarning};
use crate::store::{DatasetStore, StoreConfig, age_since};

/// Loading state of a resolver.
#[derive(Debug)]
enum State {
    Unloaded,
    Loaded(DatasetIndex),
}

impl State {
    fn index(&self) -> Option<&DatasetIndex> {
        match self {
            State::Unloaded => None,
            State::Loaded(index) => Some(index),
        }
    }
}

/// Resolves Swiss zip codes against a locally cached copy of the official
/// locality directory.
///
/// Lookups take `&mut self`: one resolver serves one caller at a time.
pub struct Resolver<F = HttpFetcher> {
    config: ResolverConfig,
    store: DatasetStore,
    fetcher: F,
    state: State,
    warnings: Vec<ParseWarning>,
}

impl Resolver<HttpFetcher> {
    /// Create a resolver that downloads from the default swisstopo URL.
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        Self::with_fetcher_config(config, FetcherConfig::default())
    }

    /// Create a resolver with a custom HTTP fetcher configuration.
    pub fn with_fetcher_config(
        config: ResolverConfig,
        fetcher_config: FetcherConfig,
    ) -> Result<Self, ResolveError> {
        let fetcher = HttpFetcher::new(fetcher_config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> Resolver<F> {
    /// Create a resolver around any dataset source.
    pub fn with_fetcher(config: ResolverConfig, fetcher: F) -> Self {
        let store = DatasetStore::new(StoreConfig::new(&config.cache_dir));
        Self {
            config,
            store,
            fetcher,
            state: State::Unloaded,
            warnings: Vec::new(),
        }
    }

    /// Look up a zip code.
    ///
    /// An unknown code is a negative result, never an error. Other failures
    /// are folded into the result unless `throw_exceptions` is set.
    pub async fn lookup(&mut self, zip_code: u32) -> Result<LookupResult, ResolveError> {
        match self.try_lookup(zip_code).await {
            Ok(result) => Ok(result),
            Err(e) if self.config.throw_exceptions => Err(e),
            Err(e) => {
                debug!(zip_code, error = %e, "lookup failed");
                Ok(LookupResult::failed(zip_code, e.kind(), e.to_string()))
            }
        }
    }

    /// Look up a zip code and encode the result in the configured format.
    pub async fn lookup_encoded(&mut self, zip_code: u32) -> Result<Output, ResolveError> {
        let result = self.lookup(zip_code).await?;
        Ok(result.encode(self.config.output_format)?)
    }

    /// Whether `zip_code` is a known Swiss zip code.
    ///
    /// Errors only surface when `throw_exceptions` is set; otherwise a
    /// failed load reports `false`.
    pub async fn is_valid(&mut self, zip_code: u32) -> Result<bool, ResolveError> {
        Ok(self.lookup(zip_code).await?.valid_zip_code)
    }

    async fn try_lookup(&mut self, zip_code: u32) -> Result<LookupResult, ResolveError> {
        self.ensure_loaded().await?;

        let record = ZipCode::try_from(zip_code)
            .ok()
            .zip(self.state.index())
            .and_then(|(zip, index)| index.get(zip));

        Ok(match record {
            Some(record) => LookupResult::found(record),
            None => LookupResult::not_found(zip_code, !self.config.throw_exceptions),
        })
    }

    async fn ensure_loaded(&mut self) -> Result<(), ResolveError> {
        if let State::Unloaded = self.state {
            let index = self.load().await?;
            self.state = State::Loaded(index);
        }
        Ok(())
    }

    /// Produce the dataset according to the cache state.
    async fn load(&mut self) -> Result<DatasetIndex, ResolveError> {
        let cached = if self.store.exists() {
            match self.store.read() {
                Ok(index) => Some(index),
                Err(e) => {
                    warn!(error = %e, "ignoring unusable dataset cache");
                    None
                }
            }
        } else {
            None
        };

        let Some(cached) = cached else {
            info!(path = %self.store.path().display(), "no dataset cache, fetching");
            return self.refresh().await;
        };

        let age = age_since(cached.fetched_at());
        let stale = age > self.config.cache_ttl;
        if !stale && !self.config.force_reload {
            debug!(age_secs = age.as_secs(), records = cached.len(), "using cached dataset");
            return Ok(cached);
        }

        info!(
            age_secs = age.as_secs(),
            stale,
            forced = self.config.force_reload,
            "refreshing dataset"
        );
        match self.fetcher.fetch().await {
            Ok(dataset) => {
                self.store.write(&dataset.index)?;
                self.warnings = dataset.warnings;
                Ok(dataset.index)
            }
            Err(e) => {
                warn!(error = %e, "dataset refresh failed, serving stale cache");
                Ok(cached)
            }
        }
    }

    /// Fetch and persist with no fallback.
    async fn refresh(&mut self) -> Result<DatasetIndex, ResolveError> {
        let dataset = self.fetcher.fetch().await?;
        self.store.write(&dataset.index)?;
        self.warnings = dataset.warnings;
        Ok(dataset.index)
    }

    /// Whether the dataset is in memory.
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded(_))
    }

    /// The in-memory dataset, once loaded.
    pub fn index(&self) -> Option<&DatasetIndex> {
        self.state.index()
    }

    /// Rows skipped by the most recent successful fetch.
    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) -> &mut Self {
        self.config.output_format = format;
        self
    }

    pub fn throw_exceptions(&self) -> bool {
        self.config.throw_exceptions
    }

    pub fn set_throw_exceptions(&mut self, throw: bool) -> &mut Self {
        self.config.throw_exceptions = throw;
        self
    }

    pub fn force_reload(&self) -> bool {
        self.config.force_reload
    }

    /// Request a refresh regardless of cache age.
    ///
    /// Setting the flag returns a loaded resolver to the unloaded state, so
    /// the next lookup refreshes.
    pub fn set_force_reload(&mut self, force: bool) -> &mut Self {
        self.config.force_reload = force;
        if force {
            self.state = State::Unloaded;
        }
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Point the resolver at another cache directory.
    ///
    /// `None` selects the system temporary directory. A dataset already in
    /// memory stays in use.
    pub fn set_cache_dir(&mut self, dir: Option<PathBuf>) -> &mut Self {
        self.config.cache_dir = dir.unwrap_or_else(std::env::temp_dir);
        self.store = DatasetStore::new(StoreConfig::new(&self.config.cache_dir));
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        self.config.cache_ttl
    }

    pub fn set_cache_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Access the underlying dataset source.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
