//! Resolver configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default cache lifetime: 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Shape in which [`Resolver::lookup_encoded`](super::Resolver::lookup_encoded)
/// returns results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The structured [`LookupResult`](super::LookupResult) itself.
    #[default]
    Raw,
    /// Field name/value pairs in fixed field order.
    Array,
    /// A JSON object string.
    Json,
    /// A PHP `serialize()` array string.
    Serialize,
    /// An XML document string.
    Xml,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Raw => "object",
            OutputFormat::Array => "array",
            OutputFormat::Json => "json",
            OutputFormat::Serialize => "serialize",
            OutputFormat::Xml => "xml",
        }
    }
}

/// Error returned when parsing an unknown output format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format {0:?} (expected object, array, json, serialize or xml)")]
pub struct UnknownOutputFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "object" | "raw" => Ok(OutputFormat::Raw),
            "array" => Ok(OutputFormat::Array),
            "json" => Ok(OutputFormat::Json),
            "serialize" => Ok(OutputFormat::Serialize),
            "xml" => Ok(OutputFormat::Xml),
            _ => Err(UnknownOutputFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a [`Resolver`](super::Resolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Encoding used by `lookup_encoded`.
    pub output_format: OutputFormat,

    /// Return failures as errors instead of folding them into the result.
    pub throw_exceptions: bool,

    /// Directory holding the cache artifact.
    pub cache_dir: PathBuf,

    /// Age after which the cached dataset is refreshed.
    pub cache_ttl: Duration,

    /// Refresh on the next load even if the cache is fresh.
    pub force_reload: bool,
}

impl ResolverConfig {
    /// Create a config with the given output format and cache directory.
    ///
    /// `None` selects the system temporary directory.
    pub fn new(output_format: OutputFormat, cache_dir: Option<PathBuf>) -> Self {
        Self {
            output_format,
            cache_dir: cache_dir.unwrap_or_else(std::env::temp_dir),
            ..Self::default()
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_throw_exceptions(mut self, throw: bool) -> Self {
        self.throw_exceptions = throw;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Raw,
            throw_exceptions: false,
            cache_dir: std::env::temp_dir(),
            cache_ttl: DEFAULT_CACHE_TTL,
            force_reload: false,
        }
    }
}
