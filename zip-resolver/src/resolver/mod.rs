//! Zip code lookups with staleness-driven refresh.
//!
//! [`Resolver`] is the single entry point: it consults the on-disk cache,
//! refreshes it from the remote source when it is missing or stale, and
//! answers lookups from memory.

mod config;
mod error;
mod lookup;
mod result;


pub use config::{DEFAULT_CACHE_TTL, OutputFormat, ResolverConfig, UnknownOutputFormat};
pub use error::{ErrorKind, ResolveError};
pub use lookup::Resolver;
pub use result::{LookupResult, Output};
