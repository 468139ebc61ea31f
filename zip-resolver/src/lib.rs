//! Swiss zip code resolver.
//!
//! Resolves a Swiss postal code to its locality, municipality, canton and
//! grid coordinates using a locally cached copy of the official swisstopo
//! locality directory, refreshed from the remote source when it goes stale.

pub mod domain;
pub mod fetch;
pub mod resolver;
pub mod store;

pub use resolver::{LookupResult, Output, OutputFormat, Resolver, ResolverConfig};
