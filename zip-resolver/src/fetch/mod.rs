//! Fetching the authoritative zip code dataset.
//!
//! The swisstopo locality directory is published as a zip archive holding
//! a single semicolon-separated CSV file. A fetch downloads the archive to
//! a staging file, extracts the CSV member and parses it into a
//! [`DatasetIndex`](crate::domain::DatasetIndex).

mod archive;
mod client;
mod error;
mod parse;

pub use archive::{dataset_from_archive, extract_member};
pub use client::{
    DEFAULT_DATA_URL, DEFAULT_MEMBER, DEFAULT_TIMEOUT_SECS, Fetcher, FetcherConfig, HttpFetcher,
};
pub use error::FetchError;
pub use parse::{COLUMN_COUNT, FetchedDataset, ParseWarning, parse_dataset, parse_records};
