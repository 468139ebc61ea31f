//! Resolver error types.

use std::fmt;

use crate::fetch::FetchError;
use crate::store::StoreError;

/// Failure classes a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Remote source unreachable or answered with a non-success status
    Connect,
    /// Archive unreadable or CSV member missing
    Extract,
    /// Dataset rows unusable
    Parse,
    /// Cache file could not be opened
    Open,
    /// Cache file content is not a valid dataset
    Corrupt,
    /// Cache file could not be written
    Write,
    /// Well-formed lookup of an unknown zip code
    NotFound,
    /// Result could not be rendered in the selected output format
    Encode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Connect => "connect",
            ErrorKind::Extract => "extract",
            ErrorKind::Parse => "parse",
            ErrorKind::Open => "open",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::Write => "write",
            ErrorKind::NotFound => "not found",
            ErrorKind::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by [`Resolver`](super::Resolver) when it is configured
/// to throw.
///
/// An unknown zip code is never an error; it yields a negative result.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Fetch(e) => match e {
                FetchError::Connect { .. } | FetchError::Http { .. } | FetchError::Staging { .. } => {
                    ErrorKind::Connect
                }
                FetchError::Extract { .. } => ErrorKind::Extract,
                FetchError::EmptyDataset { .. } => ErrorKind::Parse,
            },
            ResolveError::Store(e) => match e {
                StoreError::Open { .. } => ErrorKind::Open,
                StoreError::Corrupt { .. } => ErrorKind::Corrupt,
                StoreError::Write { .. } => ErrorKind::Write,
            },
            ResolveError::Encode(_) => ErrorKind::Encode,
        }
    }
}
