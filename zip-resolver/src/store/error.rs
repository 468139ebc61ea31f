//! Cache store error types.

use std::path::PathBuf;

/// Errors from reading or writing the on-disk dataset cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The cache file could not be opened or read
    #[error("could not open cache file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not hold a valid dataset
    #[error("cache file {} is corrupt: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    /// The cache file could not be written
    #[error("could not write cache file {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Corrupt {
            path: PathBuf::from("/tmp/cache.json"),
            message: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "cache file /tmp/cache.json is corrupt: expected value"
        );

        let err = StoreError::Write {
            path: PathBuf::from("/tmp/cache.json"),
            message: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not write cache file /tmp/cache.json: disk full"
        );
    }
}
