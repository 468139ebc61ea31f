//! Dataset fetch error types.

/// Errors that can occur while fetching and parsing the remote dataset.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure, timeout, or HTTP client setup failure
    #[error("could not download {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("server returned HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    /// The download could not be written to its staging file
    #[error("could not stage download: {message}")]
    Staging { message: String },

    /// Archive unreadable or expected member missing
    #[error("could not extract {member}: {message}")]
    Extract { member: String, message: String },

    /// The CSV produced no usable rows
    #[error("dataset contains no valid rows ({skipped} rows skipped)")]
    EmptyDataset { skipped: usize },
}
