//! On-disk cache of the parsed zip code dataset.
//!
//! Pure state management: existence and age checks, atomic writes and
//! validated reads. No network access happens here.

mod cache;
mod error;

pub use cache::{CACHE_FILE_NAME, DatasetStore, StoreConfig, age_since};
pub use error::StoreError;
