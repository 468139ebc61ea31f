//! Domain types for the zip code resolver.
//!
//! Values here are validated at construction, so code receiving them can
//! trust that a `ZipCode` is a well-formed Swiss postal code.

mod record;
mod zip_code;

pub use record::{DatasetIndex, ZipRecord};
pub use zip_code::{InvalidZipCode, ZipCode};
