//! Persisted catalog format: loading, grouping, and atomic writing.
//!
//! The catalog file is both the run's final output and the next run's cache
//! input, so [`cache`] and [`writer`] share one symmetric line format:
//!
//! ```text
//! <address>#<region>-<sequence>#<owner>
//! ```
//!
//! with a blank line separating region groups.

pub mod cache;
pub mod writer;

pub use cache::{load_cache, parse_cache};
pub use writer::{AddressOrder, finalize, serialize, write_catalog};

/// Field separator of the catalog line format.
pub(crate) const FIELD_SEPARATOR: char = '#';
