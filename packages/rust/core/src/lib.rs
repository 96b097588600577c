//! Core pipeline orchestration and merge semantics for ipcatalog.
//!
//! This crate ties together source extraction, the cache store, and
//! geolocation enrichment into the end-to-end `run` workflow, and owns the
//! precedence policy applied when the same address is seen more than once.

pub mod aggregate;
pub mod pipeline;

pub use aggregate::{DeclaredHint, MergeOutcome, merge, resolve_record};
pub use pipeline::{ProgressReporter, RunConfig, RunSummary, SilentProgress, run};
