//! Source fetching and address extraction.
//!
//! This crate provides:
//! - [`adapters`] — Extraction strategies (HTML table/list, plain text, CSV)
//!   behind the [`SourceAdapter`] trait, selected by source configuration
//! - [`SourceClient`] — Timeout-bounded HTTP fetching with per-source
//!   failure isolation
//! - [`RegionFilter`] — Keyword gating and per-region quotas

pub mod adapters;
mod fetch;
mod filter;
mod scan;

pub use adapters::{
    CsvAdapter, Extraction, HtmlListAdapter, HtmlTableAdapter, PlainTextAdapter, SourceAdapter,
    adapter_for,
};
pub use fetch::{FetchedSource, SourceClient, extract_from_source};
pub use filter::RegionFilter;
pub use scan::{parse_host, scan_addresses};
