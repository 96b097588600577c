//! Shared types, error model, and configuration for ipcatalog.
//!
//! This crate is the foundation depended on by all other ipcatalog crates.
//! It provides:
//! - [`IpCatalogError`] — the unified error type
//! - Domain types ([`Address`], [`Record`], [`Candidate`], [`RegionGroup`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EnrichmentConfig, FetchConfig, OutputConfig, SourceConfig,
    SourceKind, config_dir, config_file_path, default_sources, init_config, load_config,
    load_config_from, region_display_name,
};
pub use error::{IpCatalogError, Result};
pub use types::{
    Address, Candidate, CatalogEntry, LOOKUP_FAILED_REGION, Provenance, Record, RegionGroup,
    UNKNOWN_OWNER, UNRESOLVED_REGION,
};
