//! Core domain types for the ipcatalog pipeline.

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::IpCatalogError;

/// Owner string used when a source or lookup supplies no ISP/organization.
pub const UNKNOWN_OWNER: &str = "unknown-owner";

/// Region label for addresses that resolved to no region at all.
pub const UNRESOLVED_REGION: &str = "unresolved";

/// Region label for addresses whose geolocation lookup failed.
pub const LOOKUP_FAILED_REGION: &str = "lookup-failed";

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A network endpoint: a dotted-quad host plus optional port.
///
/// `Address` is the unique key across the whole pipeline. The same host with
/// and without a port are two distinct catalog entries; identical (host, port)
/// pairs from different sources are one entity. CIDR-shaped inputs are
/// normalized to their base host by the extractors before an `Address` is
/// ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Base host of the endpoint.
    pub host: Ipv4Addr,
    /// Optional port qualifier.
    pub port: Option<u16>,
}

impl Address {
    /// Address for a bare host with no port qualifier.
    pub fn host_only(host: Ipv4Addr) -> Self {
        Self { host, port: None }
    }

    /// Port-qualified address.
    pub fn with_port(host: Ipv4Addr, port: u16) -> Self {
        Self {
            host,
            port: Some(port),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => write!(f, "{}", self.host),
        }
    }
}

impl FromStr for Address {
    type Err = IpCatalogError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((host, port)) => {
                let host = host
                    .parse::<Ipv4Addr>()
                    .map_err(|e| IpCatalogError::parse(format!("bad host '{host}': {e}")))?;
                let port = port
                    .parse::<u16>()
                    .map_err(|e| IpCatalogError::parse(format!("bad port '{port}': {e}")))?;
                Ok(Self::with_port(host, port))
            }
            None => {
                let host = s
                    .parse::<Ipv4Addr>()
                    .map_err(|e| IpCatalogError::parse(format!("bad host '{s}': {e}")))?;
                Ok(Self::host_only(host))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Which mechanism produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Reused verbatim from the persisted catalog of a previous run.
    Cache,
    /// Declared by a structured or region-filtered source.
    SourceDeclared,
    /// Resolved via the external geolocation provider.
    Lookup,
    /// The geolocation provider was unreachable or returned non-success.
    LookupFailed,
}

/// Resolved metadata for an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Free-text geographic label ("" means unresolved).
    pub region: String,
    /// ISP/organization string, or [`UNKNOWN_OWNER`].
    pub owner: String,
    /// Which mechanism produced this resolution.
    pub provenance: Provenance,
}

impl Record {
    /// Record reused from the persisted cache.
    pub fn cached(region: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            owner: owner.into(),
            provenance: Provenance::Cache,
        }
    }

    /// Record built from a source-declared hint.
    pub fn declared(region: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            region: region.into(),
            owner: owner.unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            provenance: Provenance::SourceDeclared,
        }
    }

    /// Record resolved by the enrichment provider.
    pub fn lookup(region: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            owner: owner.into(),
            provenance: Provenance::Lookup,
        }
    }

    /// Sentinel record for a failed enrichment lookup.
    pub fn lookup_failed() -> Self {
        Self {
            region: LOOKUP_FAILED_REGION.to_string(),
            owner: UNKNOWN_OWNER.to_string(),
            provenance: Provenance::LookupFailed,
        }
    }

    /// Whether the region label carries no information.
    pub fn is_unresolved(&self) -> bool {
        self.region.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One raw extraction result from a source, before aggregation.
///
/// A `Some` region hint marks a source-declared resolution, which takes
/// precedence over cache entries and lookups for that address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The extracted address.
    pub address: Address,
    /// Region declared by the source (structured column or filter match).
    pub region_hint: Option<String>,
    /// Owner declared by the source, if any.
    pub owner_hint: Option<String>,
}

impl Candidate {
    /// Candidate with no declared metadata.
    pub fn bare(address: Address) -> Self {
        Self {
            address,
            region_hint: None,
            owner_hint: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog output
// ---------------------------------------------------------------------------

/// A record placed into its final region group with a 1-based sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub address: Address,
    pub record: Record,
    /// Sequence number, contiguous 1..N within the region group.
    pub seq: usize,
}

/// One region group of the final catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionGroup {
    /// Resolved region label (never empty; sentinel labels substituted).
    pub region: String,
    /// Entries in display order, sequence numbers already assigned.
    pub entries: Vec<CatalogEntry>,
}
