//! Catalog/cache file loader.
//!
//! Parses the persisted catalog of a previous run back into a mapping so
//! resolved addresses skip the rate-limited external lookup. Parsing is
//! line-local and lossy by design: a corrupt line is skipped, never fatal.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use ipcatalog_shared::{Address, IpCatalogError, Record, Result, UNKNOWN_OWNER};

use crate::FIELD_SEPARATOR;

/// Load the cache mapping from `path`. A missing file is an empty cache.
pub fn load_cache(path: &Path) -> Result<BTreeMap<Address, Record>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "no cache file, starting empty");
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(IpCatalogError::io(path, e)),
    };

    let cache = parse_cache(&content);
    info!(?path, entries = cache.len(), "cache loaded");
    Ok(cache)
}

/// Parse catalog-formatted content into a cache mapping.
pub fn parse_cache(content: &str) -> BTreeMap<Address, Record> {
    let mut cache = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((address, record)) => {
                cache.insert(address, record);
            }
            None => {
                warn!(line, "skipping unparseable cache line");
            }
        }
    }

    cache
}

/// Parse one `<address>#<region>[-<seq>][#<owner>]` line.
///
/// At most 3 fields are split off, so owners containing `#` stay intact.
/// A 2-field line defaults the owner. The stale sequence suffix is stripped
/// from the region, since numbering is recomputed every run.
fn parse_line(line: &str) -> Option<(Address, Record)> {
    let mut parts = line.splitn(3, FIELD_SEPARATOR);

    let address: Address = parts.next()?.trim().parse().ok()?;
    let region = strip_sequence_suffix(parts.next()?.trim());
    let owner = match parts.next().map(str::trim) {
        Some(owner) if !owner.is_empty() => owner,
        _ => UNKNOWN_OWNER,
    };

    Some((address, Record::cached(region, owner)))
}

/// Drop the `-<seq>` suffix appended by the writer.
///
/// Only a trailing `-<digits>` is stripped, so region labels that themselves
/// contain hyphens — including the lookup-failed sentinel — survive the
/// round trip intact.
fn strip_sequence_suffix(region: &str) -> &str {
    match region.rsplit_once('-') {
        Some((base, seq)) if !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()) => {
            base.trim_end()
        }
        _ => region,
    }
}
