//! Region grouping, sequence numbering, and atomic catalog writing.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, instrument};

use ipcatalog_shared::{
    Address, CatalogEntry, IpCatalogError, Record, RegionGroup, Result, UNRESOLVED_REGION,
};

use crate::FIELD_SEPARATOR;

/// Entry ordering within a region group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressOrder {
    /// Lexicographic by the address display form.
    #[default]
    Lexicographic,
    /// Port-qualified addresses first, then lexicographic.
    PortFirst,
}

/// Partition the resolved mapping into region groups.
///
/// Regions sort lexicographically; entries sort by the configured key and
/// receive fresh, contiguous 1-based sequence numbers. Records with an empty
/// region land in the [`UNRESOLVED_REGION`] group — failed lookups are still
/// written, completeness over correctness.
pub fn finalize(records: &BTreeMap<Address, Record>, order: AddressOrder) -> Vec<RegionGroup> {
    let mut by_region: BTreeMap<String, Vec<(Address, Record)>> = BTreeMap::new();

    for (address, record) in records {
        let region = if record.is_unresolved() {
            UNRESOLVED_REGION.to_string()
        } else {
            record.region.clone()
        };
        by_region
            .entry(region)
            .or_default()
            .push((*address, record.clone()));
    }

    by_region
        .into_iter()
        .map(|(region, mut members)| {
            members.sort_by(|(a, _), (b, _)| sort_key(a, order).cmp(&sort_key(b, order)));

            let entries = members
                .into_iter()
                .enumerate()
                .map(|(i, (address, record))| CatalogEntry {
                    address,
                    record,
                    seq: i + 1,
                })
                .collect();

            RegionGroup { region, entries }
        })
        .collect()
}

fn sort_key(address: &Address, order: AddressOrder) -> (bool, String) {
    match order {
        AddressOrder::Lexicographic => (false, address.to_string()),
        AddressOrder::PortFirst => (address.port.is_none(), address.to_string()),
    }
}

/// Serialize region groups into the persisted catalog format.
///
/// Exactly what [`crate::cache::parse_cache`] reads back: one
/// `<address>#<region>-<seq>#<owner>` line per entry, one blank line after
/// each region group.
pub fn serialize(groups: &[RegionGroup]) -> String {
    let mut out = String::new();

    for group in groups {
        for entry in &group.entries {
            out.push_str(&format!(
                "{}{sep}{}-{}{sep}{}\n",
                entry.address,
                group.region,
                entry.seq,
                entry.record.owner,
                sep = FIELD_SEPARATOR,
            ));
        }
        out.push('\n');
    }

    out
}

/// Write the catalog with a whole-file replace.
///
/// The content lands in a sibling temp file first and is renamed over the
/// target, so a crash mid-write cannot corrupt the previous catalog.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_catalog(path: &Path, groups: &[RegionGroup]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| IpCatalogError::io(parent, e))?;
        }
    }

    let content = serialize(groups);
    let tmp = path.with_extension("tmp");

    std::fs::write(&tmp, &content).map_err(|e| IpCatalogError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| IpCatalogError::io(path, e))?;

    let entries: usize = groups.iter().map(|g| g.entries.len()).sum();
    info!(regions = groups.len(), entries, "catalog written");

    Ok(())
}
