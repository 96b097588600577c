//! Structured CSV adapter.
//!
//! Header-driven extraction: named columns supply the host, optional port,
//! and an optional region hint directly, with no regex involved.

use tracing::{debug, warn};

use ipcatalog_shared::{Address, Candidate, SourceConfig};

use super::{Extraction, SourceAdapter};
use crate::filter::RegionFilter;
use crate::scan::parse_host;

/// Column aliases accepted for the host field.
const HOST_COLUMNS: &[&str] = &["host"];
/// Column aliases accepted for the region hint, most specific label first.
const REGION_COLUMNS: &[&str] = &["country", "region", "city"];
/// Column aliases accepted for the owner hint.
const OWNER_COLUMNS: &[&str] = &["owner", "isp", "org"];

/// Extracts addresses from delimited records with a header row.
pub struct CsvAdapter;

impl SourceAdapter for CsvAdapter {
    fn extract(&self, raw: &str, source: &SourceConfig) -> Extraction {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                warn!(url = %source.url, error = %e, "unreadable CSV header, skipping source");
                return Extraction::default();
            }
        };

        let Some(host_col) = find_column(&headers, HOST_COLUMNS) else {
            warn!(url = %source.url, "CSV has no host column, skipping source");
            return Extraction::default();
        };
        let port_col = find_column(&headers, &["port"]);
        let region_col = find_column(&headers, REGION_COLUMNS);
        let owner_col = find_column(&headers, OWNER_COLUMNS);

        let mut filter = RegionFilter::from_source(source);
        let mut candidates = Vec::new();

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!(url = %source.url, error = %e, "skipping malformed CSV record");
                    continue;
                }
            };

            // The filter sees the whole record text, like an unstructured row.
            let matched = match &filter {
                Some(f) => {
                    let row_text = record.iter().collect::<Vec<_>>().join(" ");
                    match f.match_row(&row_text) {
                        Some(code) => Some(code),
                        None => continue,
                    }
                }
                None => None,
            };

            let Some(address) = parse_record_address(&record, host_col, port_col) else {
                continue;
            };

            if let (Some(f), Some(code)) = (filter.as_mut(), matched.as_deref()) {
                if !f.try_take(code, address) {
                    continue;
                }
            }

            // A structured region column beats the filter keyword as the
            // declared label.
            let region_hint = region_col
                .and_then(|col| non_empty(record.get(col)))
                .or(matched);

            candidates.push(Candidate {
                address,
                region_hint,
                owner_hint: owner_col.and_then(|col| non_empty(record.get(col))),
            });
        }

        Extraction {
            candidates,
            region_tallies: filter.map(RegionFilter::into_tallies).unwrap_or_default(),
        }
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// First header matching one of the aliases, case-insensitively.
fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the address from the host (CIDR-normalized) and port columns.
/// Returns `None` for records that do not parse — skipped, never fatal.
fn parse_record_address(
    record: &csv::StringRecord,
    host_col: usize,
    port_col: Option<usize>,
) -> Option<Address> {
    let host = parse_host(record.get(host_col)?)?;

    match port_col.and_then(|col| non_empty(record.get(col))) {
        Some(port) => {
            let port = port.parse::<u16>().ok()?;
            Some(Address::with_port(host, port))
        }
        None => Some(Address::host_only(host)),
    }
}
