//! Extraction strategies for the configured source kinds.
//!
//! Each adapter turns one raw payload into candidate addresses. The set is
//! closed and selected by the source's configured [`SourceKind`] — never by
//! inspecting the URL. `Auto` sources dispatch on the response Content-Type.

mod csv_table;
mod html_list;
mod html_table;
mod plain_text;

use std::collections::BTreeMap;

use ipcatalog_shared::{Candidate, SourceConfig, SourceKind};

pub use csv_table::CsvAdapter;
pub use html_list::HtmlListAdapter;
pub use html_table::HtmlTableAdapter;
pub use plain_text::PlainTextAdapter;

use crate::filter::RegionFilter;
use crate::scan::scan_addresses;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Extraction result for one source payload.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Candidate addresses in payload order.
    pub candidates: Vec<Candidate>,
    /// Per-region tally of filter-matched contributions (empty when the
    /// source is unfiltered).
    pub region_tallies: BTreeMap<String, usize>,
}

/// One extraction strategy.
///
/// Implementations must tolerate malformed fragments: skip the fragment,
/// never abort the payload.
pub trait SourceAdapter: Send + Sync {
    /// Extract candidate addresses from a raw payload.
    fn extract(&self, raw: &str, source: &SourceConfig) -> Extraction;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

static HTML_TABLE: HtmlTableAdapter = HtmlTableAdapter;
static HTML_LIST: HtmlListAdapter = HtmlListAdapter;
static PLAIN_TEXT: PlainTextAdapter = PlainTextAdapter;
static CSV: CsvAdapter = CsvAdapter;

/// Pick the adapter for a source. `Auto` falls back to the response
/// Content-Type: html → list elements, csv → structured records, anything
/// else → plain-text scan.
pub fn adapter_for(kind: SourceKind, content_type: &str) -> &'static dyn SourceAdapter {
    match kind {
        SourceKind::HtmlTable => &HTML_TABLE,
        SourceKind::HtmlList => &HTML_LIST,
        SourceKind::PlainText => &PLAIN_TEXT,
        SourceKind::Csv => &CSV,
        SourceKind::Auto => {
            let ct = content_type.to_ascii_lowercase();
            if ct.contains("html") {
                &HTML_LIST
            } else if ct.contains("csv") {
                &CSV
            } else {
                &PLAIN_TEXT
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared row scan
// ---------------------------------------------------------------------------

/// Scan row/line texts for addresses, applying the source's region filter
/// and per-region quota. Shared by every unstructured adapter.
pub(crate) fn extract_rows<I>(rows: I, source: &SourceConfig) -> Extraction
where
    I: Iterator<Item = String>,
{
    let mut filter = RegionFilter::from_source(source);
    let mut candidates = Vec::new();

    for row in rows {
        let hint = match &filter {
            Some(f) => match f.match_row(&row) {
                Some(code) => Some(code),
                None => continue,
            },
            None => None,
        };

        for address in scan_addresses(&row, source.keep_port) {
            if let (Some(f), Some(code)) = (filter.as_mut(), hint.as_deref()) {
                if !f.try_take(code, address) {
                    break;
                }
            }
            candidates.push(Candidate {
                address,
                region_hint: hint.clone(),
                owner_hint: None,
            });
        }
    }

    Extraction {
        candidates,
        region_tallies: filter.map(RegionFilter::into_tallies).unwrap_or_default(),
    }
}
