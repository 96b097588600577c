//! Per-source region filtering and quotas.

use std::collections::{BTreeMap, BTreeSet};

use ipcatalog_shared::{Address, SourceConfig, region_display_name};

/// Gates extraction to rows mentioning one of the configured target regions
/// and caps how many unique addresses the source contributes per region.
///
/// A row matches a region when its text contains the two-letter code as a
/// standalone token, or the localized display name anywhere,
/// case-insensitively.
#[derive(Debug)]
pub struct RegionFilter {
    keywords: Vec<RegionKeyword>,
    /// Per-region cap on contributed unique addresses; 0 means unbounded.
    cap: usize,
    taken: BTreeMap<String, BTreeSet<Address>>,
}

#[derive(Debug)]
struct RegionKeyword {
    /// Lowercased region code, e.g. "sg".
    code: String,
    display: Option<&'static str>,
}

impl RegionFilter {
    /// Build the filter for a source, or `None` if the source is unfiltered.
    pub fn from_source(source: &SourceConfig) -> Option<Self> {
        if source.regions.is_empty() {
            return None;
        }

        let keywords = source
            .regions
            .iter()
            .map(|code| {
                let code = code.trim().to_ascii_lowercase();
                let display = region_display_name(&code);
                RegionKeyword { code, display }
            })
            .filter(|kw| !kw.code.is_empty())
            .collect();

        Some(Self {
            keywords,
            cap: source.per_region_cap,
            taken: BTreeMap::new(),
        })
    }

    /// First configured region whose code or display name appears in the row
    /// text. Returns the uppercased code used as the declared region hint.
    pub fn match_row(&self, row_text: &str) -> Option<String> {
        let lower = row_text.to_lowercase();
        self.keywords
            .iter()
            .find(|kw| {
                contains_token(&lower, &kw.code)
                    || kw.display.is_some_and(|name| lower.contains(name))
            })
            .map(|kw| kw.code.to_uppercase())
    }

    /// Account `address` toward `code`'s quota. An address already counted
    /// for that region passes again without consuming a slot, so repeated
    /// extractions of one address can neither exhaust the cap nor inflate
    /// the tally. Returns `false` once the cap is spent on unique addresses.
    pub fn try_take(&mut self, code: &str, address: Address) -> bool {
        let taken = self.taken.entry(code.to_string()).or_default();
        if taken.contains(&address) {
            return true;
        }
        if self.cap > 0 && taken.len() >= self.cap {
            return false;
        }
        taken.insert(address);
        true
    }

    /// Per-region tally of unique contributed addresses.
    pub fn into_tallies(self) -> BTreeMap<String, usize> {
        self.taken
            .into_iter()
            .map(|(code, addresses)| (code, addresses.len()))
            .collect()
    }
}

/// Whether `text` contains `token` with no alphanumeric neighbor on either
/// side, so a two-letter code like "us" cannot match inside an unrelated
/// word.
fn contains_token(text: &str, token: &str) -> bool {
    !token.is_empty()
        && text.match_indices(token).any(|(begin, _)| {
            let bytes = text.as_bytes();
            let end = begin + token.len();
            (begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric())
                && (end >= bytes.len() || !bytes[end].is_ascii_alphanumeric())
        })
}
