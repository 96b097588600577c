//! Plain-text adapter for raw lists and JSON-ish bodies.

use ipcatalog_shared::SourceConfig;

use super::{Extraction, SourceAdapter, extract_rows};

/// Scans the payload line by line.
pub struct PlainTextAdapter;

impl SourceAdapter for PlainTextAdapter {
    fn extract(&self, raw: &str, source: &SourceConfig) -> Extraction {
        extract_rows(raw.lines().map(str::to_string), source)
    }

    fn name(&self) -> &'static str {
        "plain-text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipcatalog_shared::SourceKind;

    #[test]
    fn extracts_from_lines() {
        let body = "104.16.1.1\n172.64.2.3\n\nnot an address\n5.6.7.8/24\n";
        let source = SourceConfig::new("https://example.com/list", SourceKind::PlainText);
        let extraction = PlainTextAdapter.extract(body, &source);

        let found: Vec<String> = extraction
            .candidates
            .iter()
            .map(|c| c.address.to_string())
            .collect();
        assert_eq!(found, vec!["104.16.1.1", "172.64.2.3", "5.6.7.8"]);
    }

    #[test]
    fn json_bodies_scan_the_same_way() {
        let body = r#"{"ips":["104.16.1.1","172.64.2.3"]}"#;
        let source = SourceConfig::new("https://example.com/api", SourceKind::PlainText);
        let extraction = PlainTextAdapter.extract(body, &source);
        assert_eq!(extraction.candidates.len(), 2);
    }

    #[test]
    fn line_filter_caps_contributions() {
        let body = "singapore 1.1.1.1\nsingapore 2.2.2.2\nsingapore 3.3.3.3\njapan 4.4.4.4\n";
        let mut source = SourceConfig::new("https://example.com/list", SourceKind::PlainText);
        source.regions = vec!["sg".into()];
        source.per_region_cap = 2;

        let extraction = PlainTextAdapter.extract(body, &source);
        assert_eq!(extraction.candidates.len(), 2);
        assert!(extraction.candidates.iter().all(|c| c.region_hint.as_deref() == Some("SG")));
        assert_eq!(extraction.region_tallies.get("SG"), Some(&2));
    }
}
