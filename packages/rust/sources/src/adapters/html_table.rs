//! HTML table adapter.
//!
//! For pages that publish their address list as table rows; scans the text
//! of each `<tr>` so the region filter sees one row at a time.

use scraper::{Html, Selector};

use ipcatalog_shared::SourceConfig;

use super::{Extraction, SourceAdapter, extract_rows};

/// Extracts addresses from `<tr>` rows.
pub struct HtmlTableAdapter;

impl SourceAdapter for HtmlTableAdapter {
    fn extract(&self, raw: &str, source: &SourceConfig) -> Extraction {
        let doc = Html::parse_document(raw);
        let row_sel = Selector::parse("tr").unwrap();

        let rows: Vec<String> = doc
            .select(&row_sel)
            .map(|el| el.text().collect::<String>())
            .collect();

        extract_rows(rows.into_iter(), source)
    }

    fn name(&self) -> &'static str {
        "html-table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipcatalog_shared::SourceKind;

    const PAGE: &str = r#"<html><body><table>
        <tr><th>Address</th><th>Location</th></tr>
        <tr><td>104.16.1.1</td><td>Singapore</td></tr>
        <tr><td>172.64.2.3:2053</td><td>Japan</td></tr>
        <tr><td>not an address</td><td>-</td></tr>
    </table></body></html>"#;

    #[test]
    fn extracts_one_candidate_per_row() {
        let source = SourceConfig::new("https://example.com/t.html", SourceKind::HtmlTable);
        let extraction = HtmlTableAdapter.extract(PAGE, &source);

        let found: Vec<String> = extraction
            .candidates
            .iter()
            .map(|c| c.address.to_string())
            .collect();
        assert_eq!(found, vec!["104.16.1.1", "172.64.2.3"]);
    }

    #[test]
    fn keep_port_retains_row_ports() {
        let mut source = SourceConfig::new("https://example.com/t.html", SourceKind::HtmlTable);
        source.keep_port = true;
        let extraction = HtmlTableAdapter.extract(PAGE, &source);

        let found: Vec<String> = extraction
            .candidates
            .iter()
            .map(|c| c.address.to_string())
            .collect();
        assert_eq!(found, vec!["104.16.1.1", "172.64.2.3:2053"]);
    }

    #[test]
    fn region_filter_gates_rows_and_hints() {
        let mut source = SourceConfig::new("https://example.com/t.html", SourceKind::HtmlTable);
        source.regions = vec!["sg".into()];
        let extraction = HtmlTableAdapter.extract(PAGE, &source);

        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].address.to_string(), "104.16.1.1");
        assert_eq!(extraction.candidates[0].region_hint.as_deref(), Some("SG"));
        assert_eq!(extraction.region_tallies.get("SG"), Some(&1));
    }
}
