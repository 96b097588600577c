//! HTML list adapter — the fallback for HTML pages without a table layout.

use scraper::{Html, Selector};

use ipcatalog_shared::SourceConfig;

use super::{Extraction, SourceAdapter, extract_rows};

/// Extracts addresses from list/paragraph/div elements.
pub struct HtmlListAdapter;

impl SourceAdapter for HtmlListAdapter {
    fn extract(&self, raw: &str, source: &SourceConfig) -> Extraction {
        let doc = Html::parse_document(raw);
        let el_sel = Selector::parse("li, p, div").unwrap();

        // Nested containers repeat their inner text; the aggregator absorbs
        // the duplicate candidates.
        let rows: Vec<String> = doc
            .select(&el_sel)
            .map(|el| el.text().collect::<String>())
            .collect();

        extract_rows(rows.into_iter(), source)
    }

    fn name(&self) -> &'static str {
        "html-list"
    }
}
