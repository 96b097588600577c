//! Timeout-bounded source fetching with per-source failure isolation.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument};
use url::Url;

use ipcatalog_shared::{FetchConfig, IpCatalogError, Result, SourceConfig};

use crate::adapters::{Extraction, adapter_for};

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("ipcatalog/", env!("CARGO_PKG_VERSION"));

/// A fetched source payload, ready for extraction.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    /// Response body.
    pub body: String,
    /// Lowercased Content-Type header ("" when absent).
    pub content_type: String,
}

/// HTTP client for the configured sources.
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    /// Create a new client with the configured timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IpCatalogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch one source's payload.
    ///
    /// Any failure — bad URL, transport error, timeout, non-success status —
    /// is an error for this source only; the caller skips it and continues.
    pub async fn fetch(&self, source: &SourceConfig) -> Result<FetchedSource> {
        let url = Url::parse(&source.url)
            .map_err(|e| IpCatalogError::parse(format!("bad source URL '{}': {e}", source.url)))?;

        debug!(%url, "fetching source");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| IpCatalogError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IpCatalogError::Network(format!("{url}: HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let body = response
            .text()
            .await
            .map_err(|e| IpCatalogError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(FetchedSource { body, content_type })
    }
}

/// Fetch one source and run the configured extraction strategy over it.
#[instrument(skip_all, fields(url = %source.url))]
pub async fn extract_from_source(
    client: &SourceClient,
    source: &SourceConfig,
) -> Result<Extraction> {
    let fetched = client.fetch(source).await?;
    let adapter = adapter_for(source.kind, &fetched.content_type);

    let extraction = adapter.extract(&fetched.body, source);

    info!(
        adapter = adapter.name(),
        candidates = extraction.candidates.len(),
        "source extracted"
    );

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipcatalog_shared::SourceKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> SourceClient {
        SourceClient::new(&FetchConfig { timeout_secs: 5 }).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_extracts_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("104.16.1.1\n172.64.2.3\n"),
            )
            .mount(&server)
            .await;

        let source = SourceConfig::new(format!("{}/list", server.uri()), SourceKind::Auto);
        let extraction = extract_from_source(&client(), &source).await.unwrap();
        assert_eq!(extraction.candidates.len(), 2);
    }

    #[tokio::test]
    async fn auto_kind_uses_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ranges"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("host,country\n104.16.1.1,Singapore\n", "text/csv"),
            )
            .mount(&server)
            .await;

        let source = SourceConfig::new(format!("{}/ranges", server.uri()), SourceKind::Auto);
        let extraction = extract_from_source(&client(), &source).await.unwrap();
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(
            extraction.candidates[0].region_hint.as_deref(),
            Some("Singapore")
        );
    }

    #[tokio::test]
    async fn http_error_is_a_source_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = SourceConfig::new(format!("{}/gone", server.uri()), SourceKind::Auto);
        let err = extract_from_source(&client(), &source).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn bad_url_is_a_source_error() {
        let source = SourceConfig::new("not a url", SourceKind::Auto);
        assert!(extract_from_source(&client(), &source).await.is_err());
    }
}
