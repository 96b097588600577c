//! End-to-end `run` pipeline: sources → candidates → merge → catalog.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use ipcatalog_enrich::GeoClient;
use ipcatalog_shared::{
    Candidate, EnrichmentConfig, FetchConfig, IpCatalogError, Result, SourceConfig,
};
use ipcatalog_sources::{SourceClient, extract_from_source};
use ipcatalog_store::{AddressOrder, finalize, load_cache, write_catalog};

use crate::aggregate;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target region codes (already defaulted upstream; never empty).
    pub regions: Vec<String>,
    /// Sources to fetch, in precedence order.
    pub sources: Vec<SourceConfig>,
    /// Catalog path — both this run's output and the cache input.
    pub catalog_path: PathBuf,
    /// Source fetching settings.
    pub fetch: FetchConfig,
    /// Geolocation enrichment settings.
    pub enrichment: EnrichmentConfig,
    /// List port-qualified addresses first within each region group.
    pub port_first: bool,
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Sources fetched successfully.
    pub sources_fetched: usize,
    /// Sources skipped after a fetch/parse failure.
    pub sources_failed: usize,
    /// Raw candidates across all sources (duplicates included).
    pub candidates: usize,
    /// Unique addresses in the final catalog.
    pub unique_addresses: usize,
    /// Addresses reused verbatim from the cache.
    pub cache_hits: usize,
    /// External lookups performed.
    pub lookups: usize,
    /// Lookups that ended in the failure sentinel.
    pub lookup_failures: usize,
    /// Per-region tally from region-filtered sources.
    pub region_tallies: BTreeMap<String, usize>,
    /// Region groups written.
    pub regions_written: usize,
    /// Catalog path written.
    pub catalog_path: PathBuf,
    /// Wall-clock duration of the run.
    pub elapsed: std::time::Duration,
    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each source fetch.
    fn source(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline.
///
/// 1. Load the cache snapshot from the previous catalog
/// 2. Fetch and extract each source (failures isolated per source)
/// 3. Merge candidates with cache and rate-limited enrichment
/// 4. Group by region, number, and atomically write the catalog
///
/// Each stage hands an immutable snapshot to the next; nothing is shared
/// mutably across stages.
#[instrument(skip_all, fields(sources = config.sources.len(), regions = ?config.regions))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();

    // The region default is substituted upstream; an empty list here is a
    // caller bug, not a recoverable condition.
    if config.regions.is_empty() {
        return Err(IpCatalogError::validation("no target regions configured"));
    }

    // --- Phase 1: cache snapshot ---
    progress.phase("Loading cache");
    let cache = load_cache(&config.catalog_path)?;

    // --- Phase 2: fetch and extract ---
    progress.phase("Fetching sources");
    let client = SourceClient::new(&config.fetch)?;

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut region_tallies: BTreeMap<String, usize> = BTreeMap::new();
    let mut sources_fetched = 0;
    let mut sources_failed = 0;

    let total = config.sources.len();
    for (i, source) in config.sources.iter().enumerate() {
        progress.source(&source.url, i + 1, total);

        match extract_from_source(&client, source).await {
            Ok(extraction) => {
                sources_fetched += 1;
                candidates.extend(extraction.candidates);
                for (region, count) in extraction.region_tallies {
                    *region_tallies.entry(region).or_insert(0) += count;
                }
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "source skipped");
                sources_failed += 1;
            }
        }
    }

    info!(
        candidates = candidates.len(),
        sources_fetched, sources_failed, "extraction complete"
    );

    // --- Phase 3: merge ---
    progress.phase("Resolving addresses");
    let geo = GeoClient::new(&config.enrichment)?;
    let outcome = aggregate::merge(&candidates, &cache, |address| geo.resolve(address)).await;

    // --- Phase 4: group and write ---
    progress.phase("Writing catalog");
    let order = if config.port_first {
        AddressOrder::PortFirst
    } else {
        AddressOrder::Lexicographic
    };
    let groups = finalize(&outcome.records, order);
    write_catalog(&config.catalog_path, &groups)?;

    let summary = RunSummary {
        sources_fetched,
        sources_failed,
        candidates: candidates.len(),
        unique_addresses: outcome.records.len(),
        cache_hits: outcome.cache_hits,
        lookups: outcome.lookups,
        lookup_failures: outcome.lookup_failures,
        region_tallies,
        regions_written: groups.len(),
        catalog_path: config.catalog_path.clone(),
        elapsed: start.elapsed(),
        completed_at: Utc::now(),
    };

    progress.done(&summary);

    info!(
        unique_addresses = summary.unique_addresses,
        cache_hits = summary.cache_hits,
        lookups = summary.lookups,
        lookup_failures = summary.lookup_failures,
        regions = summary.regions_written,
        elapsed_ms = summary.elapsed.as_millis(),
        "run complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipcatalog_shared::SourceKind;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ipcatalog-pipeline-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn enrichment(server: &MockServer) -> EnrichmentConfig {
        EnrichmentConfig {
            endpoint: format!("{}/json", server.uri()),
            lang: "en".into(),
            min_interval_ms: 0,
            timeout_secs: 2,
            retry_attempts: 1,
        }
    }

    async fn mock_geo_success(server: &MockServer, region: &str) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/json/.*$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "country": region,
                "regionName": "",
                "isp": "GeoNet"
            })))
            .mount(server)
            .await;
    }

    fn run_config(
        sources: Vec<SourceConfig>,
        catalog_path: PathBuf,
        enrichment: EnrichmentConfig,
    ) -> RunConfig {
        RunConfig {
            regions: vec!["sg".into()],
            sources,
            catalog_path,
            fetch: FetchConfig { timeout_secs: 5 },
            enrichment,
            port_first: false,
        }
    }

    #[tokio::test]
    async fn empty_region_list_is_rejected() {
        let dir = test_dir("noregions");
        let mut config = run_config(
            vec![],
            dir.join("ip.txt"),
            EnrichmentConfig::default(),
        );
        config.regions.clear();

        let err = run(&config, &SilentProgress).await.unwrap_err();
        assert!(err.to_string().contains("no target regions"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn produces_a_complete_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.2.3.4\n5.6.7.8/24\n"))
            .mount(&server)
            .await;
        mock_geo_success(&server, "Singapore").await;

        let dir = test_dir("complete");
        let catalog = dir.join("ip.txt");
        let config = run_config(
            vec![SourceConfig::new(
                format!("{}/list", server.uri()),
                SourceKind::Auto,
            )],
            catalog.clone(),
            enrichment(&server),
        );

        let summary = run(&config, &SilentProgress).await.unwrap();
        assert_eq!(summary.unique_addresses, 2);
        assert_eq!(summary.lookups, 2);

        let written = std::fs::read_to_string(&catalog).unwrap();
        // CIDR base host made it in; sequence numbers are fresh.
        assert_eq!(written, "1.2.3.4#Singapore-1#GeoNet\n5.6.7.8#Singapore-2#GeoNet\n\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn second_run_is_identical_with_enrichment_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.2.3.4\n5.6.7.8\n"))
            .mount(&server)
            .await;
        mock_geo_success(&server, "Japan").await;

        let dir = test_dir("idempotent");
        let catalog = dir.join("ip.txt");
        let sources = vec![SourceConfig::new(
            format!("{}/list", server.uri()),
            SourceKind::Auto,
        )];

        let config = run_config(sources.clone(), catalog.clone(), enrichment(&server));
        let first = run(&config, &SilentProgress).await.unwrap();
        assert_eq!(first.lookups, 2);
        let first_catalog = std::fs::read_to_string(&catalog).unwrap();

        // Second run: provider unreachable. The cache absorbs everything.
        let dead_enrichment = EnrichmentConfig {
            endpoint: "http://127.0.0.1:9/json".into(),
            lang: "en".into(),
            min_interval_ms: 0,
            timeout_secs: 1,
            retry_attempts: 1,
        };
        let config = run_config(sources, catalog.clone(), dead_enrichment);
        let second = run(&config, &SilentProgress).await.unwrap();

        assert_eq!(second.cache_hits, 2);
        assert_eq!(second.lookups, 0);
        assert_eq!(std::fs::read_to_string(&catalog).unwrap(), first_catalog);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn stale_sequence_numbers_are_recomputed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.2.3.4\n"))
            .mount(&server)
            .await;

        let dir = test_dir("renumber");
        let catalog = dir.join("ip.txt");
        std::fs::write(&catalog, "1.2.3.4#JP-7#ACME\n").unwrap();

        // Enrichment must not be consulted: the cache covers the address.
        let dead_enrichment = EnrichmentConfig {
            endpoint: "http://127.0.0.1:9/json".into(),
            lang: "en".into(),
            min_interval_ms: 0,
            timeout_secs: 1,
            retry_attempts: 1,
        };
        let config = run_config(
            vec![SourceConfig::new(
                format!("{}/list", server.uri()),
                SourceKind::Auto,
            )],
            catalog.clone(),
            dead_enrichment,
        );

        let summary = run(&config, &SilentProgress).await.unwrap();
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.lookups, 0);

        let written = std::fs::read_to_string(&catalog).unwrap();
        assert_eq!(written, "1.2.3.4#JP-1#ACME\n\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn surviving_source_completes_despite_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/up"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.2.3.4\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mock_geo_success(&server, "Singapore").await;

        let dir = test_dir("partial");
        let catalog = dir.join("ip.txt");
        let config = run_config(
            vec![
                SourceConfig::new(format!("{}/down", server.uri()), SourceKind::Auto),
                SourceConfig::new("http://127.0.0.1:9/unreachable", SourceKind::Auto),
                SourceConfig::new(format!("{}/up", server.uri()), SourceKind::Auto),
            ],
            catalog.clone(),
            enrichment(&server),
        );

        let summary = run(&config, &SilentProgress).await.unwrap();
        assert_eq!(summary.sources_failed, 2);
        assert_eq!(summary.sources_fetched, 1);
        assert_eq!(summary.unique_addresses, 1);

        let written = std::fs::read_to_string(&catalog).unwrap();
        assert!(written.contains("1.2.3.4#Singapore-1#GeoNet"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn declared_hints_bypass_enrichment_entirely() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ranges"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("host,country\n1.2.3.4,Singapore\n")
                    .insert_header("content-type", "text/csv"),
            )
            .mount(&server)
            .await;

        let dir = test_dir("declared");
        let catalog = dir.join("ip.txt");

        // No geo mock mounted: a lookup attempt would produce the sentinel.
        let dead_enrichment = EnrichmentConfig {
            endpoint: "http://127.0.0.1:9/json".into(),
            lang: "en".into(),
            min_interval_ms: 0,
            timeout_secs: 1,
            retry_attempts: 1,
        };
        let config = run_config(
            vec![SourceConfig::new(
                format!("{}/ranges", server.uri()),
                SourceKind::Csv,
            )],
            catalog.clone(),
            dead_enrichment,
        );

        let summary = run(&config, &SilentProgress).await.unwrap();
        assert_eq!(summary.lookups, 0);
        assert_eq!(summary.lookup_failures, 0);

        let written = std::fs::read_to_string(&catalog).unwrap();
        assert_eq!(written, "1.2.3.4#Singapore-1#unknown-owner\n\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
