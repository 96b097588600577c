//! Geolocation enrichment client.
//!
//! Resolves addresses that are in neither the cache nor carry a
//! source-declared hint, by querying an external geolocation provider.
//! Lookups never surface errors: any transport failure, timeout, or
//! non-success status maps to a sentinel [`Record`], so the pipeline always
//! makes forward progress. Calls are paced by an [`IntervalLimiter`] to
//! respect the provider's implicit rate limit.

mod limiter;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use ipcatalog_shared::{Address, EnrichmentConfig, IpCatalogError, Record, Result, UNKNOWN_OWNER};

pub use limiter::IntervalLimiter;

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("ipcatalog/", env!("CARGO_PKG_VERSION"));

/// Provider response, matching the ip-api.com JSON shape.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    /// Explicit success flag; anything but "success" is a failed lookup.
    #[serde(default)]
    status: String,

    #[serde(default)]
    country: String,

    #[serde(default, rename = "regionName")]
    region_name: String,

    #[serde(default)]
    isp: String,
}

/// Client for the geolocation provider.
pub struct GeoClient {
    client: Client,
    endpoint: String,
    lang: String,
    retry_attempts: u32,
    limiter: IntervalLimiter,
}

impl GeoClient {
    /// Create a new client from the enrichment settings.
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IpCatalogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            retry_attempts: config.retry_attempts.max(1),
            limiter: IntervalLimiter::new(Duration::from_millis(config.min_interval_ms)),
        })
    }

    /// Resolve one address via the provider.
    ///
    /// The port is stripped for the query; the host alone is geolocated.
    /// Transport errors are retried up to the configured attempts (each
    /// paced by the limiter); everything else resolves in one round trip.
    pub async fn resolve(&self, address: Address) -> Record {
        let url = format!("{}/{}?lang={}", self.endpoint, address.host, self.lang);

        for attempt in 1..=self.retry_attempts {
            self.limiter.wait().await;

            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(host = %address.host, attempt, error = %e, "lookup transport error");
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!(host = %address.host, %status, "lookup returned non-success status");
                return Record::lookup_failed();
            }

            return match response.json::<GeoResponse>().await {
                Ok(geo) if geo.status == "success" => {
                    let region = format!("{} {}", geo.country, geo.region_name)
                        .trim()
                        .to_string();
                    let owner = if geo.isp.trim().is_empty() {
                        UNKNOWN_OWNER.to_string()
                    } else {
                        geo.isp
                    };
                    debug!(host = %address.host, %region, "lookup resolved");
                    Record::lookup(region, owner)
                }
                Ok(geo) => {
                    debug!(host = %address.host, status = %geo.status, "provider declined lookup");
                    Record::lookup_failed()
                }
                Err(e) => {
                    warn!(host = %address.host, error = %e, "unparseable lookup response");
                    Record::lookup_failed()
                }
            };
        }

        Record::lookup_failed()
    }
}
