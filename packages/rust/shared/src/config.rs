//! Application configuration for ipcatalog.
//!
//! User config lives at `~/.ipcatalog/ipcatalog.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IpCatalogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ipcatalog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ipcatalog";

/// Localized display names for the region codes the filter understands.
/// Used to match either the code or the display name in source row text.
const REGION_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("sg", "singapore"),
    ("jp", "japan"),
    ("kr", "korea"),
    ("hk", "hong kong"),
    ("tw", "taiwan"),
    ("us", "united states"),
    ("de", "germany"),
];

/// Look up the localized display name for a two-letter region code.
pub fn region_display_name(code: &str) -> Option<&'static str> {
    let code = code.to_ascii_lowercase();
    REGION_DISPLAY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

// ---------------------------------------------------------------------------
// Config structs (matching ipcatalog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Source fetching settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Geolocation enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Catalog output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Configured sources. Empty means "use the built-in default list".
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Target region codes used when the CLI supplies none.
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Catalog file path. Doubles as the next run's cache input.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            catalog_file: default_catalog_file(),
        }
    }
}

fn default_regions() -> Vec<String> {
    vec!["sg".into()]
}
fn default_catalog_file() -> String {
    "ip.txt".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-source HTTP timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Base URL of the geolocation endpoint; the host is appended as a path
    /// segment.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Response language requested from the provider.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Minimum delay between consecutive provider calls, in milliseconds.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,

    /// Per-lookup HTTP timeout in seconds.
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,

    /// Transport-error attempts per lookup before the failure sentinel.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            lang: default_lang(),
            min_interval_ms: default_min_interval(),
            timeout_secs: default_lookup_timeout(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

fn default_endpoint() -> String {
    "http://ip-api.com/json".into()
}
fn default_lang() -> String {
    "en".into()
}
fn default_min_interval() -> u64 {
    500
}
fn default_lookup_timeout() -> u64 {
    6
}
fn default_retry_attempts() -> u32 {
    2
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// List port-qualified addresses before bare hosts within each region.
    #[serde(default)]
    pub port_first: bool,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Extraction strategy for a source, selected by configuration —
/// never by inspecting the URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Pick by response Content-Type: html → html-list, csv → csv,
    /// anything else → plain-text.
    #[default]
    Auto,
    /// HTML pages listing addresses in table rows.
    HtmlTable,
    /// HTML pages listing addresses in list/paragraph elements.
    HtmlList,
    /// Plain text or JSON bodies scanned line by line.
    PlainText,
    /// Delimited records with a header naming host/port/region columns.
    Csv,
}

/// `[[sources]]` entry — one configured source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source URL.
    pub url: String,

    /// Extraction strategy.
    #[serde(default)]
    pub kind: SourceKind,

    /// Retain `:port` suffixes on extracted addresses.
    #[serde(default)]
    pub keep_port: bool,

    /// Region filter keywords (two-letter codes). Empty means unfiltered.
    #[serde(default)]
    pub regions: Vec<String>,

    /// Per-region cap on contributed addresses. 0 means unbounded.
    #[serde(default)]
    pub per_region_cap: usize,
}

impl SourceConfig {
    /// Unfiltered source of the given kind.
    pub fn new(url: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            url: url.into(),
            kind,
            keep_port: false,
            regions: Vec::new(),
            per_region_cap: 0,
        }
    }
}

/// The built-in source list, used when no `[[sources]]` are configured.
/// The region filter on the Cloudflare ranges CSV is bound to the run's
/// target regions.
pub fn default_sources(target_regions: &[String]) -> Vec<SourceConfig> {
    let mut sources = vec![
        SourceConfig::new("https://api.uouin.com/cloudflare.html", SourceKind::HtmlTable),
        SourceConfig::new("https://ip.164746.xyz", SourceKind::HtmlTable),
        SourceConfig::new(
            "https://ipdb.api.030101.xyz/?type=bestcf&country=true",
            SourceKind::Auto,
        ),
        SourceConfig::new("https://cf.090227.xyz", SourceKind::Auto),
        SourceConfig::new(
            "https://addressesapi.090227.xyz/CloudFlareYes",
            SourceKind::Auto,
        ),
        SourceConfig::new(
            "https://addressesapi.090227.xyz/ip.164746.xyz",
            SourceKind::Auto,
        ),
    ];

    let mut csv = SourceConfig::new(
        "https://api.cloudflare.com/local-ip-ranges.csv",
        SourceKind::Csv,
    );
    csv.regions = target_regions.to_vec();
    sources.push(csv);

    sources
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ipcatalog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| IpCatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ipcatalog/ipcatalog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| IpCatalogError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| IpCatalogError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| IpCatalogError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| IpCatalogError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| IpCatalogError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("catalog_file"));
        assert!(toml_str.contains("ip-api.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.regions, vec!["sg".to_string()]);
        assert_eq!(parsed.enrichment.min_interval_ms, 500);
        assert_eq!(parsed.fetch.timeout_secs, 10);
    }

    #[test]
    fn config_with_sources() {
        let toml_str = r#"
[defaults]
regions = ["jp", "kr"]

[[sources]]
url = "https://example.com/list.csv"
kind = "csv"
regions = ["jp"]
per_region_cap = 50

[[sources]]
url = "https://example.com/ips.html"
kind = "html-table"
keep_port = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.regions, vec!["jp", "kr"]);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].kind, SourceKind::Csv);
        assert_eq!(config.sources[0].per_region_cap, 50);
        assert_eq!(config.sources[1].kind, SourceKind::HtmlTable);
        assert!(config.sources[1].keep_port);
    }

    #[test]
    fn source_kind_defaults_to_auto() {
        let toml_str = r#"
[[sources]]
url = "https://example.com/ips"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sources[0].kind, SourceKind::Auto);
        assert!(!config.sources[0].keep_port);
        assert!(config.sources[0].regions.is_empty());
    }

    #[test]
    fn default_source_list_binds_regions_to_csv() {
        let regions = vec!["sg".to_string(), "jp".to_string()];
        let sources = default_sources(&regions);
        assert_eq!(sources.len(), 7);

        let csv = sources.last().expect("csv source");
        assert_eq!(csv.kind, SourceKind::Csv);
        assert_eq!(csv.regions, regions);

        // Everything else is unfiltered.
        assert!(sources[..6].iter().all(|s| s.regions.is_empty()));
    }

    #[test]
    fn region_display_names_resolve() {
        assert_eq!(region_display_name("sg"), Some("singapore"));
        assert_eq!(region_display_name("HK"), Some("hong kong"));
        assert_eq!(region_display_name("xx"), None);
    }
}
