//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use ipcatalog_core::{ProgressReporter, RunConfig, RunSummary};
use ipcatalog_shared::{AppConfig, default_sources, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ipcatalog — aggregate public address lists into a regional catalog.
#[derive(Parser)]
#[command(
    name = "ipcatalog",
    version,
    about = "Aggregate, deduplicate, and geolocate public address lists into a regional catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch all sources and rebuild the catalog.
    Run {
        /// Target region codes, comma-separated (e.g. SG or SG,JP,KR).
        #[arg(short, long, env = "TARGET_REGIONS")]
        regions: Option<String>,

        /// Catalog file path (also the cache read at startup).
        #[arg(short, long)]
        output: Option<String>,

        /// Config file path (defaults to ~/.ipcatalog/ipcatalog.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// List port-qualified addresses first within each region.
        #[arg(long)]
        port_first: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ipcatalog=info",
        1 => "ipcatalog=debug",
        _ => "ipcatalog=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            regions,
            output,
            config,
            port_first,
        } => cmd_run(regions.as_deref(), output.as_deref(), config.as_deref(), port_first).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_run(
    regions: Option<&str>,
    output: Option<&str>,
    config_path: Option<&std::path::Path>,
    port_first: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let regions = resolve_regions(regions, &config);

    let sources = if config.sources.is_empty() {
        default_sources(&regions)
    } else {
        config.sources.clone()
    };

    let catalog_path = PathBuf::from(
        output.unwrap_or(config.defaults.catalog_file.as_str()),
    );

    let run_config = RunConfig {
        regions: regions.clone(),
        sources,
        catalog_path,
        fetch: config.fetch.clone(),
        enrichment: config.enrichment.clone(),
        port_first: port_first || config.output.port_first,
    };

    info!(
        regions = %regions.join(","),
        sources = run_config.sources.len(),
        catalog = %run_config.catalog_path.display(),
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = ipcatalog_core::run(&run_config, &reporter).await?;

    print_summary(&summary);
    Ok(())
}

/// Resolve the target region list: CLI flag, then config defaults, then the
/// hard default. The pipeline never sees an empty list.
fn resolve_regions(flag: Option<&str>, config: &AppConfig) -> Vec<String> {
    let from_flag: Vec<String> = flag
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if !from_flag.is_empty() {
        return from_flag;
    }
    if !config.defaults.regions.is_empty() {
        return config
            .defaults
            .regions
            .iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    vec!["sg".into()]
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Catalog written!");
    println!("  Path:       {}", summary.catalog_path.display());
    println!(
        "  Sources:    {} fetched, {} failed",
        summary.sources_fetched, summary.sources_failed
    );
    println!(
        "  Addresses:  {} unique ({} raw candidates)",
        summary.unique_addresses, summary.candidates
    );
    println!(
        "  Resolution: {} cached, {} looked up, {} failed",
        summary.cache_hits, summary.lookups, summary.lookup_failures
    );
    if !summary.region_tallies.is_empty() {
        let tallies: Vec<String> = summary
            .region_tallies
            .iter()
            .map(|(region, count)| format!("{region}: {count}"))
            .collect();
        println!("  Filtered:   {}", tallies.join(", "));
    }
    println!("  Regions:    {}", summary.regions_written);
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_flag_splits_and_lowercases() {
        let config = AppConfig::default();
        assert_eq!(
            resolve_regions(Some("SG, JP,kr"), &config),
            vec!["sg", "jp", "kr"]
        );
    }

    #[test]
    fn empty_flag_falls_back_to_config_then_hard_default() {
        let mut config = AppConfig::default();
        config.defaults.regions = vec!["JP".into()];
        assert_eq!(resolve_regions(None, &config), vec!["jp"]);
        assert_eq!(resolve_regions(Some(" , "), &config), vec!["jp"]);

        config.defaults.regions.clear();
        assert_eq!(resolve_regions(None, &config), vec!["sg"]);
    }
}
