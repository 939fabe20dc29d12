//! YC Company Crawler CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use yc_crawler::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    storage::{LocalStorage, RecordStorage},
    utils::http::HttpFetcher,
};
#[cfg(feature = "browser")]
use yc_crawler::render::ChromeRenderer;

/// yc-crawler - YC Company Directory Crawler
#[derive(Parser, Debug)]
#[command(
    name = "yc-crawler",
    version,
    about = "Harvest YC company links by batch and extract company details"
)]
struct Cli {
    /// Path to storage directory containing config and tables
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect company links for every configured batch
    #[cfg(feature = "browser")]
    Harvest {
        /// Only harvest these batches (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Path to link table (default: {storage_dir}/company_links.csv)
        #[arg(long)]
        links: Option<PathBuf>,
    },

    /// Extract company details for every harvested link
    Extract {
        /// Path to link table (default: {storage_dir}/company_links.csv)
        #[arg(long)]
        links: Option<PathBuf>,

        /// Path to detail table (default: {storage_dir}/company_details.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run full pipeline: Harvest → Extract
    #[cfg(feature = "browser")]
    Pipeline,

    /// Validate configuration file
    Validate,

    /// Show storage and table info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_storage(
    storage_dir: &Path,
    config: &Config,
    links: Option<PathBuf>,
    output: Option<PathBuf>,
) -> LocalStorage {
    let mut storage = LocalStorage::new(storage_dir, &config.paths);
    if let Some(path) = links {
        storage = storage.with_links_path(path);
    }
    if let Some(path) = output {
        storage = storage.with_details_path(path);
    }
    storage
}

#[cfg(feature = "browser")]
async fn harvest(config: &Config, storage: &LocalStorage, labels: Vec<String>) -> Result<()> {
    let labels = if labels.is_empty() {
        config.harvest.labels.clone()
    } else {
        labels
    };

    let renderer = ChromeRenderer::launch(&config.renderer).await?;
    let stats = pipeline::run_harvester(config, storage, renderer, &labels).await?;

    log::info!(
        "Saved {} links to {}",
        stats.link_count,
        storage.links_path().display()
    );
    Ok(())
}

async fn extract(config: &Config, storage: &LocalStorage) -> Result<()> {
    if !storage.links_path().exists() {
        log::error!(
            "Input file not found: {}. Run 'harvest' first.",
            storage.links_path().display()
        );
        return Err(AppError::MissingInput(storage.links_path().to_path_buf()));
    }

    let fetcher = HttpFetcher::new(&config.crawler)?;
    let stats = pipeline::run_extractor(config, storage, fetcher).await?;

    if stats.rows_written > 0 {
        log::info!(
            "Saved {} company details to {}",
            stats.rows_written,
            storage.details_path().display()
        );
    }
    Ok(())
}

fn table_status<T>(path: &Path, rows: Result<Vec<T>>) -> String {
    match rows {
        Ok(rows) => format!("{} ({} rows)", path.display(), rows.len()),
        Err(AppError::MissingInput(_)) => format!("{} (not found)", path.display()),
        Err(e) => format!("{} (unreadable: {})", path.display(), e),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("YC Crawler starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    match cli.command {
        #[cfg(feature = "browser")]
        Command::Harvest { labels, links } => {
            let storage = build_storage(&cli.storage_dir, &config, links, None);
            harvest(&config, &storage, labels).await?;
            log::info!("Harvest complete!");
        }

        Command::Extract { links, output } => {
            let storage = build_storage(&cli.storage_dir, &config, links, output);
            extract(&config, &storage).await?;
            log::info!("Extract complete!");
        }

        #[cfg(feature = "browser")]
        Command::Pipeline => {
            let storage = build_storage(&cli.storage_dir, &config, None, None);

            log::info!("Step 1/2: Harvesting company links...");
            harvest(&config, &storage, Vec::new()).await?;

            log::info!("Step 2/2: Extracting company details...");
            extract(&config, &storage).await?;

            log::info!("Pipeline complete!");
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!(
                "✓ Config OK ({} batches, {} concurrent requests)",
                config.harvest.labels.len(),
                config.crawler.max_concurrent
            );
            log::info!("All validations passed!");
        }

        Command::Info => {
            let storage = build_storage(&cli.storage_dir, &config, None, None);
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Config: {}",
                if config_path.exists() {
                    "exists"
                } else {
                    "not found (using defaults)"
                }
            );
            log::info!(
                "Link table: {}",
                table_status(storage.links_path(), storage.load_links().await)
            );
            log::info!(
                "Detail table: {}",
                table_status(storage.details_path(), storage.load_details().await)
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
