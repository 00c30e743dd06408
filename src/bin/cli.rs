//! Aozora collector CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use collector::{
    error::Result,
    models::Config,
    pipeline::Collector,
    services::LinderaSegmenter,
    storage::{SqliteStore, WorkStore},
    utils::{HttpFetcher, report},
};

/// Aozora Bunko work collector
#[derive(Parser, Debug)]
#[command(
    name = "collector",
    version,
    about = "Collect Aozora Bunko works into a full-text index"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "collector.toml")]
    config: PathBuf,

    /// Override the index database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Override the listing page URL
    #[arg(long)]
    listing: Option<String>,

    /// Override the number of entries processed concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the listing page and index every work
    Collect,

    /// Create the index database and schema without crawling
    Init,

    /// Run a boolean full-text query against the index
    Search {
        /// FTS5 query, e.g. "虫 AND ココア"
        query: String,
    },

    /// Validate configuration
    Validate,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    fn resolve_config(&self) -> Config {
        let mut config = Config::load_or_default(&self.config);
        if let Some(path) = &self.database {
            config.store.path = path.clone();
        }
        if let Some(url) = &self.listing {
            config.catalog.listing_url = url.clone();
        }
        if let Some(n) = self.concurrency {
            config.crawler.max_concurrent = n;
        }
        config
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.store.path, config.store.max_connections).await
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.resolve_config();

    match cli.command {
        Command::Collect => {
            config.validate()?;
            let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
            let segmenter = Arc::new(LinderaSegmenter::new()?);
            let store = open_store(&config).await?;
            log::info!("Index database: {}", config.store.path.display());

            let collector =
                Collector::with_segmenter(&config, fetcher, Arc::new(store.clone()), segmenter);
            let result = collector.run(&config.catalog.listing_url).await;
            store.close().await;

            let summary = result?;
            if summary.failed > 0 {
                log::warn!("{} works failed, see warnings above", summary.failed);
            }
        }

        Command::Init => {
            let store = open_store(&config).await?;
            let counts = store.counts().await;
            store.close().await;
            let counts = counts?;

            report::summary(
                &format!("Index ready at {}", config.store.path.display()),
                &[
                    ("Authors", counts.authors.to_string()),
                    ("Contents", counts.contents.to_string()),
                    ("Index rows", counts.index_rows.to_string()),
                ],
            );
        }

        Command::Search { query } => {
            let store = open_store(&config).await?;
            let hits = store.search(&query).await;
            store.close().await;

            for hit in hits? {
                println!("{}\t{}", hit.author_name, hit.title);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
