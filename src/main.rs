//! # Malay News Scraper
//!
//! Harvests Malay-language news articles into tabular datasets for a
//! named-entity-recognition training pipeline.
//!
//! ## Features
//!
//! - Scrapes RSS/Atom feeds from Utusan Malaysia, Berita Harian, Harian Metro,
//!   Kosmo and Astro Awani
//! - Guesses random article IDs on sites without a usable archive
//! - Decodes mixed encodings, strips markup and boilerplate, and truncates
//!   summaries to the last complete sentence
//! - Writes each run as CSV and Parquet
//! - Merges run files into one dataset and joins labeled training fragments
//!
//! ## Usage
//!
//! ```sh
//! malay_news_scraper feeds
//! malay_news_scraper ids --sample-size 100
//! malay_news_scraper merge --root ./scraper --output-dir ./model_gliner/data
//! malay_news_scraper join-training -o training_data.json ordinal.json norp.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Candidates**: feed URLs, or sampled article-ID URLs
//! 2. **Fetching**: one sequential request per candidate, with politeness delays
//! 3. **Processing**: decode, extract, normalize, assemble records
//! 4. **Output**: CSV and Parquet files named after the run date

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

mod cli;
mod config;
mod error;
mod logging;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use config::HarvestConfig;
use logging::LogConfig;
use models::RunStamp;
use scrapers::fetch::HttpFetcher;
use scrapers::harvest::{Harvester, log_summary};
use utils::ensure_writable_dir;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

async fn run_feeds(config: &HarvestConfig, output_dir: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let dir = output_dir.unwrap_or_else(|| config.feed_output_dir.clone());
    ensure_writable_dir(&dir).await?;

    let stamp = RunStamp::now();
    let fetcher = HttpFetcher::new(Duration::from_secs(config.feed_timeout_secs))?;
    let mut harvester = Harvester::new(fetcher, seeded_rng(None), config.politeness.clone(), stamp.clone());

    info!(feeds = config.feeds.len(), "Starting feed scrape");
    let result = harvester.harvest_feeds(&config.feeds).await;
    outputs::write_run(&result, &dir, &stamp, false);
    log_summary("feeds", &result);
    Ok(())
}

async fn run_ids(
    config: &HarvestConfig,
    output_dir: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let dir = output_dir.unwrap_or_else(|| config.id_output_dir.clone());
    ensure_writable_dir(&dir).await?;

    let stamp = RunStamp::now();
    let fetcher = HttpFetcher::new(Duration::from_secs(config.request_timeout_secs))?;
    let mut harvester = Harvester::new(fetcher, seeded_rng(seed), config.politeness.clone(), stamp.clone());

    info!(sources = config.id_sources.len(), ?seed, "Starting ID scrape");
    let result = harvester.harvest_ids(&config.id_sources).await?;
    outputs::write_run(&result, &dir, &stamp, true);
    log_summary("ids", &result);
    Ok(())
}

fn run_merge(root: &Path, output_dir: &Path) -> Result<(), Box<dyn Error>> {
    let summary = outputs::merge::merge_tree(root, output_dir)?;
    info!(
        csv_files = summary.csv_files,
        csv_rows = summary.csv_rows,
        parquet_files = summary.parquet_files,
        parquet_rows = summary.parquet_rows,
        skipped_files = summary.skipped_files,
        "Merging complete"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)?,
        None => HarvestConfig::default(),
    };
    if let Command::Ids {
        sample_size: Some(n),
        ..
    } = &args.command
    {
        for source in &mut config.id_sources {
            source.sample_size = *n;
        }
    }

    // --- Tracing init ---
    let log_file = args.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    logging::init(&LogConfig {
        log_file: Some(log_file),
        ..LogConfig::default()
    })?;

    info!("malay_news_scraper starting up");
    debug!(?args, "Parsed CLI arguments");
    info!(
        config = ?args.config,
        feeds = config.feeds.len(),
        id_sources = config.id_sources.len(),
        "Loaded configuration"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    match args.command {
        Command::Feeds { output_dir } => run_feeds(&config, output_dir).await?,
        Command::Ids {
            output_dir, seed, ..
        } => run_ids(&config, output_dir, seed).await?,
        Command::Merge { root, output_dir } => run_merge(&root, &output_dir)?,
        Command::JoinTraining {
            output,
            seed,
            inputs,
        } => {
            outputs::training::join_training(&inputs, &output, &mut seeded_rng(seed))?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
