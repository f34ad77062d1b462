//! Command-line interface definitions for the Malay news scraper.
//!
//! Global options can also come from environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Scrape the RSS feeds into ./scraper/news_feed
/// malay_news_scraper feeds
///
/// # Guess 50 article IDs with a fixed seed
/// malay_news_scraper ids --sample-size 50 --seed 7
///
/// # Merge every dataset file under ./scraper
/// malay_news_scraper merge --root ./scraper --output-dir ./model_gliner/data
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true, env = "MALAY_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file; defaults to the configured `log_file`
    #[arg(long, global = true, env = "MALAY_NEWS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Scrape the configured RSS/Atom feeds
    Feeds {
        /// Output directory; defaults to the configured `feed_output_dir`
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Guess random article IDs on the configured sites
    Ids {
        /// Output directory; defaults to the configured `id_output_dir`
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// IDs to sample per source, overriding the configuration
        #[arg(short = 'n', long)]
        sample_size: Option<usize>,

        /// Seed for ID sampling and delay jitter
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Merge every CSV and Parquet file under a directory tree
    Merge {
        #[arg(long, default_value = "./scraper")]
        root: PathBuf,

        #[arg(short, long, default_value = "./model_gliner/data")]
        output_dir: PathBuf,
    },

    /// Join labeled JSON training fragments and shuffle them
    JoinTraining {
        #[arg(short, long, default_value = "training_data.json")]
        output: PathBuf,

        /// Seed for the shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Fragment files, each a JSON array of examples
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_feeds_defaults() {
        let cli = Cli::parse_from(["malay_news_scraper", "feeds"]);
        assert_eq!(cli.command, Command::Feeds { output_dir: None });
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_cli_ids_options() {
        let cli = Cli::parse_from([
            "malay_news_scraper",
            "ids",
            "-o",
            "/tmp/news_id",
            "-n",
            "25",
            "--seed",
            "7",
            "--config",
            "scraper.yaml",
        ]);

        assert_eq!(
            cli.command,
            Command::Ids {
                output_dir: Some(PathBuf::from("/tmp/news_id")),
                sample_size: Some(25),
                seed: Some(7),
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("scraper.yaml")));
    }

    #[test]
    fn test_cli_merge_defaults() {
        let cli = Cli::parse_from(["malay_news_scraper", "merge"]);
        assert_eq!(
            cli.command,
            Command::Merge {
                root: PathBuf::from("./scraper"),
                output_dir: PathBuf::from("./model_gliner/data"),
            }
        );
    }

    #[test]
    fn test_cli_join_training_requires_inputs() {
        assert!(Cli::try_parse_from(["malay_news_scraper", "join-training"]).is_err());

        let cli = Cli::parse_from([
            "malay_news_scraper",
            "join-training",
            "a.json",
            "b.json",
        ]);
        match cli.command {
            Command::JoinTraining { output, seed, inputs } => {
                assert_eq!(output, PathBuf::from("training_data.json"));
                assert_eq!(seed, None);
                assert_eq!(inputs, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
